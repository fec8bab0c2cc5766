// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: versioned nodes and checkpoint records.
//!
//! A notebook is a `nb` node listing cell versions; code cells list statement nodes, which list
//! token nodes. Every version is immutable once its checkpoint closes.

pub mod checkpoint;
pub mod ids;
pub mod nodey;

pub use checkpoint::{CellRunData, ChangeType, Checkpoint, CheckpointType, OutputNames};
pub use ids::{CheckpointId, LineageId, NodeKind, NodeName};
pub use nodey::{
    Nodey, NodeyBody, NodeyCode, NodeyCodeCell, NodeyDraft, NodeyMarkdown, NodeyNotebook,
    NodeyOutput, Pos,
};
