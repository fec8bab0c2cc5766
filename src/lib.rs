// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Nbtrail: fine-grained version history for computational notebooks.
//!
//! Every notebook event (load, save, run, add, delete, move) becomes a checkpoint. Cells are
//! decomposed into syntax nodes and each node keeps its own lineage of immutable versions, so
//! a history can answer "what did this statement look like three runs ago" as well as "what
//! happened to every cell in this checkpoint".

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod model;
pub mod query;
pub mod render;
pub mod signal;
pub mod store;

pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use history::{CellInput, CellStructureChange, History, SharedHistory};
pub use model::{
    CellRunData, ChangeType, Checkpoint, CheckpointId, CheckpointType, LineageId, NodeKind,
    NodeName, Nodey,
};
pub use store::{HistoryFile, HistoryFileError, WriteDurability};
