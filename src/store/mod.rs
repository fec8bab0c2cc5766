// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node storage and history persistence.
//!
//! [`NodeStore`] is the in-memory arena of every version. [`HistoryFile`] reads and writes the
//! JSON document a notebook's history is kept in next to the notebook.

pub mod history_file;
pub mod node_store;

pub use history_file::{HistoryFile, HistoryFileError, WriteDurability};
pub use node_store::{NodeStore, Stored};
