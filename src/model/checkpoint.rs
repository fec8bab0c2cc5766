// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use smallvec::SmallVec;

use super::ids::{CheckpointId, NodeName};

/// What happened to one cell in one checkpoint.
///
/// The string forms are the persisted values and are kept verbose for log readability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Changed,
    Removed,
    Added,
    Same,
    Moved,
    None,
}

impl ChangeType {
    pub const ALL: [ChangeType; 6] =
        [Self::Changed, Self::Removed, Self::Added, Self::Same, Self::Moved, Self::None];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "edited",
            Self::Removed => "removed",
            Self::Added => "added",
            Self::Same => "no change",
            Self::Moved => "moved",
            Self::None => "n/a",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The notebook event a checkpoint records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointType {
    Run,
    Save,
    Load,
    Add,
    Delete,
    Moved,
}

impl CheckpointType {
    pub const ALL: [CheckpointType; 6] =
        [Self::Run, Self::Save, Self::Load, Self::Add, Self::Delete, Self::Moved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Save => "notebook saved",
            Self::Load => "notebook loaded",
            Self::Add => "cell added",
            Self::Delete => "cell deleted",
            Self::Moved => "cell moved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    /// ADD/DELETE/MOVED checkpoints hold exactly one entry.
    pub fn is_single_entry(self) -> bool {
        matches!(self, Self::Add | Self::Delete | Self::Moved)
    }
}

impl fmt::Display for CheckpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type OutputNames = SmallVec<[NodeName; 2]>;

/// One entry of a checkpoint's `target_cells`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRunData {
    pub node: NodeName,
    pub change_type: ChangeType,
    pub new_output: Option<OutputNames>,
    pub index: Option<usize>,
}

impl CellRunData {
    pub fn new(node: NodeName, change_type: ChangeType) -> Self {
        Self { node, change_type, new_output: None, index: None }
    }

    pub fn with_new_output(mut self, new_output: OutputNames) -> Self {
        self.new_output = Some(new_output);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn new_output(&self) -> &[NodeName] {
        self.new_output.as_deref().unwrap_or(&[])
    }
}

/// A closed checkpoint. Only closed checkpoints exist in the log, so `notebook` is always set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    id: CheckpointId,
    kind: CheckpointType,
    timestamp: i64,
    notebook: u32,
    target_cells: Vec<CellRunData>,
}

impl Checkpoint {
    pub(crate) fn new(
        id: CheckpointId,
        kind: CheckpointType,
        timestamp: i64,
        notebook: u32,
        target_cells: Vec<CellRunData>,
    ) -> Self {
        Self { id, kind, timestamp, notebook, target_cells }
    }

    pub fn id(&self) -> CheckpointId {
        self.id
    }

    pub fn kind(&self) -> CheckpointType {
        self.kind
    }

    /// Epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Version number of the notebook this checkpoint produced.
    pub fn notebook(&self) -> u32 {
        self.notebook
    }

    pub fn target_cells(&self) -> &[CellRunData] {
        &self.target_cells
    }

    pub fn target(&self, node: &NodeName) -> Option<&CellRunData> {
        self.target_cells.iter().find(|item| &item.node == node)
    }
}
