// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::{HistoryError, Result};
use crate::model::{
    CellRunData, ChangeType, Checkpoint, CheckpointId, CheckpointType, NodeName, OutputNames,
};
use crate::store::NodeStore;

/// A checkpoint that is still being populated.
///
/// Owned by the event handler that opened it. Readers only ever see [`Checkpoint`]s, which
/// exist once [`CheckpointLog::close`] has assigned the notebook version.
#[derive(Debug)]
#[must_use = "a pending checkpoint must be closed or discarded"]
pub struct PendingCheckpoint {
    id: CheckpointId,
    kind: CheckpointType,
    timestamp: i64,
    target_cells: Vec<CellRunData>,
}

impl PendingCheckpoint {
    pub fn id(&self) -> CheckpointId {
        self.id
    }

    pub fn kind(&self) -> CheckpointType {
        self.kind
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn target_cells(&self) -> &[CellRunData] {
        &self.target_cells
    }

    pub fn record(&mut self, entry: CellRunData) -> Result<()> {
        if self.kind.is_single_entry() && !self.target_cells.is_empty() {
            return Err(HistoryError::lineage(
                entry.node,
                format!("{} checkpoint {} already has an entry", self.kind, self.id),
            ));
        }
        if entry.change_type == ChangeType::Removed
            && self.target_cells.iter().any(|item| {
                item.change_type == ChangeType::Removed
                    && item.node == entry.node
                    && item.index == entry.index
            })
        {
            return Err(HistoryError::lineage(
                entry.node,
                format!("checkpoint {} already records this removal", self.id),
            ));
        }

        self.target_cells.push(entry);
        Ok(())
    }

    /// Record a cell touched by a RUN, SAVE or LOAD.
    ///
    /// `newOutput` lists the cell's outputs created by this checkpoint. A run is `SAME` only if
    /// the cell kept its version. The output list belongs to the version, so outputs that
    /// changed or disappeared always surface as `CHANGED`.
    pub fn record_cell(&mut self, store: &NodeStore, cell: NodeName, unchanged: bool) -> Result<()> {
        if !matches!(self.kind, CheckpointType::Run | CheckpointType::Save | CheckpointType::Load) {
            return Err(HistoryError::lineage(
                cell,
                format!("{} checkpoints do not record cell runs", self.kind),
            ));
        }

        let node = store.get(&cell)?;
        let mut new_output = OutputNames::new();
        if let Some(code_cell) = node.as_code_cell() {
            for output in code_cell.output() {
                if store.get(output)?.created() == self.id {
                    new_output.push(*output);
                }
            }
        }

        let change_type = if self.kind == CheckpointType::Run && unchanged && new_output.is_empty() {
            ChangeType::Same
        } else {
            ChangeType::Changed
        };
        self.record(CellRunData::new(cell, change_type).with_new_output(new_output))
    }
}

/// Append-only log of closed checkpoints.
///
/// Ids come from a monotonic counter; at most one checkpoint is open at a time and a discarded
/// checkpoint hands its id back, so ids always equal log positions.
#[derive(Debug, Default)]
pub struct CheckpointLog {
    next_id: u32,
    open: Option<CheckpointId>,
    checkpoints: Vec<Checkpoint>,
    by_notebook: BTreeMap<u32, Vec<CheckpointId>>,
}

impl CheckpointLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from decoded checkpoints. Ids must match positions.
    pub(crate) fn from_closed(checkpoints: Vec<Checkpoint>) -> Result<Self> {
        let mut log = Self::new();
        for checkpoint in checkpoints {
            if checkpoint.id().get() != log.next_id {
                return Err(HistoryError::serialization(
                    "checkpoints[]",
                    format!("checkpoint {} stored at position {}", checkpoint.id(), log.next_id),
                ));
            }
            log.next_id += 1;
            log.push(checkpoint);
        }
        Ok(log)
    }

    fn push(&mut self, checkpoint: Checkpoint) {
        self.by_notebook.entry(checkpoint.notebook()).or_default().push(checkpoint.id());
        self.checkpoints.push(checkpoint);
    }

    /// Id the next opened checkpoint will receive.
    pub fn next_id(&self) -> CheckpointId {
        CheckpointId::new(self.next_id)
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn open(&mut self, kind: CheckpointType, timestamp: i64) -> Result<PendingCheckpoint> {
        if let Some(open) = self.open {
            return Err(HistoryError::lineage(
                format!("checkpoint {open}"),
                format!("still open, cannot start {kind}"),
            ));
        }
        let id = CheckpointId::new(self.next_id);
        self.next_id += 1;
        self.open = Some(id);
        Ok(PendingCheckpoint { id, kind, timestamp, target_cells: Vec::new() })
    }

    pub fn cell_run(&mut self, timestamp: i64) -> Result<PendingCheckpoint> {
        self.open(CheckpointType::Run, timestamp)
    }

    pub fn notebook_saved(&mut self, timestamp: i64) -> Result<PendingCheckpoint> {
        self.open(CheckpointType::Save, timestamp)
    }

    pub fn notebook_loaded(&mut self, timestamp: i64) -> Result<PendingCheckpoint> {
        self.open(CheckpointType::Load, timestamp)
    }

    pub fn cell_added(&mut self, timestamp: i64) -> Result<PendingCheckpoint> {
        self.open(CheckpointType::Add, timestamp)
    }

    pub fn cell_deleted(&mut self, timestamp: i64) -> Result<PendingCheckpoint> {
        self.open(CheckpointType::Delete, timestamp)
    }

    pub fn cell_moved(&mut self, timestamp: i64) -> Result<PendingCheckpoint> {
        self.open(CheckpointType::Moved, timestamp)
    }

    /// Seal `pending` with the notebook version it produced and append it to the log.
    pub fn close(&mut self, pending: PendingCheckpoint, notebook: u32) -> Result<&Checkpoint> {
        if self.open != Some(pending.id) {
            return Err(HistoryError::not_found("open checkpoint", pending.id));
        }
        if pending.kind.is_single_entry() && pending.target_cells.len() != 1 {
            let err = HistoryError::lineage(
                format!("checkpoint {}", pending.id),
                format!("{} needs exactly one entry, got {}", pending.kind, pending.target_cells.len()),
            );
            self.discard(pending);
            return Err(err);
        }

        self.open = None;
        let PendingCheckpoint { id, kind, timestamp, target_cells } = pending;
        info!(checkpoint = %id, kind = %kind, notebook, cells = target_cells.len(), "checkpoint closed");
        self.push(Checkpoint::new(id, kind, timestamp, notebook, target_cells));
        self.get(id)
    }

    /// Drop `pending` entirely and release its id.
    pub fn discard(&mut self, pending: PendingCheckpoint) {
        if self.open != Some(pending.id) {
            return;
        }
        warn!(checkpoint = %pending.id, kind = %pending.kind, "checkpoint discarded");
        self.open = None;
        self.next_id = pending.id.get();
    }

    pub fn get(&self, id: CheckpointId) -> Result<&Checkpoint> {
        self.checkpoints.get(id.index()).ok_or_else(|| HistoryError::not_found("checkpoint", id))
    }

    pub fn all(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn last(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Every checkpoint that produced notebook `version`, in id order.
    pub fn by_notebook(&self, version: u32) -> Vec<&Checkpoint> {
        self.by_notebook
            .get(&version)
            .into_iter()
            .flatten()
            .filter_map(|id| self.checkpoints.get(id.index()))
            .collect()
    }

    /// Checkpoints of one kind, in id order.
    pub fn of_kind(&self, kind: CheckpointType) -> impl Iterator<Item = &Checkpoint> + '_ {
        self.checkpoints.iter().filter(move |checkpoint| checkpoint.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::CheckpointLog;
    use crate::error::HistoryError;
    use crate::model::{CellRunData, ChangeType, CheckpointId, CheckpointType, NodeKind, NodeName};

    fn cell(lineage: u32, version: u32) -> NodeName {
        NodeName::new(NodeKind::CodeCell, lineage, version)
    }

    #[fixture]
    fn log() -> CheckpointLog {
        CheckpointLog::new()
    }

    #[rstest]
    fn ids_are_allocated_in_order_and_reused_after_discard(mut log: CheckpointLog) {
        let run = log.cell_run(10).expect("open");
        assert_eq!(run.id(), CheckpointId::new(0));
        log.discard(run);

        let mut added = log.cell_added(11).expect("open");
        assert_eq!(added.id(), CheckpointId::new(0));
        added.record(CellRunData::new(cell(0, 0), ChangeType::Added)).expect("record");
        let closed = log.close(added, 1).expect("close");
        assert_eq!(closed.kind(), CheckpointType::Add);
        assert_eq!(closed.notebook(), 1);

        assert_eq!(log.next_id(), CheckpointId::new(1));
        assert_eq!(log.len(), 1);
    }

    #[rstest]
    fn only_one_checkpoint_may_be_open(mut log: CheckpointLog) {
        let first = log.notebook_saved(0).expect("open");
        let err = log.cell_run(0).unwrap_err();
        assert!(matches!(err, HistoryError::InconsistentLineage { .. }), "{err:?}");
        log.discard(first);
        assert!(!log.is_open());
    }

    #[rstest]
    fn pending_checkpoints_are_invisible_until_closed(mut log: CheckpointLog) {
        let mut run = log.cell_run(0).expect("open");
        run.record(CellRunData::new(cell(0, 0), ChangeType::Changed)).expect("record");

        assert!(log.is_empty());
        assert!(log.get(run.id()).is_err());
        assert!(log.by_notebook(0).is_empty());

        let id = log.close(run, 0).expect("close").id();
        assert_eq!(log.get(id).expect("closed").target_cells().len(), 1);
    }

    #[rstest]
    #[case(CheckpointType::Add)]
    #[case(CheckpointType::Delete)]
    #[case(CheckpointType::Moved)]
    fn single_entry_kinds_reject_a_second_entry(mut log: CheckpointLog, #[case] kind: CheckpointType) {
        let mut pending = match kind {
            CheckpointType::Add => log.cell_added(0),
            CheckpointType::Delete => log.cell_deleted(0),
            _ => log.cell_moved(0),
        }
        .expect("open");

        pending.record(CellRunData::new(cell(0, 0), ChangeType::Moved)).expect("first");
        let err = pending.record(CellRunData::new(cell(1, 0), ChangeType::Moved)).unwrap_err();
        assert!(matches!(err, HistoryError::InconsistentLineage { .. }), "{err:?}");
        log.discard(pending);
    }

    #[rstest]
    fn single_entry_kinds_cannot_close_empty(mut log: CheckpointLog) {
        let pending = log.cell_deleted(0).expect("open");
        assert!(log.close(pending, 0).is_err());
        assert!(log.is_empty());
        assert!(!log.is_open(), "a rejected close releases the checkpoint");
        assert_eq!(log.next_id().get(), 0);
    }

    #[rstest]
    fn duplicate_removals_are_rejected(mut log: CheckpointLog) {
        let mut save = log.notebook_saved(0).expect("open");
        let removed = CellRunData::new(cell(3, 0), ChangeType::Removed).with_index(2);
        save.record(removed.clone()).expect("first");
        assert!(save.record(removed).is_err());
        save.record(CellRunData::new(cell(3, 0), ChangeType::Removed).with_index(4))
            .expect("other index is a different removal");
        log.discard(save);
    }

    #[rstest]
    fn by_notebook_finds_non_contiguous_checkpoints(mut log: CheckpointLog) {
        for notebook in [0u32, 1, 0] {
            let mut run = log.cell_run(0).expect("open");
            run.record(CellRunData::new(cell(0, notebook), ChangeType::Same)).expect("record");
            log.close(run, notebook).expect("close");
        }

        let ids = log.by_notebook(0).iter().map(|c| c.id().get()).collect::<Vec<_>>();
        assert_eq!(ids, [0, 2]);
        assert!(log.by_notebook(7).is_empty());
    }
}
