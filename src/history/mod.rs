// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The history façade: turns notebook events into node versions and closed checkpoints.
//!
//! Every event runs as one unit. A checkpoint is opened, the store journals every write, and
//! only when the event fully succeeds is the checkpoint closed and subscribers notified.
//! Any error rolls the store back and discards the checkpoint.

mod commit;

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::checkpoint::{cell_map, CheckpointLog, PendingCheckpoint, Timeline};
use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::format::syntax::{self, SyntaxNode};
use crate::model::{
    CellRunData, ChangeType, Checkpoint, CheckpointId, CheckpointType, LineageId, NodeKind,
    NodeName, Nodey, NodeyBody,
};
use crate::signal::Signal;
use crate::store::{NodeStore, Stored};

pub use commit::CellInput;
use commit::Committer;

/// Epoch-millisecond clock used to timestamp checkpoints and versions.
pub type Clock = Box<dyn Fn() -> i64 + Send>;

/// Single-writer handle for hosts that share a history across threads.
pub type SharedHistory = Arc<Mutex<History>>;

/// Payload of [`History::cell_structure_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStructureChange {
    pub checkpoint: CheckpointId,
    pub kind: CheckpointType,
    /// Affected position; `None` for a LOAD that replaced the whole list.
    pub index: Option<usize>,
    pub cell: Option<NodeName>,
}

pub struct History {
    store: NodeStore,
    checkpoints: CheckpointLog,
    config: HistoryConfig,
    clock: Clock,
    checkpoint_closed: Signal<Checkpoint>,
    cell_structure_changed: Signal<CellStructureChange>,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("nodes", &self.store.len())
            .field("checkpoints", &self.checkpoints.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self::from_parts(NodeStore::new(), CheckpointLog::new(), config)
    }

    pub(crate) fn from_parts(store: NodeStore, checkpoints: CheckpointLog, config: HistoryConfig) -> Self {
        Self {
            store,
            checkpoints,
            config,
            clock: Box::new(|| chrono::Utc::now().timestamp_millis()),
            checkpoint_closed: Signal::new(),
            cell_structure_changed: Signal::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn into_shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn checkpoints(&self) -> &CheckpointLog {
        &self.checkpoints
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HistoryConfig) {
        self.config = config;
    }

    /// Fires once per closed checkpoint, after the store and log are consistent.
    pub fn checkpoint_closed(&mut self) -> &mut Signal<Checkpoint> {
        &mut self.checkpoint_closed
    }

    /// Fires after LOAD, ADD, DELETE and MOVED checkpoints close.
    pub fn cell_structure_changed(&mut self) -> &mut Signal<CellStructureChange> {
        &mut self.cell_structure_changed
    }

    pub fn get(&self, name: &NodeName) -> Result<&Nodey> {
        self.store.get(name)
    }

    /// The latest notebook version, if any event has been recorded.
    pub fn notebook(&self) -> Option<&Nodey> {
        self.store.latest_notebook()
    }

    fn current_cells(&self) -> Vec<NodeName> {
        self.notebook()
            .and_then(Nodey::as_notebook)
            .map(|notebook| notebook.cells().to_vec())
            .unwrap_or_default()
    }

    /// Cells of the current notebook version, in order.
    pub fn cell_list(&self) -> Vec<&Nodey> {
        self.current_cells().iter().filter_map(|name| self.store.get(name).ok()).collect()
    }

    /// Lineages of the cells still present, in notebook order.
    pub fn cell_indices(&self) -> Vec<LineageId> {
        self.current_cells().iter().map(NodeName::lineage).collect()
    }

    /// Lineages of every cell ever recorded that the current notebook no longer lists.
    pub fn deleted_cell_indices(&self) -> Vec<LineageId> {
        let present = self.cell_indices();
        [NodeKind::CodeCell, NodeKind::Markdown]
            .into_iter()
            .flat_map(|kind| (0..self.store.lineage_count(kind)).map(move |id| LineageId::new(kind, id)))
            .filter(|lineage| !present.contains(lineage))
            .collect()
    }

    /// Every version in `name`'s lineage, oldest first.
    pub fn get_versions_for(&self, name: &NodeName) -> Result<&[Nodey]> {
        self.store.versions(name)
    }

    pub fn cell_map(&self, checkpoints: &[&Checkpoint]) -> Result<Vec<CellRunData>> {
        cell_map(checkpoints, &self.store)
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::from_checkpoints(self.checkpoints.all(), self.config.utc_offset())
    }

    /// Source text of one version.
    ///
    /// Code nodes are sliced out of the cell version they were created under, so the text stays
    /// correct even after later edits moved the node.
    pub fn text_of(&self, name: &NodeName) -> Result<String> {
        let node = self.store.get(name)?;
        match node.body() {
            NodeyBody::Code(code) => {
                let cell = self.store.cell_parent(name).and_then(Nodey::as_code_cell);
                let sliced = cell.and_then(|cell| syntax::slice(cell.source(), code.start(), code.end()));
                match (sliced, code.literal()) {
                    (Some(text), _) => Ok(text.to_owned()),
                    (None, Some(literal)) => Ok(literal.to_owned()),
                    (None, None) => {
                        let parts = code
                            .content()
                            .iter()
                            .map(|child| self.text_of(child))
                            .collect::<Result<Vec<_>>>()?;
                        Ok(parts.join(" "))
                    }
                }
            }
            NodeyBody::CodeCell(cell) => Ok(cell.source().to_owned()),
            NodeyBody::Markdown(markdown) => Ok(markdown.markdown().to_owned()),
            NodeyBody::Output(output) => Ok(crate::render::text::output_text(output.raw())),
            NodeyBody::Notebook(notebook) => {
                let cells = notebook
                    .cells()
                    .iter()
                    .map(|cell| self.text_of(cell))
                    .collect::<Result<Vec<_>>>()?;
                Ok(cells.join("\n\n"))
            }
        }
    }

    fn run_event<F>(
        &mut self,
        open: fn(&mut CheckpointLog, i64) -> Result<PendingCheckpoint>,
        apply: F,
    ) -> Result<Checkpoint>
    where
        F: FnOnce(&mut Committer<'_>, &mut PendingCheckpoint) -> Result<u32>,
    {
        let timestamp = (self.clock)();
        let mut pending = open(&mut self.checkpoints, timestamp)?;
        let id = pending.id();

        self.store.begin();
        let applied = {
            let mut committer = Committer::new(&mut self.store, id, timestamp);
            apply(&mut committer, &mut pending)
        };

        let notebook = match applied {
            Ok(notebook) => notebook,
            Err(err) => {
                self.store.rollback();
                self.checkpoints.discard(pending);
                return Err(err);
            }
        };

        let checkpoint = match self.checkpoints.close(pending, notebook) {
            Ok(checkpoint) => checkpoint.clone(),
            Err(err) => {
                self.store.rollback();
                return Err(err);
            }
        };
        self.store.commit();

        self.checkpoint_closed.emit(&checkpoint);
        Ok(checkpoint)
    }

    fn notify_structure(&mut self, checkpoint: &Checkpoint, index: Option<usize>) {
        let change = CellStructureChange {
            checkpoint: checkpoint.id(),
            kind: checkpoint.kind(),
            index,
            cell: checkpoint.target_cells().first().map(|item| item.node),
        };
        self.cell_structure_changed.emit(&change);
    }

    /// Record a notebook being opened with `cells`.
    pub fn load(&mut self, cells: &[CellInput]) -> Result<Checkpoint> {
        let checkpoint = self.snapshot(CheckpointLog::notebook_loaded, cells)?;
        info!(checkpoint = %checkpoint.id(), cells = cells.len(), "notebook loaded");
        let change = CellStructureChange {
            checkpoint: checkpoint.id(),
            kind: checkpoint.kind(),
            index: None,
            cell: None,
        };
        self.cell_structure_changed.emit(&change);
        Ok(checkpoint)
    }

    /// Record the notebook being saved with `cells`.
    pub fn save(&mut self, cells: &[CellInput]) -> Result<Checkpoint> {
        self.snapshot(CheckpointLog::notebook_saved, cells)
    }

    fn snapshot(
        &mut self,
        open: fn(&mut CheckpointLog, i64) -> Result<PendingCheckpoint>,
        cells: &[CellInput],
    ) -> Result<Checkpoint> {
        let current = self.current_cells();
        self.run_event(open, |committer, pending| {
            let mut stored = Vec::with_capacity(cells.len());
            for (index, input) in cells.iter().enumerate() {
                stored.push(committer.commit_cell(input, current.get(index).copied())?);
            }
            let notebook = committer.commit_notebook(&stored)?;
            for cell in &stored {
                pending.record_cell(committer.store(), cell.name, !cell.created)?;
            }
            Ok(notebook.name.version())
        })
    }

    /// Record a run of the cells at the given positions with their current content.
    pub fn run_cells(&mut self, runs: &[(usize, CellInput)]) -> Result<Checkpoint> {
        let mut current = self.current_cells();
        let checkpoint = self.run_event(CheckpointLog::cell_run, |committer, pending| {
            let mut executed: Vec<Stored> = Vec::with_capacity(runs.len());
            for (index, input) in runs {
                let prior = *current
                    .get(*index)
                    .ok_or_else(|| HistoryError::not_found("cell index", index))?;
                let stored = committer.commit_cell(input, Some(prior))?;
                current[*index] = stored.name;
                executed.push(stored);
            }

            let cells = current.iter().map(|&name| Stored { name, created: false }).collect::<Vec<_>>();
            let cells = mark_created(cells, &executed);
            let notebook = committer.commit_notebook(&cells)?;
            for cell in &executed {
                if pending.target_cells().iter().all(|item| item.node != cell.name) {
                    pending.record_cell(committer.store(), cell.name, !cell.created)?;
                }
            }
            Ok(notebook.name.version())
        })?;
        debug!(checkpoint = %checkpoint.id(), cells = runs.len(), "cells run");
        Ok(checkpoint)
    }

    pub fn run_cell(&mut self, index: usize, input: CellInput) -> Result<Checkpoint> {
        self.run_cells(&[(index, input)])
    }

    /// Record a code cell whose tree was decomposed by the editor integration.
    pub fn run_parsed_cell(
        &mut self,
        index: usize,
        source: &str,
        tree: &SyntaxNode,
        outputs: &[serde_json::Value],
    ) -> Result<Checkpoint> {
        let mut current = self.current_cells();
        self.run_event(CheckpointLog::cell_run, |committer, pending| {
            let prior = *current.get(index).ok_or_else(|| HistoryError::not_found("cell index", index))?;
            let stored = committer.commit_code_cell(source, tree, outputs, Some(prior))?;
            current[index] = stored.name;

            let cells = current.iter().map(|&name| Stored { name, created: false }).collect::<Vec<_>>();
            let notebook = committer.commit_notebook(&mark_created(cells, &[stored]))?;
            pending.record_cell(committer.store(), stored.name, !stored.created)?;
            Ok(notebook.name.version())
        })
    }

    /// Record a new cell inserted at `index` (`index == len` appends).
    pub fn add_cell(&mut self, index: usize, input: CellInput) -> Result<Checkpoint> {
        let current = self.current_cells();
        if index > current.len() {
            return Err(HistoryError::not_found("cell index", index));
        }

        let checkpoint = self.run_event(CheckpointLog::cell_added, |committer, pending| {
            let added = committer.commit_cell(&input, None)?;
            let mut cells = current.iter().map(|&name| Stored { name, created: false }).collect::<Vec<_>>();
            cells.insert(index, added);

            let notebook = committer.commit_notebook(&cells)?;
            pending.record(CellRunData::new(added.name, ChangeType::Added))?;
            Ok(notebook.name.version())
        })?;
        self.notify_structure(&checkpoint, Some(index));
        Ok(checkpoint)
    }

    /// Record the cell at `index` being deleted. The entry keeps the index it was removed from.
    pub fn delete_cell(&mut self, index: usize) -> Result<Checkpoint> {
        let mut current = self.current_cells();
        if index >= current.len() {
            return Err(HistoryError::not_found("cell index", index));
        }

        let checkpoint = self.run_event(CheckpointLog::cell_deleted, |committer, pending| {
            let removed = current.remove(index);
            let cells = current.iter().map(|&name| Stored { name, created: false }).collect::<Vec<_>>();

            let notebook = committer.commit_notebook(&cells)?;
            pending.record(CellRunData::new(removed, ChangeType::Removed).with_index(index))?;
            Ok(notebook.name.version())
        })?;
        self.notify_structure(&checkpoint, Some(index));
        Ok(checkpoint)
    }

    /// Record the cell at `from` moving to position `to`. The moved cell is reparented to the
    /// new notebook version.
    pub fn move_cell(&mut self, from: usize, to: usize) -> Result<Checkpoint> {
        let mut current = self.current_cells();
        if from >= current.len() || to >= current.len() {
            return Err(HistoryError::not_found("cell index", from.max(to)));
        }

        let checkpoint = self.run_event(CheckpointLog::cell_moved, |committer, pending| {
            let moved = current.remove(from);
            current.insert(to, moved);
            let cells = current.iter().map(|&name| Stored { name, created: false }).collect::<Vec<_>>();

            let notebook = committer.commit_notebook(&cells)?;
            if notebook.created {
                committer.reparent(moved, notebook.name)?;
            }
            pending.record(CellRunData::new(moved, ChangeType::Moved))?;
            Ok(notebook.name.version())
        })?;
        self.notify_structure(&checkpoint, Some(to));
        Ok(checkpoint)
    }
}

// Cells created by this event's commits are the ones the new notebook version may link.
fn mark_created(mut cells: Vec<Stored>, executed: &[Stored]) -> Vec<Stored> {
    for cell in &mut cells {
        cell.created = executed.iter().any(|run| run.created && run.name == cell.name);
    }
    cells
}
