// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::debug;

use crate::error::{HistoryError, Result};
use crate::model::{LineageId, NodeKind, NodeName, Nodey, NodeyDraft};

const KIND_COUNT: usize = NodeKind::ALL.len();

// Parent chains are notebook > cell > statement > token (> output); anything deeper is a cycle.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// Result of [`NodeStore::store`]: the resolved name and whether a new version was allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stored {
    pub name: NodeName,
    pub created: bool,
}

#[derive(Debug)]
enum Undo {
    NewLineage(NodeKind),
    NewVersion(LineageId),
    Links {
        name: NodeName,
        parent: Option<NodeName>,
        left: Option<NodeName>,
        right: Option<NodeName>,
    },
}

/// Arena of every node version, grouped by kind and lineage.
///
/// Lineage lists are append-only. While a transaction is open every mutation is journaled so a
/// failed event can be rolled back without leaving partial versions behind.
#[derive(Debug, Default)]
pub struct NodeStore {
    lineages: [Vec<Vec<Nodey>>; KIND_COUNT],
    numbers: [u64; KIND_COUNT],
    journal: Option<Vec<Undo>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &NodeName) -> Result<&Nodey> {
        self.lookup(name).ok_or_else(|| HistoryError::not_found("node", name))
    }

    /// Resolve a raw `<prefix><lineage>.<version>` string.
    pub fn get_str(&self, raw: &str) -> Result<&Nodey> {
        let name = NodeName::parse(raw)?;
        self.get(&name)
    }

    pub fn contains(&self, name: &NodeName) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &NodeName) -> Option<&Nodey> {
        self.lineage(name.lineage())?.get(name.version() as usize)
    }

    fn lookup_mut(&mut self, name: &NodeName) -> Result<&mut Nodey> {
        let lineage = name.lineage();
        self.lineages[lineage.kind().index()]
            .get_mut(lineage.id() as usize)
            .and_then(|versions| versions.get_mut(name.version() as usize))
            .ok_or_else(|| HistoryError::not_found("node", name))
    }

    /// All versions of one lineage, oldest first.
    pub fn lineage(&self, lineage: LineageId) -> Option<&[Nodey]> {
        self.lineages[lineage.kind().index()]
            .get(lineage.id() as usize)
            .map(Vec::as_slice)
    }

    /// All versions in the lineage `name` belongs to, oldest first.
    pub fn versions(&self, name: &NodeName) -> Result<&[Nodey]> {
        self.lineage(name.lineage())
            .ok_or_else(|| HistoryError::not_found("lineage", name.lineage()))
    }

    pub fn latest(&self, lineage: LineageId) -> Option<&Nodey> {
        self.lineage(lineage)?.last()
    }

    pub fn lineage_count(&self, kind: NodeKind) -> u32 {
        self.lineages[kind.index()].len() as u32
    }

    pub fn len(&self) -> usize {
        self.lineages.iter().flatten().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored version, ordered by kind, lineage, version.
    pub fn iter(&self) -> impl Iterator<Item = &Nodey> + '_ {
        self.lineages.iter().flatten().flatten()
    }

    pub fn iter_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Nodey> + '_ {
        self.lineages[kind.index()].iter().flatten()
    }

    /// Content-address `draft` within the lineage of `prior`.
    ///
    /// `prior` continues its lineage only when it has the same kind (and, for code nodes, the
    /// same grammar category). If the lineage's latest version has identical content its name is
    /// returned and nothing is allocated.
    pub fn store(&mut self, draft: NodeyDraft, prior: Option<NodeName>) -> Result<Stored> {
        let lineage = match prior {
            Some(prior) => {
                let prior_node = self.get(&prior)?;
                draft.body.same_lineage_shape(prior_node.body()).then(|| prior.lineage())
            }
            None => None,
        };

        let Some(lineage) = lineage else {
            let name = self.push_lineage(draft);
            return Ok(Stored { name, created: true });
        };

        let latest = self
            .latest(lineage)
            .ok_or_else(|| HistoryError::not_found("lineage", lineage))?;
        if latest.body().same_content(&draft.body) {
            return Ok(Stored { name: latest.name(), created: false });
        }

        let name = self.push_version(lineage, draft);
        Ok(Stored { name, created: true })
    }

    fn push_lineage(&mut self, draft: NodeyDraft) -> NodeName {
        let kind = draft.body.kind();
        let id = self.lineage_count(kind);
        self.lineages[kind.index()].push(Vec::new());
        self.record(Undo::NewLineage(kind));
        self.push_version(LineageId::new(kind, id), draft)
    }

    fn push_version(&mut self, lineage: LineageId, draft: NodeyDraft) -> NodeName {
        let kind = lineage.kind();
        let created = draft.created;
        let number = self.numbers[kind.index()];
        self.numbers[kind.index()] += 1;

        let versions = &mut self.lineages[kind.index()][lineage.id() as usize];
        let name = lineage.version(versions.len() as u32);
        versions.push(Nodey::from_draft(name, number, draft));
        self.record(Undo::NewVersion(lineage));

        debug!(node = %name, checkpoint = %created, "stored new version");
        name
    }

    /// Register a version decoded from a persisted history. Versions must arrive in order.
    pub(crate) fn insert_loaded(&mut self, node: Nodey) -> Result<()> {
        let name = node.name();
        let kind = name.kind();
        let lineages = &mut self.lineages[kind.index()];
        let lineage_id = name.lineage().id() as usize;

        if lineage_id == lineages.len() {
            lineages.push(Vec::new());
        }
        let versions = lineages.get_mut(lineage_id).ok_or_else(|| {
            HistoryError::serialization("nodes[].name", format!("{name} skips a lineage id"))
        })?;
        if versions.len() != name.version() as usize {
            return Err(HistoryError::serialization(
                "nodes[].name",
                format!("{name} is out of order (expected version {})", versions.len()),
            ));
        }

        self.numbers[kind.index()] = self.numbers[kind.index()].max(node.number() + 1);
        versions.push(node);
        Ok(())
    }

    pub fn set_parent(&mut self, name: NodeName, parent: NodeName) -> Result<()> {
        match self.get(&name)?.parent() {
            Some(existing) if existing == parent => return Ok(()),
            Some(existing) => {
                return Err(HistoryError::lineage(
                    name,
                    format!("parent already set to {existing}, refusing {parent}"),
                ))
            }
            None => {}
        }
        self.save_links(name)?;
        self.lookup_mut(&name)?.set_parent(Some(parent));
        Ok(())
    }

    /// Point a moved node at a new parent version. The only sanctioned parent reassignment.
    pub fn reparent(&mut self, name: NodeName, parent: NodeName) -> Result<()> {
        self.save_links(name)?;
        self.lookup_mut(&name)?.set_parent(Some(parent));
        Ok(())
    }

    pub fn set_left(&mut self, name: NodeName, left: NodeName) -> Result<()> {
        if name == left {
            return Err(HistoryError::lineage(name, "node cannot be its own left sibling"));
        }
        match self.get(&name)?.left() {
            Some(existing) if existing == left => return Ok(()),
            Some(existing) => {
                return Err(HistoryError::lineage(
                    name,
                    format!("left sibling already set to {existing}, refusing {left}"),
                ))
            }
            None => {}
        }
        self.save_links(name)?;
        self.lookup_mut(&name)?.set_left(Some(left));
        Ok(())
    }

    pub fn set_right(&mut self, name: NodeName, right: NodeName) -> Result<()> {
        if name == right {
            return Err(HistoryError::lineage(name, "node cannot be its own right sibling"));
        }
        match self.get(&name)?.right() {
            Some(existing) if existing == right => return Ok(()),
            Some(existing) => {
                return Err(HistoryError::lineage(
                    name,
                    format!("right sibling already set to {existing}, refusing {right}"),
                ))
            }
            None => {}
        }
        self.save_links(name)?;
        self.lookup_mut(&name)?.set_right(Some(right));
        Ok(())
    }

    fn save_links(&mut self, name: NodeName) -> Result<()> {
        let node = self.get(&name)?;
        let undo = Undo::Links { name, parent: node.parent(), left: node.left(), right: node.right() };
        self.record(undo);
        Ok(())
    }

    /// The notebook node for a notebook version number, if it exists.
    pub fn notebook(&self, version: u32) -> Option<&Nodey> {
        self.lookup(&NodeName::new(NodeKind::Notebook, 0, version))
    }

    pub fn latest_notebook(&self) -> Option<&Nodey> {
        self.latest(LineageId::new(NodeKind::Notebook, 0))
    }

    /// Nearest enclosing cell of `name`. `None` when the node is not (yet) linked under a cell.
    pub fn cell_parent(&self, name: &NodeName) -> Option<&Nodey> {
        let mut current = self.lookup(name)?.parent();
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let node = self.lookup(&current?)?;
            if node.kind().is_cell() {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    pub(crate) fn begin(&mut self) {
        debug_assert!(self.journal.is_none(), "store transaction already open");
        self.journal = Some(Vec::new());
    }

    pub(crate) fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every mutation since [`NodeStore::begin`].
    pub(crate) fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };

        for undo in journal.into_iter().rev() {
            match undo {
                Undo::NewLineage(kind) => {
                    self.lineages[kind.index()].pop();
                }
                Undo::NewVersion(lineage) => {
                    let kind = lineage.kind().index();
                    if let Some(versions) = self.lineages[kind].get_mut(lineage.id() as usize) {
                        versions.pop();
                    }
                    self.numbers[kind] = self.numbers[kind].saturating_sub(1);
                }
                Undo::Links { name, parent, left, right } => {
                    if let Ok(node) = self.lookup_mut(&name) {
                        node.set_parent(parent);
                        node.set_left(left);
                        node.set_right(right);
                    }
                }
            }
        }
    }

    fn record(&mut self, undo: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }
}
