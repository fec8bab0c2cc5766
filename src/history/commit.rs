// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::Value;

use crate::error::Result;
use crate::format::syntax::{parse_code, SyntaxNode};
use crate::model::{
    CheckpointId, NodeName, NodeyBody, NodeyCode, NodeyCodeCell, NodeyDraft, NodeyMarkdown,
    NodeyNotebook, NodeyOutput,
};
use crate::store::{NodeStore, Stored};

/// Cell content as reported by the editor integration.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// Source text plus the nbformat outputs the kernel produced for it.
    Code { text: String, outputs: Vec<Value> },
    Markdown { text: String },
}

impl CellInput {
    pub fn code(text: impl Into<String>) -> Self {
        Self::Code { text: text.into(), outputs: Vec::new() }
    }

    pub fn code_with_outputs(text: impl Into<String>, outputs: Vec<Value>) -> Self {
        Self::Code { text: text.into(), outputs }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Code { text, .. } | Self::Markdown { text } => text,
        }
    }
}

/// Bottom-up writer for one checkpoint: children are stored before their parents so a
/// parent's identity already contains its children's final names.
pub(crate) struct Committer<'a> {
    store: &'a mut NodeStore,
    created: CheckpointId,
    timestamp: i64,
}

impl<'a> Committer<'a> {
    pub(crate) fn new(store: &'a mut NodeStore, created: CheckpointId, timestamp: i64) -> Self {
        Self { store, created, timestamp }
    }

    pub(crate) fn store(&self) -> &NodeStore {
        self.store
    }

    pub(crate) fn reparent(&mut self, name: NodeName, parent: NodeName) -> Result<()> {
        self.store.reparent(name, parent)
    }

    fn draft(&self, body: NodeyBody) -> NodeyDraft {
        NodeyDraft { created: self.created, timestamp: self.timestamp, body }
    }

    fn children_of(&self, name: Option<NodeName>) -> Vec<NodeName> {
        name.and_then(|name| self.store.get(&name).ok())
            .map(|node| node.body().children().to_vec())
            .unwrap_or_default()
    }

    /// Commit one cell. `prior` is the version currently at the cell's position, if any.
    pub(crate) fn commit_cell(&mut self, input: &CellInput, prior: Option<NodeName>) -> Result<Stored> {
        match input {
            CellInput::Markdown { text } => {
                let draft = self.draft(NodeyBody::Markdown(NodeyMarkdown::new(text.as_str())));
                self.store.store(draft, prior)
            }
            CellInput::Code { text, outputs } => {
                let tree = parse_code(text);
                self.commit_code_cell(text, &tree, outputs, prior)
            }
        }
    }

    /// Commit a code cell from an already decomposed tree. The tree root stands for the cell;
    /// its children become the cell's statements.
    pub(crate) fn commit_code_cell(
        &mut self,
        source: &str,
        tree: &SyntaxNode,
        outputs: &[Value],
        prior: Option<NodeName>,
    ) -> Result<Stored> {
        let prior_cell = prior.filter(|name| {
            self.store.get(name).map_or(false, |node| node.as_code_cell().is_some())
        });
        let prior_children = self.children_of(prior_cell);

        let mut children = Vec::with_capacity(tree.children.len());
        for (index, child) in tree.children.iter().enumerate() {
            children.push(self.commit_code(child, prior_children.get(index).copied())?);
        }

        let names = children.iter().map(|child| child.name).collect::<Vec<_>>();

        // Outputs continue the prior version's output lineages by position.
        let previous_outputs = self.outputs_of(prior_cell);
        let mut produced = Vec::with_capacity(outputs.len());
        for (index, raw) in outputs.iter().enumerate() {
            let draft = self.draft(NodeyBody::Output(NodeyOutput::new(raw.clone(), names.clone())));
            produced.push(self.store.store(draft, previous_outputs.get(index).copied())?);
        }

        let output_names = produced.iter().map(|output| output.name).collect();
        let draft = self.draft(NodeyBody::CodeCell(NodeyCodeCell::new(source, names, output_names)));
        let cell = self.store.store(draft, prior)?;
        if cell.created {
            self.link_children(cell.name, &children)?;
        }
        for output in produced.iter().filter(|output| output.created) {
            self.store.set_parent(output.name, cell.name)?;
        }
        Ok(cell)
    }

    fn outputs_of(&self, cell: Option<NodeName>) -> Vec<NodeName> {
        cell.and_then(|name| self.store.get(&name).ok())
            .and_then(|node| node.as_code_cell().map(|cell| cell.output().to_vec()))
            .unwrap_or_default()
    }

    fn commit_code(&mut self, syntax: &SyntaxNode, prior: Option<NodeName>) -> Result<Stored> {
        let prior_children = self.children_of(prior);

        let mut children = Vec::with_capacity(syntax.children.len());
        for (index, child) in syntax.children.iter().enumerate() {
            children.push(self.commit_code(child, prior_children.get(index).copied())?);
        }

        let names = children.iter().map(|child| child.name).collect();
        let code = NodeyCode::new(
            syntax.kind.clone(),
            names,
            syntax.start,
            syntax.end,
            syntax.literal.clone(),
        );
        let stored = self.store.store(self.draft(NodeyBody::Code(code)), prior)?;
        if stored.created {
            self.link_children(stored.name, &children)?;
        }
        Ok(stored)
    }

    /// Store the notebook version listing `cells` and link the cells created with it.
    pub(crate) fn commit_notebook(&mut self, cells: &[Stored]) -> Result<Stored> {
        let prior = self.store.latest_notebook().map(|node| node.name());
        let names = cells.iter().map(|cell| cell.name).collect();
        let draft = self.draft(NodeyBody::Notebook(NodeyNotebook::new(names)));
        let notebook = self.store.store(draft, prior)?;
        if notebook.created {
            self.link_children(notebook.name, cells)?;
        }
        Ok(notebook)
    }

    /// Fill parent and sibling links on the children created in this checkpoint. Reused
    /// versions keep the links they were created with.
    fn link_children(&mut self, parent: NodeName, children: &[Stored]) -> Result<()> {
        for (index, child) in children.iter().enumerate() {
            if !child.created {
                continue;
            }
            self.store.set_parent(child.name, parent)?;
            if let Some(left) = index.checked_sub(1).and_then(|i| children.get(i)) {
                self.store.set_left(child.name, left.name)?;
            }
            if let Some(right) = children.get(index + 1) {
                self.store.set_right(child.name, right.name)?;
            }
        }
        Ok(())
    }
}
