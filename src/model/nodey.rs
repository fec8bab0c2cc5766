// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::Value;
use smol_str::SmolStr;

use super::ids::{CheckpointId, NodeKind, NodeName};

/// 0-based source position (`ch` counts chars, not bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub line: u32,
    pub ch: u32,
}

impl Pos {
    pub fn new(line: u32, ch: u32) -> Self {
        Self { line, ch }
    }
}

/// One syntax-tree node version inside a code cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeyCode {
    kind: SmolStr,
    content: Vec<NodeName>,
    start: Pos,
    end: Pos,
    literal: Option<String>,
}

impl NodeyCode {
    pub fn new(
        kind: impl Into<SmolStr>,
        content: Vec<NodeName>,
        start: Pos,
        end: Pos,
        literal: Option<String>,
    ) -> Self {
        Self { kind: kind.into(), content, start, end, literal }
    }

    /// Grammar category (`Assign`, `name`, `op`, ...).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn content(&self) -> &[NodeName] {
        &self.content
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn end(&self) -> Pos {
        self.end
    }

    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }
}

/// A code cell version: its full source, its top-level statements and the outputs it displays.
///
/// `output` is part of the version's identity: a run that shows different outputs (or none)
/// creates a new cell version and never rewrites an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeyCodeCell {
    source: String,
    content: Vec<NodeName>,
    output: Vec<NodeName>,
}

impl NodeyCodeCell {
    pub fn new(source: impl Into<String>, content: Vec<NodeName>, output: Vec<NodeName>) -> Self {
        Self { source: source.into(), content, output }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content(&self) -> &[NodeName] {
        &self.content
    }

    pub fn output(&self) -> &[NodeName] {
        &self.output
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeyMarkdown {
    markdown: String,
}

impl NodeyMarkdown {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self { markdown: markdown.into() }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }
}

/// One execution result. `raw` is the opaque nbformat output payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeyOutput {
    raw: Value,
    depends_on: Vec<NodeName>,
}

impl NodeyOutput {
    pub fn new(raw: Value, depends_on: Vec<NodeName>) -> Self {
        Self { raw, depends_on }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn depends_on(&self) -> &[NodeName] {
        &self.depends_on
    }

    /// nbformat `output_type` (`stream`, `execute_result`, ...), if present.
    pub fn output_type(&self) -> Option<&str> {
        self.raw.get("output_type").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeyNotebook {
    cells: Vec<NodeName>,
}

impl NodeyNotebook {
    pub fn new(cells: Vec<NodeName>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[NodeName] {
        &self.cells
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeyBody {
    Code(NodeyCode),
    Markdown(NodeyMarkdown),
    Output(NodeyOutput),
    CodeCell(NodeyCodeCell),
    Notebook(NodeyNotebook),
}

impl NodeyBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Code(_) => NodeKind::Code,
            Self::Markdown(_) => NodeKind::Markdown,
            Self::Output(_) => NodeKind::Output,
            Self::CodeCell(_) => NodeKind::CodeCell,
            Self::Notebook(_) => NodeKind::Notebook,
        }
    }

    /// Ordered child names (statements, tokens or cells).
    pub fn children(&self) -> &[NodeName] {
        match self {
            Self::Code(code) => code.content(),
            Self::CodeCell(cell) => cell.content(),
            Self::Notebook(notebook) => notebook.cells(),
            Self::Markdown(_) | Self::Output(_) => &[],
        }
    }

    /// Whether `other` may reuse this version. Spans and links are ignored.
    pub fn same_content(&self, other: &NodeyBody) -> bool {
        match (self, other) {
            (Self::Code(a), Self::Code(b)) => {
                a.kind == b.kind && a.literal == b.literal && a.content == b.content
            }
            (Self::CodeCell(a), Self::CodeCell(b)) => {
                a.source == b.source && a.content == b.content && a.output == b.output
            }
            (Self::Markdown(a), Self::Markdown(b)) => a.markdown == b.markdown,
            (Self::Output(a), Self::Output(b)) => a.raw == b.raw,
            (Self::Notebook(a), Self::Notebook(b)) => a.cells == b.cells,
            _ => false,
        }
    }

    /// Whether a version of `self` may continue the lineage of `prior`.
    pub(crate) fn same_lineage_shape(&self, prior: &NodeyBody) -> bool {
        match (self, prior) {
            (Self::Code(a), Self::Code(b)) => a.kind == b.kind,
            _ => self.kind() == prior.kind(),
        }
    }
}

/// Everything needed to register a new version, before it has a name.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeyDraft {
    pub created: CheckpointId,
    pub timestamp: i64,
    pub body: NodeyBody,
}

/// One immutable version of a notebook artifact.
///
/// `parent`, `left` and `right` are lookup-only handles into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Nodey {
    name: NodeName,
    number: u64,
    created: CheckpointId,
    timestamp: i64,
    parent: Option<NodeName>,
    left: Option<NodeName>,
    right: Option<NodeName>,
    body: NodeyBody,
}

impl Nodey {
    pub(crate) fn from_draft(name: NodeName, number: u64, draft: NodeyDraft) -> Self {
        Self {
            name,
            number,
            created: draft.created,
            timestamp: draft.timestamp,
            parent: None,
            left: None,
            right: None,
            body: draft.body,
        }
    }

    pub(crate) fn from_parts(
        name: NodeName,
        number: u64,
        created: CheckpointId,
        timestamp: i64,
        links: [Option<NodeName>; 3],
        body: NodeyBody,
    ) -> Self {
        let [parent, left, right] = links;
        Self { name, number, created, timestamp, parent, left, right, body }
    }

    pub fn name(&self) -> NodeName {
        self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.name.kind()
    }

    pub fn version(&self) -> u32 {
        self.name.version()
    }

    /// Chronological counter over all versions of this kind.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Checkpoint that produced this version.
    pub fn created(&self) -> CheckpointId {
        self.created
    }

    /// Epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn parent(&self) -> Option<NodeName> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeName> {
        self.left
    }

    pub fn right(&self) -> Option<NodeName> {
        self.right
    }

    pub fn body(&self) -> &NodeyBody {
        &self.body
    }

    pub fn as_code(&self) -> Option<&NodeyCode> {
        match &self.body {
            NodeyBody::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_code_cell(&self) -> Option<&NodeyCodeCell> {
        match &self.body {
            NodeyBody::CodeCell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_markdown(&self) -> Option<&NodeyMarkdown> {
        match &self.body {
            NodeyBody::Markdown(markdown) => Some(markdown),
            _ => None,
        }
    }

    pub fn as_output(&self) -> Option<&NodeyOutput> {
        match &self.body {
            NodeyBody::Output(output) => Some(output),
            _ => None,
        }
    }

    pub fn as_notebook(&self) -> Option<&NodeyNotebook> {
        match &self.body {
            NodeyBody::Notebook(notebook) => Some(notebook),
            _ => None,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeName>) {
        self.parent = parent;
    }

    pub(crate) fn set_left(&mut self, left: Option<NodeName>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Option<NodeName>) {
        self.right = right;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{NodeyBody, NodeyCode, NodeyCodeCell, NodeyOutput, Pos};
    use crate::model::{NodeKind, NodeName};

    #[test]
    fn code_identity_ignores_spans() {
        let a = NodeyBody::Code(NodeyCode::new(
            "name",
            Vec::new(),
            Pos::new(0, 0),
            Pos::new(0, 1),
            Some("x".to_owned()),
        ));
        let b = NodeyBody::Code(NodeyCode::new(
            "name",
            Vec::new(),
            Pos::new(4, 2),
            Pos::new(4, 3),
            Some("x".to_owned()),
        ));
        assert!(a.same_content(&b));
    }

    #[test]
    fn cell_identity_includes_the_output_list() {
        let first = NodeName::new(NodeKind::Output, 0, 0);
        let second = NodeName::new(NodeKind::Output, 0, 1);
        let bare = NodeyBody::CodeCell(NodeyCodeCell::new("1 + 1", Vec::new(), Vec::new()));
        let shown = NodeyBody::CodeCell(NodeyCodeCell::new("1 + 1", Vec::new(), vec![first]));
        let reshown = NodeyBody::CodeCell(NodeyCodeCell::new("1 + 1", Vec::new(), vec![second]));
        assert!(!bare.same_content(&shown));
        assert!(!shown.same_content(&reshown));
        assert!(shown.same_content(&shown.clone()));
    }

    #[test]
    fn output_identity_compares_payload() {
        let a = NodeyBody::Output(NodeyOutput::new(json!({"text": "1.0"}), Vec::new()));
        let b = NodeyBody::Output(NodeyOutput::new(json!({"text": "2.0"}), Vec::new()));
        assert!(!a.same_content(&b));
        assert!(a.same_content(&a.clone()));
    }
}
