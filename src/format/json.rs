// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persisted history document.
//!
//! The checkpoint records keep the camelCase shape and verbose enum strings the editor plugin
//! has always written, so existing history files stay readable.

use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checkpoint::CheckpointLog;
use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::history::History;
use crate::model::{
    CellRunData, ChangeType, Checkpoint, CheckpointId, CheckpointType, NodeName, Nodey, NodeyBody,
    NodeyCode, NodeyCodeCell, NodeyMarkdown, NodeyNotebook, NodeyOutput, OutputNames, Pos,
};
use crate::store::NodeStore;

pub const HISTORY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryJson {
    #[serde(default = "default_format_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<NodeyJson>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointJson>,
}

fn default_format_version() -> u32 {
    HISTORY_FORMAT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeyJson {
    pub name: String,
    pub number: u64,
    pub created: u32,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(flatten)]
    pub body: NodeyBodyJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum NodeyBodyJson {
    #[serde(rename_all = "camelCase")]
    Code {
        #[serde(rename = "type")]
        category: String,
        #[serde(default)]
        content: Vec<String>,
        start: PosJson,
        end: PosJson,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        literal: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CodeCell {
        source: String,
        #[serde(default)]
        content: Vec<String>,
        #[serde(default)]
        output: Vec<String>,
    },
    Markdown { markdown: String },
    #[serde(rename_all = "camelCase")]
    Output {
        raw: Value,
        #[serde(default)]
        depends_on: Vec<String>,
    },
    Notebook {
        #[serde(default)]
        cells: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PosJson {
    pub line: u32,
    pub ch: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointJson {
    pub checkpoint_type: CheckpointTypeJson,
    pub timestamp: i64,
    pub notebook: u32,
    #[serde(default)]
    pub target_cells: Vec<CellRunDataJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CellRunDataJson {
    pub node: String,
    pub change_type: ChangeTypeJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_output: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CheckpointTypeJson {
    #[serde(rename = "run")]
    Run,
    #[serde(rename = "notebook saved")]
    Save,
    #[serde(rename = "notebook loaded")]
    Load,
    #[serde(rename = "cell added")]
    Add,
    #[serde(rename = "cell deleted")]
    Delete,
    #[serde(rename = "cell moved")]
    Moved,
}

impl From<CheckpointType> for CheckpointTypeJson {
    fn from(kind: CheckpointType) -> Self {
        match kind {
            CheckpointType::Run => Self::Run,
            CheckpointType::Save => Self::Save,
            CheckpointType::Load => Self::Load,
            CheckpointType::Add => Self::Add,
            CheckpointType::Delete => Self::Delete,
            CheckpointType::Moved => Self::Moved,
        }
    }
}

impl From<CheckpointTypeJson> for CheckpointType {
    fn from(kind: CheckpointTypeJson) -> Self {
        match kind {
            CheckpointTypeJson::Run => Self::Run,
            CheckpointTypeJson::Save => Self::Save,
            CheckpointTypeJson::Load => Self::Load,
            CheckpointTypeJson::Add => Self::Add,
            CheckpointTypeJson::Delete => Self::Delete,
            CheckpointTypeJson::Moved => Self::Moved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ChangeTypeJson {
    #[serde(rename = "edited")]
    Changed,
    #[serde(rename = "removed")]
    Removed,
    #[serde(rename = "added")]
    Added,
    #[serde(rename = "no change")]
    Same,
    #[serde(rename = "moved")]
    Moved,
    #[serde(rename = "n/a")]
    None,
}

impl From<ChangeType> for ChangeTypeJson {
    fn from(kind: ChangeType) -> Self {
        match kind {
            ChangeType::Changed => Self::Changed,
            ChangeType::Removed => Self::Removed,
            ChangeType::Added => Self::Added,
            ChangeType::Same => Self::Same,
            ChangeType::Moved => Self::Moved,
            ChangeType::None => Self::None,
        }
    }
}

impl From<ChangeTypeJson> for ChangeType {
    fn from(kind: ChangeTypeJson) -> Self {
        match kind {
            ChangeTypeJson::Changed => Self::Changed,
            ChangeTypeJson::Removed => Self::Removed,
            ChangeTypeJson::Added => Self::Added,
            ChangeTypeJson::Same => Self::Same,
            ChangeTypeJson::Moved => Self::Moved,
            ChangeTypeJson::None => Self::None,
        }
    }
}

/// JSON Schema of [`HistoryJson`].
pub fn history_schema() -> Schema {
    schemars::schema_for!(HistoryJson)
}

fn names_to_json(names: &[NodeName]) -> Vec<String> {
    names.iter().map(NodeName::to_string).collect()
}

fn pos_to_json(pos: Pos) -> PosJson {
    PosJson { line: pos.line, ch: pos.ch }
}

fn node_to_json(node: &Nodey) -> NodeyJson {
    let body = match node.body() {
        NodeyBody::Code(code) => NodeyBodyJson::Code {
            category: code.kind().to_owned(),
            content: names_to_json(code.content()),
            start: pos_to_json(code.start()),
            end: pos_to_json(code.end()),
            literal: code.literal().map(str::to_owned),
        },
        NodeyBody::CodeCell(cell) => NodeyBodyJson::CodeCell {
            source: cell.source().to_owned(),
            content: names_to_json(cell.content()),
            output: names_to_json(cell.output()),
        },
        NodeyBody::Markdown(markdown) => {
            NodeyBodyJson::Markdown { markdown: markdown.markdown().to_owned() }
        }
        NodeyBody::Output(output) => NodeyBodyJson::Output {
            raw: output.raw().clone(),
            depends_on: names_to_json(output.depends_on()),
        },
        NodeyBody::Notebook(notebook) => {
            NodeyBodyJson::Notebook { cells: names_to_json(notebook.cells()) }
        }
    };

    NodeyJson {
        name: node.name().to_string(),
        number: node.number(),
        created: node.created().get(),
        timestamp: node.timestamp(),
        parent: node.parent().map(|name| name.to_string()),
        left: node.left().map(|name| name.to_string()),
        right: node.right().map(|name| name.to_string()),
        body,
    }
}

fn checkpoint_to_json(checkpoint: &Checkpoint) -> CheckpointJson {
    CheckpointJson {
        checkpoint_type: checkpoint.kind().into(),
        timestamp: checkpoint.timestamp(),
        notebook: checkpoint.notebook(),
        target_cells: checkpoint
            .target_cells()
            .iter()
            .map(|item| CellRunDataJson {
                node: item.node.to_string(),
                change_type: item.change_type.into(),
                new_output: item.new_output.as_ref().map(|names| names_to_json(names)),
                index: item.index,
            })
            .collect(),
    }
}

pub fn history_to_json(history: &History) -> HistoryJson {
    HistoryJson {
        version: HISTORY_FORMAT_VERSION,
        nodes: history.store().iter().map(node_to_json).collect(),
        checkpoints: history.checkpoints().all().iter().map(checkpoint_to_json).collect(),
    }
}

fn parse_name(field: &str, raw: &str) -> Result<NodeName> {
    NodeName::parse(raw).map_err(|err| HistoryError::serialization(field, err))
}

fn parse_names(field: &str, raw: &[String]) -> Result<Vec<NodeName>> {
    raw.iter().map(|raw| parse_name(field, raw)).collect()
}

fn parse_link(field: &str, raw: Option<&String>) -> Result<Option<NodeName>> {
    raw.map(|raw| parse_name(field, raw)).transpose()
}

fn node_from_json(node: NodeyJson) -> Result<Nodey> {
    let name = parse_name("nodes[].name", &node.name)?;
    let links = [
        parse_link("nodes[].parent", node.parent.as_ref())?,
        parse_link("nodes[].left", node.left.as_ref())?,
        parse_link("nodes[].right", node.right.as_ref())?,
    ];

    let body = match node.body {
        NodeyBodyJson::Code { category, content, start, end, literal } => {
            NodeyBody::Code(NodeyCode::new(
                category,
                parse_names("nodes[].content", &content)?,
                Pos::new(start.line, start.ch),
                Pos::new(end.line, end.ch),
                literal,
            ))
        }
        NodeyBodyJson::CodeCell { source, content, output } => NodeyBody::CodeCell(NodeyCodeCell::new(
            source,
            parse_names("nodes[].content", &content)?,
            parse_names("nodes[].output", &output)?,
        )),
        NodeyBodyJson::Markdown { markdown } => NodeyBody::Markdown(NodeyMarkdown::new(markdown)),
        NodeyBodyJson::Output { raw, depends_on } => NodeyBody::Output(NodeyOutput::new(
            raw,
            parse_names("nodes[].dependsOn", &depends_on)?,
        )),
        NodeyBodyJson::Notebook { cells } => {
            NodeyBody::Notebook(NodeyNotebook::new(parse_names("nodes[].cells", &cells)?))
        }
    };

    if body.kind() != name.kind() {
        return Err(HistoryError::serialization(
            "nodes[].nodeType",
            format!("{name} holds a {} body", body.kind().label()),
        ));
    }

    Ok(Nodey::from_parts(name, node.number, CheckpointId::new(node.created), node.timestamp, links, body))
}

fn checkpoint_from_json(id: u32, checkpoint: CheckpointJson) -> Result<Checkpoint> {
    let target_cells = checkpoint
        .target_cells
        .into_iter()
        .map(|item| -> Result<CellRunData> {
            let node = parse_name("checkpoints[].targetCells[].node", &item.node)?;
            let mut entry = CellRunData::new(node, item.change_type.into());
            if let Some(new_output) = item.new_output {
                let names = parse_names("checkpoints[].targetCells[].newOutput", &new_output)?;
                entry = entry.with_new_output(names.into_iter().collect::<OutputNames>());
            }
            entry.index = item.index;
            Ok(entry)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Checkpoint::new(
        CheckpointId::new(id),
        checkpoint.checkpoint_type.into(),
        checkpoint.timestamp,
        checkpoint.notebook,
        target_cells,
    ))
}

/// Rebuild a history from its persisted form.
///
/// Every name, link and checkpoint reference is checked; any inconsistency fails the whole
/// load with [`HistoryError::Serialization`].
pub fn history_from_json(json: HistoryJson, config: HistoryConfig) -> Result<History> {
    if json.version > HISTORY_FORMAT_VERSION {
        return Err(HistoryError::serialization(
            "version",
            format!("format {} is newer than supported {HISTORY_FORMAT_VERSION}", json.version),
        ));
    }

    let mut nodes = json.nodes.into_iter().map(node_from_json).collect::<Result<Vec<_>>>()?;
    nodes.sort_by_key(|node| node.name());

    let mut store = NodeStore::new();
    for node in nodes {
        store.insert_loaded(node)?;
    }

    let checkpoints = json
        .checkpoints
        .into_iter()
        .enumerate()
        .map(|(id, checkpoint)| checkpoint_from_json(id as u32, checkpoint))
        .collect::<Result<Vec<_>>>()?;
    validate(&store, &checkpoints)?;

    let log = CheckpointLog::from_closed(checkpoints)?;
    Ok(History::from_parts(store, log, config))
}

fn validate(store: &NodeStore, checkpoints: &[Checkpoint]) -> Result<()> {
    let known = |field: &str, name: &NodeName| {
        if store.contains(name) {
            Ok(())
        } else {
            Err(HistoryError::serialization(field, format!("unknown node {name}")))
        }
    };

    for node in store.iter() {
        if node.created().index() >= checkpoints.len() {
            return Err(HistoryError::serialization(
                "nodes[].created",
                format!("{} references missing checkpoint {}", node.name(), node.created()),
            ));
        }
        for link in [node.parent(), node.left(), node.right()].into_iter().flatten() {
            known("nodes[].links", &link)?;
        }
        for child in node.body().children() {
            known("nodes[].content", child)?;
        }
        match node.body() {
            NodeyBody::CodeCell(cell) => {
                for output in cell.output() {
                    known("nodes[].output", output)?;
                }
            }
            NodeyBody::Output(output) => {
                for source in output.depends_on() {
                    known("nodes[].dependsOn", source)?;
                }
            }
            _ => {}
        }
    }

    for checkpoint in checkpoints {
        if store.notebook(checkpoint.notebook()).is_none() {
            return Err(HistoryError::serialization(
                "checkpoints[].notebook",
                format!("checkpoint {} references missing notebook {}", checkpoint.id(), checkpoint.notebook()),
            ));
        }
        for item in checkpoint.target_cells() {
            known("checkpoints[].targetCells[].node", &item.node)?;
            for output in item.new_output() {
                known("checkpoints[].targetCells[].newOutput", output)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
