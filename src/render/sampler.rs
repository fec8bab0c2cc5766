// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Short, display-ready samples of node versions for version lists and search results.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::diff::{diff_text, DiffKind, DiffLine};
use super::text::Renderer;
use crate::error::Result;
use crate::history::History;
use crate::model::{NodeKind, NodeName, Nodey, NodeyBody};

/// Byte range of a query match within one body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSample {
    pub name: NodeName,
    pub title: String,
    pub header: String,
    pub body: Vec<DiffLine>,
    pub highlights: Vec<Highlight>,
    /// Set when rendering failed and `body` is a placeholder.
    pub degraded: bool,
}

/// Human label for a node: `code cell 3`, `markdown 1`, `Assign 7 from code cell 3`.
pub fn name_nodey(history: &History, name: &NodeName) -> String {
    let id = name.lineage().id();
    match name.kind() {
        NodeKind::Markdown => format!("markdown {id}"),
        NodeKind::CodeCell => format!("code cell {id}"),
        NodeKind::Output => format!("output {id}"),
        NodeKind::Notebook => format!("notebook {}", name.version() + 1),
        NodeKind::Code => {
            let category = history
                .get(name)
                .ok()
                .and_then(Nodey::as_code)
                .map(|code| code.kind().to_owned())
                .unwrap_or_else(|| "code".to_owned());
            match history.store().cell_parent(name) {
                Some(cell) => format!("{category} {id} from code cell {}", cell.name().lineage().id()),
                None => format!("{category} {id}"),
            }
        }
    }
}

/// `#<version>, NOTEBOOK #<notebook>` (both 1-based), or `???` when the creating checkpoint is
/// not in the log.
pub fn version_header(history: &History, node: &Nodey) -> String {
    match history.checkpoints().get(node.created()) {
        Ok(checkpoint) => format!("#{}, NOTEBOOK #{}", node.version() + 1, checkpoint.notebook() + 1),
        Err(_) => "???".to_owned(),
    }
}

pub fn search_header(history: &History, name: &NodeName) -> String {
    format!("versions of {}", name_nodey(history, name))
}

/// First `sample_lines` lines of a version, for list rows.
pub fn sample_text(history: &History, name: &NodeName) -> Result<String> {
    let text = history.text_of(name)?;
    let limit = history.config().sample_lines;
    Ok(text.lines().take(limit).collect::<Vec<_>>().join("\n"))
}

/// Sample one version: its condensed diff against the previous version, with `query` matches
/// highlighted. Render errors produce a placeholder instead of failing.
pub fn sample(
    history: &History,
    renderer: &dyn Renderer,
    name: &NodeName,
    query: Option<&str>,
) -> VersionSample {
    let title = name_nodey(history, name);
    match build_body(history, renderer, name) {
        Ok((header, body)) => {
            let highlights = query.and_then(query_regex).map(|re| highlight(&body, &re)).unwrap_or_default();
            VersionSample { name: *name, title, header, body, highlights, degraded: false }
        }
        Err(err) => {
            warn!(node = %name, error = %err, "sample degraded to placeholder");
            VersionSample {
                name: *name,
                title,
                header: "???".to_owned(),
                body: vec![DiffLine {
                    kind: DiffKind::Same,
                    text: format!("(unable to display {name})"),
                    segments: Default::default(),
                }],
                highlights: Vec::new(),
                degraded: true,
            }
        }
    }
}

fn build_body(history: &History, renderer: &dyn Renderer, name: &NodeName) -> Result<(String, Vec<DiffLine>)> {
    let node = history.get(name)?;
    let header = version_header(history, node);
    let new_text = renderer.render(history, node)?;

    let old_text = match name.previous() {
        Some(previous) => renderer.render(history, history.get(&previous)?)?,
        None => String::new(),
    };

    let tokens = matches!(node.body(), NodeyBody::Code(_) | NodeyBody::CodeCell(_));
    let diff = super::diff::NodeDiff {
        older: name.previous(),
        newer: *name,
        lines: diff_text(&old_text, &new_text, tokens),
    };
    Ok((header, diff.condensed(history.config().diff_context).lines))
}

fn query_regex(query: &str) -> Option<Regex> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build().ok()
}

fn highlight(body: &[DiffLine], re: &Regex) -> Vec<Highlight> {
    body.iter()
        .enumerate()
        .filter(|(_, line)| line.kind != DiffKind::Elided)
        .flat_map(|(index, line)| {
            re.find_iter(&line.text).map(move |found| Highlight {
                line: index,
                start: found.start(),
                end: found.end(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{name_nodey, sample, sample_text, search_header, Highlight};
    use crate::error::{HistoryError, Result};
    use crate::history::{CellInput, History};
    use crate::model::{NodeKind, NodeName, Nodey};
    use crate::render::diff::DiffKind;
    use crate::render::text::{Renderer, TextRenderer};

    struct Failing;

    impl Renderer for Failing {
        fn render(&self, _history: &History, node: &Nodey) -> Result<String> {
            Err(HistoryError::not_found("renderer", node.name()))
        }
    }

    fn edited_history() -> History {
        let mut history = History::default().with_clock(|| 0);
        history
            .load(&[CellInput::code("x = 1\nprint(x)"), CellInput::markdown("# Title\nsome notes")])
            .expect("load");
        history.run_cell(0, CellInput::code("x = 2\nprint(x)")).expect("run");
        history
    }

    #[test]
    fn labels_name_the_kind_and_lineage() {
        let history = edited_history();
        assert_eq!(name_nodey(&history, &NodeName::new(NodeKind::CodeCell, 0, 1)), "code cell 0");
        assert_eq!(name_nodey(&history, &NodeName::new(NodeKind::Markdown, 0, 0)), "markdown 0");
        // tokens x, =, 1 are c0..c2; their statement is c3
        assert_eq!(name_nodey(&history, &NodeName::new(NodeKind::Code, 3, 0)), "Assign 3 from code cell 0");
        assert_eq!(name_nodey(&history, &NodeName::new(NodeKind::Code, 0, 0)), "name 0 from code cell 0");
        assert_eq!(
            search_header(&history, &NodeName::new(NodeKind::Markdown, 0, 0)),
            "versions of markdown 0"
        );
    }

    #[test]
    fn sample_shows_the_edit_with_highlights() {
        let history = edited_history();
        let name = NodeName::new(NodeKind::CodeCell, 0, 1);

        let sample = sample(&history, &TextRenderer, &name, Some("X ="));
        assert!(!sample.degraded);
        assert_eq!(sample.header, "#2, NOTEBOOK #2");

        let kinds = sample.body.iter().map(|line| (line.kind, line.text.as_str())).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [(DiffKind::Removed, "x = 1"), (DiffKind::Added, "x = 2"), (DiffKind::Same, "print(x)")]
        );
        assert_eq!(
            sample.highlights,
            [Highlight { line: 0, start: 0, end: 3 }, Highlight { line: 1, start: 0, end: 3 }]
        );
    }

    #[test]
    fn render_failures_degrade_to_a_placeholder() {
        let history = edited_history();
        let name = NodeName::new(NodeKind::CodeCell, 0, 0);

        let sample = sample(&history, &Failing, &name, None);
        assert!(sample.degraded);
        assert_eq!(sample.header, "???");
        assert_eq!(sample.body.len(), 1);
    }

    #[test]
    fn sample_text_keeps_the_configured_number_of_lines() {
        let mut history = History::default().with_clock(|| 0);
        history.load(&[CellInput::markdown("a\nb\nc\nd\ne")]).expect("load");
        let text = sample_text(&history, &NodeName::new(NodeKind::Markdown, 0, 0)).expect("text");
        assert_eq!(text, "a\nb\nc");
    }
}
