// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Line and token diffs between two versions of a node.

use smallvec::SmallVec;

use crate::error::{HistoryError, Result};
use crate::history::History;
use crate::model::{NodeKind, NodeName};

// Above this many DP cells the diff degrades to "everything removed, everything added".
const MAX_LCS_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Same,
    Added,
    Removed,
    /// A run of unchanged lines dropped by [`NodeDiff::condensed`].
    Elided,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: DiffKind,
    pub text: String,
}

pub type Segments = SmallVec<[Segment; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
    /// Token-level breakdown for a replaced line; empty otherwise.
    pub segments: Segments,
}

impl DiffLine {
    fn new(kind: DiffKind, text: &str) -> Self {
        Self { kind, text: text.to_owned(), segments: Segments::new() }
    }

    fn elided(count: usize) -> Self {
        let noun = if count == 1 { "line" } else { "lines" };
        Self {
            kind: DiffKind::Elided,
            text: format!("… {count} unchanged {noun}"),
            segments: Segments::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDiff {
    pub older: Option<NodeName>,
    pub newer: NodeName,
    pub lines: Vec<DiffLine>,
}

impl NodeDiff {
    pub fn is_unchanged(&self) -> bool {
        self.lines.iter().all(|line| matches!(line.kind, DiffKind::Same | DiffKind::Elided))
    }

    pub fn added(&self) -> usize {
        self.lines.iter().filter(|line| line.kind == DiffKind::Added).count()
    }

    pub fn removed(&self) -> usize {
        self.lines.iter().filter(|line| line.kind == DiffKind::Removed).count()
    }

    /// Keep changed lines plus `context` unchanged lines around each; collapse the rest.
    pub fn condensed(&self, context: usize) -> NodeDiff {
        let changed = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| matches!(line.kind, DiffKind::Added | DiffKind::Removed))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let keep = |index: usize| {
            changed.iter().any(|&c| c.abs_diff(index) <= context)
        };

        let mut lines = Vec::new();
        let mut skipped = 0usize;
        for (index, line) in self.lines.iter().enumerate() {
            if line.kind != DiffKind::Same || keep(index) {
                if skipped > 0 {
                    lines.push(DiffLine::elided(skipped));
                    skipped = 0;
                }
                lines.push(line.clone());
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            lines.push(DiffLine::elided(skipped));
        }

        NodeDiff { older: self.older, newer: self.newer, lines }
    }
}

/// Diff two explicit versions. `older == None` shows `newer` as entirely added.
pub fn diff_versions(history: &History, older: Option<&NodeName>, newer: &NodeName) -> Result<NodeDiff> {
    if let Some(older) = older {
        if older.kind() != newer.kind() {
            return Err(HistoryError::lineage(
                newer,
                format!("cannot diff against {older}, a different kind"),
            ));
        }
    }

    let new_text = history.text_of(newer)?;
    let old_text = older.map(|name| history.text_of(name)).transpose()?.unwrap_or_default();
    let tokens = matches!(newer.kind(), NodeKind::Code | NodeKind::CodeCell);

    Ok(NodeDiff { older: older.copied(), newer: *newer, lines: diff_text(&old_text, &new_text, tokens) })
}

/// Diff `name` against the version immediately before it in its lineage.
pub fn diff_previous(history: &History, name: &NodeName) -> Result<NodeDiff> {
    history.get(name)?;
    let previous = name.previous();
    diff_versions(history, previous.as_ref(), name)
}

fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().collect()
}

/// Line diff of two texts; with `tokens`, replaced line pairs also carry token segments.
pub fn diff_text(old: &str, new: &str, tokens: bool) -> Vec<DiffLine> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);

    let mut lines = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    let mut removed: Vec<&str> = Vec::new();
    let mut added: Vec<&str> = Vec::new();

    for op in lcs_ops(&old_lines, &new_lines) {
        match op {
            Op::Same(line) => {
                flush(&mut lines, &mut removed, &mut added, tokens);
                lines.push(DiffLine::new(DiffKind::Same, line));
            }
            Op::Removed(line) => removed.push(line),
            Op::Added(line) => added.push(line),
        }
    }
    flush(&mut lines, &mut removed, &mut added, tokens);
    lines
}

fn flush<'a>(out: &mut Vec<DiffLine>, removed: &mut Vec<&'a str>, added: &mut Vec<&'a str>, tokens: bool) {
    let mut removed_lines = removed.drain(..).map(|line| DiffLine::new(DiffKind::Removed, line)).collect::<Vec<_>>();
    let mut added_lines = added.drain(..).map(|line| DiffLine::new(DiffKind::Added, line)).collect::<Vec<_>>();

    if tokens {
        for (old, new) in removed_lines.iter_mut().zip(added_lines.iter_mut()) {
            let (old_segments, new_segments) = token_segments(&old.text, &new.text);
            old.segments = old_segments;
            new.segments = new_segments;
        }
    }

    out.append(&mut removed_lines);
    out.append(&mut added_lines);
}

fn token_segments(old: &str, new: &str) -> (Segments, Segments) {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);

    let mut old_segments = Segments::new();
    let mut new_segments = Segments::new();
    for op in lcs_ops(&old_tokens, &new_tokens) {
        match op {
            Op::Same(token) => {
                push_segment(&mut old_segments, DiffKind::Same, token);
                push_segment(&mut new_segments, DiffKind::Same, token);
            }
            Op::Removed(token) => push_segment(&mut old_segments, DiffKind::Removed, token),
            Op::Added(token) => push_segment(&mut new_segments, DiffKind::Added, token),
        }
    }
    (old_segments, new_segments)
}

fn push_segment(segments: &mut Segments, kind: DiffKind, text: &str) {
    match segments.last_mut() {
        Some(last) if last.kind == kind => last.text.push_str(text),
        _ => segments.push(Segment { kind, text: text.to_owned() }),
    }
}

/// Words, whitespace runs and single punctuation characters.
fn tokenize(line: &str) -> Vec<&str> {
    #[derive(PartialEq)]
    enum Class {
        Word,
        Space,
        Other,
    }
    let class = |c: char| {
        if c.is_alphanumeric() || c == '_' {
            Class::Word
        } else if c.is_whitespace() {
            Class::Space
        } else {
            Class::Other
        }
    };

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;
    for (offset, c) in line.char_indices() {
        let next = class(c);
        let boundary = match &current {
            Some(Class::Other) | None => true,
            Some(prev) => *prev != next,
        };
        if boundary && offset > start {
            tokens.push(&line[start..offset]);
            start = offset;
        }
        current = Some(next);
    }
    if start < line.len() {
        tokens.push(&line[start..]);
    }
    tokens
}

enum Op<'a> {
    Same(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

fn lcs_ops<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Op<'a>> {
    let (n, m) = (old.len(), new.len());
    if n.saturating_mul(m) > MAX_LCS_CELLS {
        return old.iter().map(|&s| Op::Removed(s)).chain(new.iter().map(|&s| Op::Added(s))).collect();
    }

    // lengths[i][j] = LCS of old[i..] and new[j..]
    let width = m + 1;
    let mut lengths = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i * width + j] = if old[i] == new[j] {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push(Op::Same(new[j]));
            i += 1;
            j += 1;
        } else if lengths[(i + 1) * width + j] >= lengths[i * width + j + 1] {
            ops.push(Op::Removed(old[i]));
            i += 1;
        } else {
            ops.push(Op::Added(new[j]));
            j += 1;
        }
    }
    ops.extend(old[i..].iter().map(|&s| Op::Removed(s)));
    ops.extend(new[j..].iter().map(|&s| Op::Added(s)));
    ops
}
