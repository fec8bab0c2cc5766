// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use crate::error::HistoryError;

/// The variant of a versioned artifact; doubles as the name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Code,
    Markdown,
    Output,
    CodeCell,
    Notebook,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] =
        [Self::Code, Self::Markdown, Self::Output, Self::CodeCell, Self::Notebook];

    // Longest prefix first so `cell3.0` never parses as a code node.
    const PARSE_ORDER: [NodeKind; 5] =
        [Self::CodeCell, Self::Output, Self::Notebook, Self::Markdown, Self::Code];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Code => "c",
            Self::Markdown => "m",
            Self::Output => "out",
            Self::CodeCell => "cell",
            Self::Notebook => "nb",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Output => "output",
            Self::CodeCell => "code cell",
            Self::Notebook => "notebook",
        }
    }

    pub fn is_cell(self) -> bool {
        matches!(self, Self::Markdown | Self::CodeCell)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Code => 0,
            Self::Markdown => 1,
            Self::Output => 2,
            Self::CodeCell => 3,
            Self::Notebook => 4,
        }
    }
}

/// A logical entity tracked across versions: `(kind, lineage id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineageId {
    kind: NodeKind,
    id: u32,
}

impl LineageId {
    pub fn new(kind: NodeKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn version(&self, version: u32) -> NodeName {
        NodeName::new(self.kind, self.id, version)
    }
}

impl fmt::Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.prefix())?;
        f.write_str(itoa::Buffer::new().format(self.id))
    }
}

/// Content-addressed, immutable name of one node version: `<prefix><lineage>.<version>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeName {
    lineage: LineageId,
    version: u32,
}

impl NodeName {
    pub fn new(kind: NodeKind, lineage: u32, version: u32) -> Self {
        Self { lineage: LineageId::new(kind, lineage), version }
    }

    pub fn parse(input: &str) -> Result<Self, HistoryError> {
        input.parse()
    }

    pub fn kind(&self) -> NodeKind {
        self.lineage.kind
    }

    pub fn lineage(&self) -> LineageId {
        self.lineage
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The version immediately before this one in the same lineage.
    pub fn previous(&self) -> Option<NodeName> {
        let version = self.version.checked_sub(1)?;
        Some(self.lineage.version(version))
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = itoa::Buffer::new();
        write!(f, "{}.", self.lineage)?;
        f.write_str(buf.format(self.version))
    }
}

impl FromStr for NodeName {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| HistoryError::InvalidName { value: s.to_owned(), reason };

        let (kind, rest) = NodeKind::PARSE_ORDER
            .iter()
            .find_map(|kind| s.strip_prefix(kind.prefix()).map(|rest| (*kind, rest)))
            .ok_or_else(|| invalid("unknown kind prefix"))?;

        let (lineage, version) = rest.split_once('.').ok_or_else(|| invalid("missing '.'"))?;
        let lineage = parse_number(lineage).ok_or_else(|| invalid("lineage is not a number"))?;
        let version = parse_number(version).ok_or_else(|| invalid("version is not a number"))?;

        Ok(Self::new(kind, lineage, version))
    }
}

fn parse_number(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Position of a checkpoint in the log. Allocated by a monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckpointId(u32);

impl CheckpointId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(itoa::Buffer::new().format(self.0))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{NodeKind, NodeName};
    use crate::error::HistoryError;

    #[rstest]
    #[case("c3.0", NodeKind::Code, 3, 0)]
    #[case("cell0.12", NodeKind::CodeCell, 0, 12)]
    #[case("out7.1", NodeKind::Output, 7, 1)]
    #[case("m2.4", NodeKind::Markdown, 2, 4)]
    #[case("nb0.9", NodeKind::Notebook, 0, 9)]
    fn name_parses_prefix_lineage_and_version(
        #[case] raw: &str,
        #[case] kind: NodeKind,
        #[case] lineage: u32,
        #[case] version: u32,
    ) {
        let name = NodeName::parse(raw).expect("name");
        assert_eq!(name.kind(), kind);
        assert_eq!(name.lineage().id(), lineage);
        assert_eq!(name.version(), version);
        assert_eq!(name.to_string(), raw);
    }

    #[rstest]
    #[case("x1.0")]
    #[case("c1")]
    #[case("c.1")]
    #[case("c1.-1")]
    #[case("cell1.0a")]
    fn name_rejects_malformed_input(#[case] raw: &str) {
        let err = NodeName::parse(raw).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidName { .. }), "{err:?}");
    }

    #[test]
    fn previous_walks_back_within_the_lineage() {
        let name = NodeName::new(NodeKind::Code, 4, 2);
        assert_eq!(name.previous(), Some(NodeName::new(NodeKind::Code, 4, 1)));
        assert_eq!(NodeName::new(NodeKind::Code, 4, 0).previous(), None);
    }
}
