// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text search across every stored cell and output version.

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};

use crate::error::{HistoryError, Result};
use crate::history::History;
use crate::model::{NodeKind, NodeName};
use crate::render::text::truncate_with_ellipsis;

const EXCERPT_CHARS: usize = 80;
const SEARCHED_KINDS: [NodeKind; 3] = [NodeKind::CodeCell, NodeKind::Markdown, NodeKind::Output];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Substring,
    Regex,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub name: NodeName,
    /// 0-based line of the best match.
    pub line: usize,
    pub score: i64,
    pub excerpt: String,
}

enum Matcher {
    Substring(String),
    Regex(Regex),
    Fuzzy(String),
}

impl Matcher {
    fn new(needle: &str, mode: SearchMode) -> Result<Self> {
        let trimmed = needle.trim();
        match mode {
            SearchMode::Substring => Ok(Self::Substring(trimmed.to_lowercase())),
            SearchMode::Fuzzy => Ok(Self::Fuzzy(trimmed.to_lowercase())),
            SearchMode::Regex => RegexBuilder::new(trimmed)
                .case_insensitive(true)
                .build()
                .map(Self::Regex)
                .map_err(|err| HistoryError::InvalidQuery { query: needle.to_owned(), reason: err.to_string() }),
        }
    }

    fn score_line(&self, line: &str) -> Option<i64> {
        match self {
            Self::Substring(needle) => regular_score(needle, &line.to_lowercase()),
            Self::Fuzzy(needle) => fuzzy_score(needle, &line.to_lowercase()),
            Self::Regex(re) => {
                let found = re.find(line)?;
                Some(200_000i64.saturating_sub(found.start() as i64 * 1000))
            }
        }
    }
}

/// Search all cell and output versions for `needle`. Hits come back ordered by
/// (kind, lineage, version), one per matching version.
pub fn search(history: &History, needle: &str, mode: SearchMode) -> Result<Vec<SearchHit>> {
    if needle.trim().is_empty() {
        return Ok(Vec::new());
    }
    let matcher = Matcher::new(needle, mode)?;

    let mut texts = Vec::new();
    for kind in SEARCHED_KINDS {
        for node in history.store().iter_kind(kind) {
            texts.push((node.name(), history.text_of(&node.name())?));
        }
    }

    let mut hits = texts
        .par_iter()
        .filter_map(|(name, text)| best_line(&matcher, text).map(|(line, score, excerpt)| SearchHit {
            name: *name,
            line,
            score,
            excerpt,
        }))
        .collect::<Vec<_>>();
    hits.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(hits)
}

fn best_line(matcher: &Matcher, text: &str) -> Option<(usize, i64, String)> {
    let mut best: Option<(usize, i64, &str)> = None;
    for (index, line) in text.lines().enumerate() {
        if let Some(score) = matcher.score_line(line) {
            if best.map_or(true, |(_, top, _)| score > top) {
                best = Some((index, score, line));
            }
        }
    }
    best.map(|(index, score, line)| (index, score, truncate_with_ellipsis(line.trim(), EXCERPT_CHARS)))
}

fn regular_score(needle: &str, haystack: &str) -> Option<i64> {
    if needle.is_empty() {
        return None;
    }

    let first = haystack.find(needle)?;
    let starts = first == 0;
    let start_boundary =
        starts || haystack[..first].chars().last().is_some_and(is_boundary_char);
    let occurrences = haystack.match_indices(needle).count() as i64;

    let mut score = 200_000i64.saturating_sub((first as i64) * 1000);
    score += occurrences * 200;
    score -= haystack.chars().count() as i64;
    if starts {
        score += 50_000;
    }
    if start_boundary {
        score += 20_000;
    }
    if haystack == needle {
        score += 100_000;
    }
    Some(score)
}

fn fuzzy_score(needle: &str, haystack: &str) -> Option<i64> {
    if needle.is_empty() {
        return None;
    }

    let subseq = subsequence_stats(needle, haystack)?;
    let ratio = rapidfuzz::fuzz::ratio(needle.chars(), haystack.chars());

    let mut score = (ratio * 1000.0).round() as i64;
    score -= subseq.span as i64;
    score -= (subseq.first as i64) / 4;
    score += (subseq.consecutive as i64) * 40;
    if subseq.start_boundary {
        score += 150;
    }
    score += if haystack.contains(needle) { 2000 } else { 500 };
    Some(score)
}

struct SubsequenceStats {
    first: usize,
    span: usize,
    consecutive: usize,
    start_boundary: bool,
}

fn subsequence_stats(needle: &str, haystack: &str) -> Option<SubsequenceStats> {
    let mut wanted = needle.chars().peekable();
    let mut first: Option<usize> = None;
    let mut last = 0usize;
    let mut prev_match: Option<usize> = None;
    let mut consecutive = 0usize;
    let mut start_boundary = false;
    let mut prev_char: Option<char> = None;

    for (index, ch) in haystack.chars().enumerate() {
        let Some(&want) = wanted.peek() else {
            break;
        };
        if ch == want {
            wanted.next();
            if first.is_none() {
                first = Some(index);
                start_boundary = prev_char.map_or(true, is_boundary_char);
            }
            if prev_match.is_some_and(|prev| index == prev + 1) {
                consecutive += 1;
            }
            prev_match = Some(index);
            last = index;
        }
        prev_char = Some(ch);
    }

    if wanted.peek().is_some() {
        return None;
    }
    let first = first?;
    Some(SubsequenceStats {
        first,
        span: last.saturating_sub(first).saturating_add(1),
        consecutive,
        start_boundary,
    })
}

fn is_boundary_char(ch: char) -> bool {
    matches!(ch, ' ' | '_' | '.' | '(' | '[' | ',' | '=' | ':' | '\t')
}
