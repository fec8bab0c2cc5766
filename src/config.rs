// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

pub const SAMPLE_LINES_ENV: &str = "NBTRAIL_SAMPLE_LINES";
pub const DIFF_CONTEXT_ENV: &str = "NBTRAIL_DIFF_CONTEXT";
pub const UTC_OFFSET_ENV: &str = "NBTRAIL_UTC_OFFSET";

// chrono rejects offsets of a full day or more.
const MAX_OFFSET_SECS: i32 = 24 * 3600 - 1;

/// Display and grouping knobs. None of these affect what gets versioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Lines shown in list samples.
    pub sample_lines: usize,
    /// Unchanged lines kept around each hunk of a condensed diff.
    pub diff_context: usize,
    /// Offset applied before grouping events by calendar day.
    pub utc_offset_secs: i32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { sample_lines: 3, diff_context: 2, utc_offset_secs: 0 }
    }
}

impl HistoryConfig {
    /// Defaults overlaid with `NBTRAIL_*` variables. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    fn overlay(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |name: &str| var(name).and_then(|raw| raw.trim().parse::<i64>().ok());

        if let Some(lines) = parse(SAMPLE_LINES_ENV) {
            self.sample_lines = lines.clamp(1, 200) as usize;
        }
        if let Some(context) = parse(DIFF_CONTEXT_ENV) {
            self.diff_context = context.clamp(0, 100) as usize;
        }
        if let Some(offset) = parse(UTC_OFFSET_ENV) {
            let max = i64::from(MAX_OFFSET_SECS);
            self.utc_offset_secs = offset.clamp(-max, max) as i32;
        }
        self
    }

    pub fn utc_offset(&self) -> FixedOffset {
        let secs = self.utc_offset_secs.clamp(-MAX_OFFSET_SECS, MAX_OFFSET_SECS);
        FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
    }
}
