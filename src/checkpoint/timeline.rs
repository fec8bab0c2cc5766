// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Calendar grouping of checkpoints for the event list.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};

use crate::model::{Checkpoint, CheckpointId};

/// Consecutive checkpoints of one day that produced the same notebook version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGroup {
    pub notebook: u32,
    pub events: Vec<CheckpointId>,
}

/// All event groups of one calendar day. `date` is the first event's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub date: i64,
    pub events: Vec<EventGroup>,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    offset: FixedOffset,
    dates: Vec<DateGroup>,
}

impl Timeline {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset, dates: Vec::new() }
    }

    pub fn from_checkpoints<'a>(
        checkpoints: impl IntoIterator<Item = &'a Checkpoint>,
        offset: FixedOffset,
    ) -> Self {
        let mut timeline = Self::new(offset);
        for checkpoint in checkpoints {
            timeline.add_event(checkpoint);
        }
        timeline
    }

    pub fn dates(&self) -> &[DateGroup] {
        &self.dates
    }

    /// Append `checkpoint`, opening a new day or notebook group when either changes.
    pub fn add_event(&mut self, checkpoint: &Checkpoint) {
        let time = checkpoint.timestamp();
        let group = EventGroup { notebook: checkpoint.notebook(), events: vec![checkpoint.id()] };

        let offset = self.offset;
        match self.dates.last_mut() {
            Some(date) if same_day(date.date, time, offset) => match date.events.last_mut() {
                Some(last) if last.notebook == group.notebook => last.events.push(checkpoint.id()),
                _ => date.events.push(group),
            },
            _ => self.dates.push(DateGroup { date: time, events: vec![group] }),
        }
    }
}

fn local(timestamp: i64, offset: FixedOffset) -> DateTime<FixedOffset> {
    offset
        .timestamp_millis_opt(timestamp)
        .single()
        .unwrap_or_else(|| DateTime::<chrono::Utc>::default().with_timezone(&offset))
}

/// `3:07pm`.
pub fn format_time(timestamp: i64, offset: FixedOffset) -> String {
    local(timestamp, offset).format("%-I:%M%P").to_string()
}

/// `today January 3 2026`, `yesterday ...`, otherwise the weekday name.
pub fn format_date(timestamp: i64, now: i64, offset: FixedOffset) -> String {
    let date = local(timestamp, offset);
    let today = local(now, offset).date_naive();

    let day = if date.date_naive() == today {
        "today".to_owned()
    } else if today.pred_opt() == Some(date.date_naive()) {
        "yesterday".to_owned()
    } else {
        date.format("%A").to_string()
    };
    format!("{day} {}", date.format("%B %-d %Y"))
}

pub fn same_day(a: i64, b: i64, offset: FixedOffset) -> bool {
    local(a, offset).date_naive() == local(b, offset).date_naive()
}

pub fn same_minute(a: i64, b: i64, offset: FixedOffset) -> bool {
    let (a, b) = (local(a, offset), local(b, offset));
    a.date_naive() == b.date_naive()
        && a.hour() == b.hour()
        && a.minute() == b.minute()
        && a.year() == b.year()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use rstest::rstest;

    use super::{format_date, format_time, same_day, same_minute, Timeline};
    use crate::model::{Checkpoint, CheckpointId, CheckpointType};

    // 2026-01-03T15:07:00Z, a Saturday.
    const SAT_1507: i64 = 1_767_452_820_000;
    const HOUR: i64 = 3_600_000;
    const DAY: i64 = 24 * HOUR;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).expect("utc")
    }

    fn checkpoint(id: u32, timestamp: i64, notebook: u32) -> Checkpoint {
        Checkpoint::new(CheckpointId::new(id), CheckpointType::Run, timestamp, notebook, Vec::new())
    }

    #[test]
    fn time_is_twelve_hour_with_suffix() {
        assert_eq!(format_time(SAT_1507, utc()), "3:07pm");
        assert_eq!(format_time(SAT_1507 - 15 * HOUR, utc()), "12:07am");
    }

    #[rstest]
    #[case(SAT_1507, "today January 3 2026")]
    #[case(SAT_1507 + DAY, "yesterday January 3 2026")]
    #[case(SAT_1507 + 3 * DAY, "Saturday January 3 2026")]
    fn date_is_relative_to_now(#[case] now: i64, #[case] expected: &str) {
        assert_eq!(format_date(SAT_1507, now, utc()), expected);
    }

    #[test]
    fn offset_moves_day_boundaries() {
        let late = SAT_1507 + 8 * HOUR + 30 * 60_000; // 23:37 UTC
        assert!(same_day(SAT_1507, late, utc()));

        let plus_one = FixedOffset::east_opt(3600).expect("offset");
        assert!(!same_day(SAT_1507, late, plus_one));
    }

    #[test]
    fn same_minute_ignores_seconds() {
        assert!(same_minute(SAT_1507, SAT_1507 + 59_000, utc()));
        assert!(!same_minute(SAT_1507, SAT_1507 + 60_000, utc()));
    }

    #[test]
    fn events_group_by_day_then_notebook() {
        let events = [
            checkpoint(0, SAT_1507, 0),
            checkpoint(1, SAT_1507 + 60_000, 0),
            checkpoint(2, SAT_1507 + 120_000, 1),
            checkpoint(3, SAT_1507 + DAY, 1),
        ];
        let timeline = Timeline::from_checkpoints(&events, utc());

        let dates = timeline.dates();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].events.len(), 2);
        assert_eq!(dates[0].events[0].events, [CheckpointId::new(0), CheckpointId::new(1)]);
        assert_eq!(dates[0].events[1].notebook, 1);
        assert_eq!(dates[1].date, SAT_1507 + DAY);
        assert_eq!(dates[1].events[0].events, [CheckpointId::new(3)]);
    }
}
