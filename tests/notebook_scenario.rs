// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use nbtrail::checkpoint::timeline::{format_date, EventGroup};
use nbtrail::render::{diff_previous, DiffKind};
use nbtrail::{
    CellInput, ChangeType, CheckpointId, CheckpointType, History, HistoryConfig, HistoryFile,
    NodeKind, NodeName,
};
use serde_json::json;

// Saturday 3 January 2026, 15:07 UTC.
const SAT_1507: i64 = 1_767_452_820_000;
const DAY: i64 = 24 * 60 * 60 * 1000;

fn cell(lineage: u32, version: u32) -> NodeName {
    NodeName::new(NodeKind::CodeCell, lineage, version)
}

fn controlled_clock(start: i64) -> (History, Arc<AtomicI64>) {
    let now = Arc::new(AtomicI64::new(start));
    let clock = Arc::clone(&now);
    let history = History::default().with_clock(move || clock.load(Ordering::SeqCst));
    (history, now)
}

fn result_output(text: &str) -> serde_json::Value {
    json!({"output_type": "execute_result", "execution_count": 1, "data": {"text/plain": text}})
}

#[test]
fn first_run_records_its_output_and_a_rerun_is_same() {
    let (mut history, _) = controlled_clock(SAT_1507);
    history.load(&[CellInput::code("")]).expect("load");

    let empty = history.get(&cell(0, 0)).expect("empty cell");
    assert!(empty.as_code_cell().expect("code cell").content().is_empty());
    assert_eq!(history.text_of(&cell(0, 0)).expect("text"), "");

    let first = history
        .run_cell(0, CellInput::code_with_outputs("1.0", vec![result_output("1.0")]))
        .expect("first run");
    assert_eq!(first.kind(), CheckpointType::Run);
    assert_eq!(history.checkpoints().of_kind(CheckpointType::Run).count(), 1);
    let entry = &first.target_cells()[0];
    assert_eq!(entry.node, cell(0, 1));
    assert_eq!(entry.change_type, ChangeType::Changed);
    assert_eq!(entry.new_output(), [NodeName::parse("out0.0").expect("name")]);

    // the cell was edited in the editor and changed back before running again
    let second = history
        .run_cell(0, CellInput::code_with_outputs("1.0", vec![result_output("1.0")]))
        .expect("second run");
    assert_eq!(history.checkpoints().of_kind(CheckpointType::Run).count(), 2);
    let entry = &second.target_cells()[0];
    assert_eq!(entry.node, cell(0, 1));
    assert_eq!(entry.change_type, ChangeType::Same);
    assert!(entry.new_output().is_empty());
    assert_eq!(second.notebook(), first.notebook());
}

#[test]
fn a_rerun_that_prints_nothing_is_changed() {
    let (mut history, _) = controlled_clock(SAT_1507);
    history.load(&[CellInput::code("print(1)")]).expect("load");
    let first = history
        .run_cell(0, CellInput::code_with_outputs("print(1)", vec![result_output("1")]))
        .expect("first run");

    let silent = history.run_cell(0, CellInput::code("print(1)")).expect("silent run");
    let entry = &silent.target_cells()[0];
    assert_eq!((entry.node, entry.change_type), (cell(0, 2), ChangeType::Changed));
    assert!(entry.new_output().is_empty());
    assert_ne!(silent.notebook(), first.notebook());

    let shown = history.get(&first.target_cells()[0].node).expect("earlier cell");
    assert_eq!(shown.as_code_cell().expect("code cell").output(), [NodeName::parse("out0.0").expect("name")]);
}

#[test]
fn cell_map_covers_every_index_of_a_run() {
    let (mut history, _) = controlled_clock(SAT_1507);
    history
        .load(&[
            CellInput::code("a = 1"),
            CellInput::markdown("notes"),
            CellInput::code("b = 2"),
            CellInput::code("c = 3"),
        ])
        .expect("load");

    let run = history
        .run_cells(&[(0, CellInput::code("a = 10")), (2, CellInput::code("b = 20"))])
        .expect("run");

    let map = history.cell_map(&[&run]).expect("cell map");
    let changes = map.iter().map(|item| item.change_type).collect::<Vec<_>>();
    assert_eq!(changes, [ChangeType::Changed, ChangeType::None, ChangeType::Changed, ChangeType::None]);
    assert_eq!(map[0].node, cell(0, 1));
    assert_eq!(map[2].node, cell(1, 1));
}

#[test]
fn deleted_cells_are_reinserted_at_their_index() {
    let (mut history, _) = controlled_clock(SAT_1507);
    history
        .load(&[CellInput::code("a = 1"), CellInput::code("b = 2"), CellInput::code("c = 3"), CellInput::code("d = 4")])
        .expect("load");

    let deleted = history.delete_cell(2).expect("delete");
    assert_eq!(history.cell_indices().len(), 3);

    let map = history.cell_map(&[&deleted]).expect("cell map");
    let rows = map.iter().map(|item| (item.node, item.change_type)).collect::<Vec<_>>();
    assert_eq!(
        rows,
        [
            (cell(0, 0), ChangeType::None),
            (cell(1, 0), ChangeType::None),
            (cell(2, 0), ChangeType::Removed),
            (cell(3, 0), ChangeType::None),
        ]
    );

    let by_notebook = history.checkpoints().by_notebook(deleted.notebook());
    assert_eq!(by_notebook.iter().map(|checkpoint| checkpoint.id()).collect::<Vec<_>>(), [deleted.id()]);
}

#[test]
fn statements_chain_left_to_right_in_source_order() {
    let (mut history, _) = controlled_clock(SAT_1507);
    history.load(&[CellInput::code("import math\ndef area(r):\n    return math.pi * r ** 2\nprint(area(2))")]).expect("load");

    let store = history.store();
    let statements = store
        .get(&cell(0, 0))
        .expect("cell")
        .as_code_cell()
        .expect("code cell")
        .content()
        .to_vec();
    assert_eq!(statements.len(), 3);

    let first = store.get(&statements[0]).expect("first");
    assert_eq!(first.left(), None);

    let mut walked = vec![statements[0]];
    let mut current = first.right();
    while let Some(name) = current {
        walked.push(name);
        current = store.get(&name).expect("sibling").right();
    }
    assert_eq!(walked, statements);

    let kinds = statements
        .iter()
        .map(|name| store.get(name).expect("statement").as_code().expect("code").kind().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(kinds, ["Import", "FunctionDef", "Expr"]);
    assert_eq!(history.text_of(&statements[1]).expect("text"), "def area(r):\n    return math.pi * r ** 2");
}

#[test]
fn checkpoints_group_by_day_and_notebook_version() {
    let (mut history, now) = controlled_clock(SAT_1507);
    history.load(&[CellInput::code("x = 1")]).expect("load");

    now.store(SAT_1507 + 60_000, Ordering::SeqCst);
    history.run_cell(0, CellInput::code("x = 1")).expect("same run");

    now.store(SAT_1507 + 120_000, Ordering::SeqCst);
    history.run_cell(0, CellInput::code("x = 2")).expect("edit run");

    now.store(SAT_1507 + DAY, Ordering::SeqCst);
    history.save(&[CellInput::code("x = 2")]).expect("save");

    let timeline = history.timeline();
    let dates = timeline.dates();
    assert_eq!(dates.len(), 2);
    assert_eq!(
        dates[0].events,
        [
            EventGroup { notebook: 0, events: vec![CheckpointId::new(0), CheckpointId::new(1)] },
            EventGroup { notebook: 1, events: vec![CheckpointId::new(2)] },
        ]
    );
    assert_eq!(dates[1].events, [EventGroup { notebook: 1, events: vec![CheckpointId::new(3)] }]);

    let offset = history.config().utc_offset();
    assert_eq!(format_date(dates[1].date, SAT_1507 + DAY, offset), "today January 4 2026");
    assert_eq!(format_date(dates[0].date, SAT_1507 + DAY, offset), "yesterday January 3 2026");
}

#[test]
fn persisted_history_diffs_like_the_live_one() {
    let (mut history, _) = controlled_clock(SAT_1507);
    history.load(&[CellInput::code("x = 1\nprint(x)")]).expect("load");
    history.run_cell(0, CellInput::code("x = 2\nprint(x)")).expect("run");

    let dir = std::env::temp_dir().join(format!("nbtrail-scenario-{}", std::process::id()));
    let file = HistoryFile::new(dir.join("history.json"));
    file.save(&history).expect("save");
    let loaded = file.load(HistoryConfig::default()).expect("load");

    let live = diff_previous(&history, &cell(0, 1)).expect("live diff");
    let restored = diff_previous(&loaded, &cell(0, 1)).expect("restored diff");
    assert_eq!(live, restored);
    assert_eq!(live.added(), 1);
    assert_eq!(live.removed(), 1);
    assert_eq!(live.lines.last().map(|line| line.kind), Some(DiffKind::Same));

    let _ = std::fs::remove_dir_all(dir);
}
