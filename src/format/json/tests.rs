// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use super::{history_from_json, history_schema, history_to_json, HistoryJson};
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::history::{CellInput, History};
use crate::model::{ChangeType, NodeKind, NodeName};

#[fixture]
fn history() -> History {
    let mut history = History::default().with_clock(|| 1_767_452_820_000);
    history.load(&[CellInput::code("1.0"), CellInput::markdown("# Notes")]).expect("load");
    history
        .run_cell(0, CellInput::code_with_outputs("1.0", vec![json!({"text": "1.0"})]))
        .expect("run");
    history.delete_cell(1).expect("delete");
    history
}

fn encode(history: &History) -> Value {
    serde_json::to_value(history_to_json(history)).expect("encode")
}

#[rstest]
fn checkpoints_use_the_persisted_shape(history: History) {
    let value = encode(&history);
    assert_eq!(
        value["checkpoints"][1],
        json!({
            "checkpointType": "run",
            "timestamp": 1_767_452_820_000i64,
            "notebook": 1,
            "targetCells": [{"node": "cell0.1", "changeType": "edited", "newOutput": ["out0.0"]}],
        })
    );
    assert_eq!(value["checkpoints"][2]["checkpointType"], "cell deleted");
    assert_eq!(value["checkpoints"][2]["targetCells"][0], json!({"node": "m0.0", "changeType": "removed", "index": 1}));

    let node = |name: &str| {
        value["nodes"]
            .as_array()
            .expect("nodes")
            .iter()
            .find(|node| node["name"] == name)
            .cloned()
            .expect("node")
    };
    let ran = node("cell0.1");
    assert_eq!(ran["nodeType"], "codeCell");
    assert_eq!(ran["output"], json!(["out0.0"]));
    assert_eq!(node("cell0.0")["output"], json!([]));
}

#[rstest]
fn decoding_restores_an_equivalent_history(history: History) {
    let text = serde_json::to_string(&history_to_json(&history)).expect("encode");
    let json: HistoryJson = serde_json::from_str(&text).expect("parse");
    let restored = history_from_json(json, HistoryConfig::default()).expect("decode");

    assert_eq!(history_to_json(&restored), history_to_json(&history));
    assert_eq!(restored.checkpoints().by_notebook(1).len(), 1);
    assert_eq!(restored.deleted_cell_indices(), history.deleted_cell_indices());
    assert_eq!(restored.text_of(&NodeName::new(NodeKind::Code, 0, 0)).expect("text"), "1.0");

    let run = restored.checkpoints().get(crate::model::CheckpointId::new(1)).expect("run");
    assert_eq!(run.target_cells()[0].change_type, ChangeType::Changed);
}

#[rstest]
fn decoded_histories_keep_recording(history: History) {
    let mut restored = history_from_json(history_to_json(&history), HistoryConfig::default()).expect("decode");
    let run = restored.run_cell(0, CellInput::code("2.0")).expect("run");
    assert_eq!(run.id().get(), 3);
    assert_eq!(run.target_cells()[0].node, NodeName::new(NodeKind::CodeCell, 0, 2));
}

#[rstest]
#[case::unknown_target(|json: &mut Value| json["checkpoints"][1]["targetCells"][0]["node"] = json!("cell9.0"), "checkpoints[].targetCells[].node")]
#[case::bad_name(|json: &mut Value| json["checkpoints"][1]["targetCells"][0]["node"] = json!("zz1"), "checkpoints[].targetCells[].node")]
#[case::missing_notebook(|json: &mut Value| json["checkpoints"][1]["notebook"] = json!(7), "checkpoints[].notebook")]
#[case::future_version(|json: &mut Value| json["version"] = json!(99), "version")]
fn inconsistent_documents_are_rejected(
    history: History,
    #[case] corrupt: fn(&mut Value),
    #[case] expected_field: &str,
) {
    let mut value = encode(&history);
    corrupt(&mut value);
    let json: HistoryJson = serde_json::from_value(value).expect("still valid json shape");

    let err = history_from_json(json, HistoryConfig::default()).unwrap_err();
    match err {
        HistoryError::Serialization { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected a serialization error, got {other:?}"),
    }
}

#[test]
fn schema_describes_checkpoints() {
    let schema = serde_json::to_string(&history_schema()).expect("schema");
    assert!(schema.contains("checkpointType"));
    assert!(schema.contains("notebook loaded"));
    assert!(schema.contains("targetCells"));
}
