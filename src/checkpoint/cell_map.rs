// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::error::{HistoryError, Result};
use crate::model::{CellRunData, ChangeType, Checkpoint};
use crate::store::NodeStore;

/// Per-index view of what happened to every cell across `checkpoints`.
///
/// Checkpoints are applied in id order regardless of the order given. For each one, cells of
/// the notebook version it produced take the checkpoint's entry when targeted and `n/a`
/// otherwise (without overwriting an earlier entry). Its REMOVED entries are then spliced in at
/// `min(index, len)`, shifting later positions; a removal already spliced is not repeated.
pub fn cell_map(checkpoints: &[&Checkpoint], store: &NodeStore) -> Result<Vec<CellRunData>> {
    let mut ordered = checkpoints.to_vec();
    ordered.sort_by_key(|checkpoint| checkpoint.id());

    let mut map: Vec<Option<CellRunData>> = Vec::new();
    let mut spliced: Vec<&CellRunData> = Vec::new();

    for checkpoint in ordered {
        let notebook = store
            .notebook(checkpoint.notebook())
            .and_then(|node| node.as_notebook())
            .ok_or_else(|| {
                HistoryError::not_found("notebook version", checkpoint.notebook())
            })?;

        for (index, name) in notebook.cells().iter().enumerate() {
            if map.len() <= index {
                map.resize(index + 1, None);
            }
            match checkpoint.target(name) {
                Some(entry) => map[index] = Some(entry.clone()),
                None if map[index].is_none() => {
                    map[index] = Some(CellRunData::new(*name, ChangeType::None));
                }
                None => {}
            }
        }

        for removed in checkpoint
            .target_cells()
            .iter()
            .filter(|item| item.change_type == ChangeType::Removed)
        {
            let seen = spliced
                .iter()
                .any(|prior| prior.node == removed.node && prior.index == removed.index);
            if seen {
                continue;
            }
            let at = removed.index.unwrap_or(map.len()).min(map.len());
            map.insert(at, Some(removed.clone()));
            spliced.push(removed);
        }
    }

    Ok(map.into_iter().flatten().collect())
}
