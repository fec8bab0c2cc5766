// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::error::Result;
use crate::history::History;
use crate::model::{NodeKind, NodeName};
use crate::render::sampler::sample_text;

/// One row of the cell panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSummary {
    pub index: usize,
    pub name: NodeName,
    pub label: &'static str,
    pub versions: usize,
    pub sample: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSummaries {
    pub cells: Vec<CellSummary>,
    pub deleted: usize,
}

/// Summaries of the current cells, in notebook order, plus how many cells were deleted.
pub fn cell_summaries(history: &History) -> Result<CellSummaries> {
    let cells = history
        .cell_list()
        .into_iter()
        .enumerate()
        .map(|(index, cell)| -> Result<CellSummary> {
            let name = cell.name();
            let label = match name.kind() {
                NodeKind::Markdown => "markdown",
                _ => "code",
            };
            Ok(CellSummary {
                index,
                name,
                label,
                versions: history.get_versions_for(&name)?.len(),
                sample: sample_text(history, &name)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CellSummaries { cells, deleted: history.deleted_cell_indices().len() })
}
