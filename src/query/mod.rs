// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over a history: search and the cell panel listing.

pub mod cells;
pub mod search;

pub use cells::{cell_summaries, CellSummaries, CellSummary};
pub use search::{search, SearchHit, SearchMode};
