// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text formats: cell source decomposition and the persisted history document.

pub mod json;
pub mod syntax;

pub use json::{history_from_json, history_schema, history_to_json, HistoryJson};
pub use syntax::{parse_code, SyntaxNode};
