// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Error taxonomy shared by the store, checkpoint log and codec.

use thiserror::Error;

pub type Result<T, E = HistoryError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Lookup of a node or checkpoint that was never registered.
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    /// A link or version would break lineage ordering/uniqueness. Aborts the open checkpoint.
    #[error("inconsistent lineage at {name}: {reason}")]
    InconsistentLineage { name: String, reason: String },

    /// Persisted history is missing data or references unknown nodes.
    #[error("cannot decode history field {field}: {reason}")]
    Serialization { field: String, reason: String },

    #[error("invalid node name {value:?}: {reason}")]
    InvalidName { value: String, reason: &'static str },

    #[error("invalid search query {query:?}: {reason}")]
    InvalidQuery { query: String, reason: String },
}

impl HistoryError {
    pub fn not_found(what: &'static str, name: impl ToString) -> Self {
        Self::NotFound { what, name: name.to_string() }
    }

    pub fn lineage(name: impl ToString, reason: impl Into<String>) -> Self {
        Self::InconsistentLineage { name: name.to_string(), reason: reason.into() }
    }

    pub fn serialization(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::Serialization { field: field.into(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryError;

    #[test]
    fn display_includes_context() {
        let err = HistoryError::not_found("node", "c0.3");
        assert_eq!(err.to_string(), "node not found: c0.3");

        let err = HistoryError::lineage("c1.0", "left link already set");
        assert_eq!(err.to_string(), "inconsistent lineage at c1.0: left link already set");
    }
}
