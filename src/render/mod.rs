// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only views of versions: plain text, diffs and list samples.
//!
//! Nothing here mutates the history. Render failures in samples degrade to a placeholder so a
//! single broken version never takes down a whole listing.

pub mod diff;
pub mod sampler;
pub mod text;

pub use diff::{diff_previous, diff_text, diff_versions, DiffKind, DiffLine, NodeDiff, Segment};
pub use sampler::{
    name_nodey, sample, sample_text, search_header, version_header, Highlight, VersionSample,
};
pub use text::{output_text, Renderer, TextRenderer};
