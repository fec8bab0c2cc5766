// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The checkpoint log: which notebook event produced which cell deltas.

pub mod cell_map;
pub mod log;
pub mod timeline;

pub use cell_map::cell_map;
pub use log::{CheckpointLog, PendingCheckpoint};
pub use timeline::{format_date, format_time, same_day, same_minute, DateGroup, EventGroup, Timeline};
