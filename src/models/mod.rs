// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod checkin;
pub mod stats;
pub mod user;

pub use checkin::{CheckinRecord, NewCheckin};
pub use stats::CheckinStats;
pub use user::{ProfileUpdate, User};
