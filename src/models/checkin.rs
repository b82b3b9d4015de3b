// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Check-in record model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Stored check-in record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckinRecord {
    /// Record ID (UUID, also used as document ID)
    pub id: String,
    /// Owning user's internal ID
    pub user_id: String,
    /// Instant of the check-in (Unix milliseconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub timestamp: i64,
    /// Client-formatted date, display only
    pub date: String,
    /// Client-formatted time, display only
    pub time: String,
    /// "quick", "detailed" or a client-defined tag
    #[serde(rename = "type")]
    pub checkin_type: String,
    pub note: Option<String>,
    pub custom_type: Option<String>,
    pub location: Option<String>,
    /// When the record was stored (RFC3339)
    pub created_at: String,
}

/// Check-in creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCheckin {
    #[validate(range(min = 1, message = "timestamp must be positive"))]
    pub timestamp: i64,
    #[validate(length(min = 1, max = 20))]
    pub date: String,
    #[validate(length(min = 1, max = 20))]
    pub time: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 20))]
    pub checkin_type: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub note: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub custom_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

impl CheckinRecord {
    /// Build a record owned by `user_id` from a validated request.
    pub fn new(user_id: &str, new: NewCheckin, now: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            timestamp: new.timestamp,
            date: new.date,
            time: new.time,
            checkin_type: new.checkin_type,
            note: new.note,
            custom_type: new.custom_type,
            location: new.location,
            created_at: now.to_string(),
        }
    }
}
