//! Check-in statistics returned by the stats endpoint.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Statistics computed from a user's check-in records.
///
/// Recomputed on every request from the stored timestamps; nothing here is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckinStats {
    /// Number of records the user has
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_count: u64,
    /// Consecutive days with a check-in, ending today
    pub continuous_days: u32,
    /// Records in the current calendar month
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub this_month: u64,
}
