//! Database layer.
//!
//! `Database` is the storage contract used by the routes. `FirestoreDb` is the
//! production backend; `MemoryDb` keeps everything in process and backs the
//! test suite and local development.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{CheckinRecord, ProfileUpdate, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Users, keyed by URL-encoded openid
    pub const USERS: &str = "users";
    /// Check-in records, keyed by record ID
    pub const CHECKINS: &str = "checkins";
}

/// Storage operations for users and their check-in records.
///
/// Lookups return `Ok(None)` / `Ok(false)` for missing data; errors are
/// reserved for storage failures. Every check-in operation is scoped by
/// `user_id`, and a record owned by another user behaves exactly like a
/// missing one.
#[async_trait]
pub trait Database: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_openid(&self, openid: &str) -> Result<Option<User>, AppError>;

    /// Store a new user. Returns `false` if the openid is already registered.
    async fn create_user(&self, user: &User) -> Result<bool, AppError>;

    /// Overwrite an existing user's stored profile.
    ///
    /// Fails with `NotFound` if the user does not exist; never recreates it.
    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    /// Apply `update` to the stored user, writing only the fields it carries
    /// plus `updated_at`. Concurrent updates to other fields are preserved.
    ///
    /// Returns the stored user afterwards, or `None` if the user does not exist.
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at: &str,
    ) -> Result<Option<User>, AppError>;

    /// Delete a user and every check-in they own.
    ///
    /// Returns `false` if the user did not exist.
    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError>;

    // ─── Check-ins ───────────────────────────────────────────────

    /// Store a new record. Fails with `NotFound` if the owner does not exist,
    /// including when the owner is deleted while the record is being written.
    async fn create_checkin(&self, record: &CheckinRecord) -> Result<(), AppError>;

    /// A page of the user's records, newest first.
    async fn list_checkins(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<CheckinRecord>, AppError>;

    async fn get_checkin(
        &self,
        record_id: &str,
        user_id: &str,
    ) -> Result<Option<CheckinRecord>, AppError>;

    /// Returns `false` if there was no such record owned by `user_id`.
    async fn delete_checkin(&self, record_id: &str, user_id: &str) -> Result<bool, AppError>;

    /// Delete every record the user owns. Returns the number deleted.
    async fn clear_checkins(&self, user_id: &str) -> Result<usize, AppError>;

    /// Timestamps (Unix ms) of all the user's records, in no particular order.
    async fn checkin_timestamps(&self, user_id: &str) -> Result<Vec<i64>, AppError>;

    /// Whether the user has a record with `start_ms <= timestamp <= end_ms`.
    async fn has_checkin_between(
        &self,
        user_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<bool, AppError>;
}
