// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage backed by concurrent maps.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{CheckinRecord, ProfileUpdate, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::Arc;

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    /// Users by internal ID
    users: Arc<DashMap<String, User>>,
    /// openid -> internal user ID
    openids: Arc<DashMap<String, String>>,
    /// Check-ins by record ID
    checkins: Arc<DashMap<String, CheckinRecord>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn owned_records(&self, user_id: &str) -> Vec<CheckinRecord> {
        self.checkins
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl Database for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn get_user_by_openid(&self, openid: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.openids.get(openid).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.get_user(&user_id).await
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        match self.openids.entry(user.openid.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(true)
            }
        }
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.get_mut(&user.id) {
            Some(mut stored) => {
                // openid is immutable once set
                let openid = stored.openid.clone();
                *stored = user.clone();
                stored.openid = openid;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {} not found", user.id))),
        }
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self.users.get_mut(user_id).map(|mut stored| {
            if update.apply_to(&mut stored) {
                stored.updated_at = Some(updated_at.to_string());
            }
            stored.clone()
        }))
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        // The user goes first: once removed, create_checkin can no longer
        // add records for it, so the sweep below leaves nothing behind.
        let Some((_, user)) = self.users.remove(user_id) else {
            return Ok(false);
        };
        self.openids.remove(&user.openid);
        self.checkins.retain(|_, record| record.user_id != user_id);
        Ok(true)
    }

    async fn create_checkin(&self, record: &CheckinRecord) -> Result<(), AppError> {
        // Hold the owner's entry until the record is stored; delete_user
        // blocks on it.
        let Some(_owner) = self.users.get(&record.user_id) else {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                record.user_id
            )));
        };
        self.checkins.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn list_checkins(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<CheckinRecord>, AppError> {
        let mut records = self.owned_records(user_id);
        records.sort_by_key(|r| (Reverse(r.timestamp), Reverse(r.created_at.clone())));

        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_checkin(
        &self,
        record_id: &str,
        user_id: &str,
    ) -> Result<Option<CheckinRecord>, AppError> {
        Ok(self
            .checkins
            .get(record_id)
            .filter(|record| record.user_id == user_id)
            .map(|record| record.value().clone()))
    }

    async fn delete_checkin(&self, record_id: &str, user_id: &str) -> Result<bool, AppError> {
        Ok(self
            .checkins
            .remove_if(record_id, |_, record| record.user_id == user_id)
            .is_some())
    }

    async fn clear_checkins(&self, user_id: &str) -> Result<usize, AppError> {
        let before = self.checkins.len();
        self.checkins.retain(|_, record| record.user_id != user_id);
        Ok(before.saturating_sub(self.checkins.len()))
    }

    async fn checkin_timestamps(&self, user_id: &str) -> Result<Vec<i64>, AppError> {
        Ok(self
            .checkins
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.timestamp)
            .collect())
    }

    async fn has_checkin_between(
        &self,
        user_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<bool, AppError> {
        Ok(self.checkins.iter().any(|entry| {
            entry.user_id == user_id && entry.timestamp >= start_ms && entry.timestamp <= end_ms
        }))
    }
}
