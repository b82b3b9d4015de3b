// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, keyed by openid)
//! - Check-ins (one document per record, keyed by record ID)

use crate::db::{collections, Database};
use crate::error::AppError;
use crate::models::{CheckinRecord, ProfileUpdate, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreQueryDirection, FirestoreWritePrecondition};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

/// Document ID for a user. openids may contain characters Firestore
/// does not allow in IDs, so they are URL-encoded.
fn user_doc_id(openid: &str) -> String {
    urlencoding::encode(openid).into_owned()
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// All records owned by a user.
    async fn query_user_checkins(&self, user_id: &str) -> Result<Vec<CheckinRecord>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::CHECKINS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl Database for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let user_id = user_id.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("id").eq(user_id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn get_user_by_openid(&self, openid: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_doc_id(openid))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        // Insert fails if the document exists, which keeps openids unique.
        let result: Result<User, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(user_doc_id(&user.openid))
            .object(user)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let result: Result<User, FirestoreError> = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_doc_id(&user.openid))
            .object(user)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataNotFoundError(_)) => {
                Err(AppError::NotFound(format!("User {} not found", user.id)))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };
        if !update.apply_to(&mut user) {
            return Ok(Some(user));
        }
        user.updated_at = Some(updated_at.to_string());

        // Only the sent fields are written; the rest of `user` may be stale.
        let mut fields = update.present_fields();
        fields.push("updated_at");

        let result: Result<User, FirestoreError> = self
            .client
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_doc_id(&user.openid))
            .object(&user)
            .execute()
            .await;

        match result {
            Ok(stored) => Ok(Some(stored)),
            Err(FirestoreError::DataNotFoundError(_)) => Ok(None),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        let Some(user) = self.get_user(user_id).await? else {
            return Ok(false);
        };

        // Records first, so a failure never leaves orphaned check-ins behind.
        let records = self.query_user_checkins(user_id).await?;
        let count = records.len();
        self.batch_delete(&records, collections::CHECKINS, |r: &CheckinRecord| {
            r.id.clone()
        })
        .await?;
        tracing::debug!(user_id, count, "Deleted check-ins");

        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_doc_id(&user.openid))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sweep records written while the user document still existed.
        // Anything created later is removed by create_checkin's own re-check.
        let stragglers = self.query_user_checkins(user_id).await?;
        if !stragglers.is_empty() {
            self.batch_delete(&stragglers, collections::CHECKINS, |r: &CheckinRecord| {
                r.id.clone()
            })
            .await?;
            tracing::warn!(user_id, count = stragglers.len(), "Deleted late check-ins");
        }

        tracing::info!(user_id, count, "User data deletion complete");
        Ok(true)
    }

    // ─── Check-in Operations ─────────────────────────────────────

    async fn create_checkin(&self, record: &CheckinRecord) -> Result<(), AppError> {
        // Never write a record for a user that no longer exists.
        if self.get_user(&record.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                record.user_id
            )));
        }

        let _: CheckinRecord = self
            .client
            .fluent()
            .insert()
            .into(collections::CHECKINS)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // The owner may have been deleted after the check above.
        if self.get_user(&record.user_id).await?.is_none() {
            self.client
                .fluent()
                .delete()
                .from(collections::CHECKINS)
                .document_id(&record.id)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            tracing::warn!(
                user_id = %record.user_id,
                record_id = %record.id,
                "Owner deleted during check-in; record removed"
            );
            return Err(AppError::NotFound(format!(
                "User {} not found",
                record.user_id
            )));
        }
        Ok(())
    }

    async fn list_checkins(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<CheckinRecord>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::CHECKINS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("timestamp", FirestoreQueryDirection::Descending)])
            .offset(offset)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_checkin(
        &self,
        record_id: &str,
        user_id: &str,
    ) -> Result<Option<CheckinRecord>, AppError> {
        let record: Option<CheckinRecord> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::CHECKINS)
            .obj()
            .one(record_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(record.filter(|r| r.user_id == user_id))
    }

    async fn delete_checkin(&self, record_id: &str, user_id: &str) -> Result<bool, AppError> {
        if self.get_checkin(record_id, user_id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .fluent()
            .delete()
            .from(collections::CHECKINS)
            .document_id(record_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    async fn clear_checkins(&self, user_id: &str) -> Result<usize, AppError> {
        let records = self.query_user_checkins(user_id).await?;
        let count = records.len();
        self.batch_delete(&records, collections::CHECKINS, |r: &CheckinRecord| {
            r.id.clone()
        })
        .await?;
        Ok(count)
    }

    async fn checkin_timestamps(&self, user_id: &str) -> Result<Vec<i64>, AppError> {
        Ok(self
            .query_user_checkins(user_id)
            .await?
            .into_iter()
            .map(|r| r.timestamp)
            .collect())
    }

    async fn has_checkin_between(
        &self,
        user_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<bool, AppError> {
        let user_id = user_id.to_string();
        let found: Vec<CheckinRecord> = self
            .client
            .fluent()
            .select()
            .from(collections::CHECKINS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("timestamp").greater_than_or_equal(start_ms),
                    q.field("timestamp").less_than_or_equal(end_ms),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(!found.is_empty())
    }
}
