// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use checkin_service::config::Config;
use checkin_service::db::{Database, FirestoreDb, MemoryDb};
use checkin_service::error::AppError;
use checkin_service::routes::create_router;
use checkin_service::services::{ExternalIdentity, IdentityProvider, TokenService};
use checkin_service::AppState;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity provider that resolves codes without any network traffic.
///
/// - `code-<x>` resolves to openid `openid-<x>`
/// - `union-<x>` resolves to openid `openid-<x>` with unionid `unionid-<x>`
/// - `rejected` fails like a provider error code
/// - anything else fails like an unreachable provider
#[derive(Default)]
pub struct StubIdentity {
    pub calls: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(suffix) = code.strip_prefix("code-") {
            return Ok(ExternalIdentity {
                openid: format!("openid-{}", suffix),
                unionid: None,
            });
        }
        if let Some(suffix) = code.strip_prefix("union-") {
            return Ok(ExternalIdentity {
                openid: format!("openid-{}", suffix),
                unionid: Some(format!("unionid-{}", suffix)),
            });
        }
        if code == "rejected" {
            return Err(AppError::UpstreamRejected(
                "WeChat error 40029: invalid code".to_string(),
            ));
        }
        Err(AppError::ProviderUnreachable("WeChat timed out".to_string()))
    }
}

/// Test app over in-memory storage and the stub identity provider.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: MemoryDb,
    pub identity: Arc<StubIdentity>,
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let db = MemoryDb::new();
    let identity = Arc::new(StubIdentity::default());
    let tokens = TokenService::new(&config.jwt_signing_key, config.token_ttl);

    let state = Arc::new(AppState {
        config,
        db: Arc::new(db.clone()) as Arc<dyn Database>,
        tokens,
        identity: identity.clone(),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        identity,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Send a request with an optional bearer token and JSON body.
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Log in with `code` and return `(token, user JSON)`.
    pub async fn login(&self, code: &str) -> (String, Value) {
        let response = self
            .call(
                "POST",
                "/api/users/login",
                None,
                Some(serde_json::json!({ "code": code })),
            )
            .await;
        assert_eq!(response.status(), 200, "login with {} failed", code);
        let body = body_json(response).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["user"].clone(),
        )
    }

    /// Create a check-in at `timestamp` and return the stored record.
    pub async fn checkin(&self, token: &str, timestamp: i64) -> Value {
        let response = self
            .call(
                "POST",
                "/api/checkin",
                Some(token),
                Some(serde_json::json!({
                    "timestamp": timestamp,
                    "date": "2024-01-01",
                    "time": "08:00:00",
                    "type": "quick",
                })),
            )
            .await;
        assert_eq!(response.status(), 200);
        body_json(response).await
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Current time in Unix milliseconds.
#[allow(dead_code)]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A unique openid suffix for emulator test isolation.
#[allow(dead_code)]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
