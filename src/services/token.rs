// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session tokens: HS256 JWTs carrying the internal user ID.
//!
//! Tokens are stateless. Validity depends only on the signature, the expiry
//! and a subject that parses as a user ID; there is no revocation list.

use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session lifetime used by login when nothing else is configured.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (internal user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issues and verifies session tokens with a fixed signing key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(signing_key: &[u8], default_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            default_ttl,
        }
    }

    /// Issue a token for `user_id` that expires `ttl` from now.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(user_id, ttl, Utc::now().timestamp_millis())
    }

    /// Like [`issue`](Self::issue), issued at Unix time `now_ms` (milliseconds).
    ///
    /// `exp` has whole-second resolution. A positive `ttl` rounds the expiry
    /// up so the token stays valid for at least `ttl`; a non-positive one
    /// rounds down so the token is already expired.
    pub fn issue_at(&self, user_id: &str, ttl: Duration, now_ms: i64) -> Result<String, AppError> {
        let expires_ms = now_ms.saturating_add(ttl.num_milliseconds());
        let exp = if ttl > Duration::zero() {
            expires_ms.saturating_add(999).div_euclid(1000)
        } else {
            expires_ms.div_euclid(1000)
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now_ms.div_euclid(1000),
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Issue a token with the configured default lifetime.
    pub fn issue_default(&self, user_id: &str) -> Result<String, AppError> {
        self.issue(user_id, self.default_ttl)
    }

    /// Verify a token and return the user ID it was issued for.
    ///
    /// Returns `None` for a bad signature, an expired token, or a subject
    /// that is not a user ID.
    pub fn verify(&self, token: &str) -> Option<String> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Like [`verify`](Self::verify), evaluated at Unix time `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now`, with no leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| tracing::debug!(error = %e, "Rejected session token"))
            .ok()?
            .claims;

        if claims.exp <= now {
            tracing::debug!(exp = claims.exp, now, "Rejected expired session token");
            return None;
        }

        uuid::Uuid::parse_str(&claims.sub)
            .ok()
            .map(|id| id.to_string())
    }
}
