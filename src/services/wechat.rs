// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WeChat mini-program login: exchanges a `wx.login` code for the user's openid.
//!
//! One request per login attempt, bounded by the configured timeout. No
//! caching and no retries.

use crate::config::Config;
use crate::error::AppError;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

/// Stable identity issued by the external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub openid: String,
    pub unionid: Option<String>,
}

/// Resolves a one-time login code into an external identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, AppError>;
}

/// `jscode2session` response body.
///
/// WeChat answers with `text/plain`, so the body is parsed by hand.
#[derive(Debug, Deserialize)]
struct Code2SessionResponse {
    openid: Option<String>,
    unionid: Option<String>,
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
}

/// HTTP client for the WeChat `jscode2session` endpoint.
pub struct WechatClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl WechatClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.wechat_timeout)
            .build()
            .context("failed building WeChat HTTP client")?;

        Ok(Self {
            http,
            base_url: config.wechat_api_url.trim_end_matches('/').to_string(),
            app_id: config.wechat_app_id.clone(),
            app_secret: config.wechat_secret.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for WechatClient {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, AppError> {
        if self.app_id.is_empty() || self.app_secret.is_empty() {
            return Err(AppError::Config(
                "WeChat app credentials are not configured".to_string(),
            ));
        }

        let url = format!("{}/sns/jscode2session", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "request failed" };
                tracing::error!(error = %e, reason, "WeChat code exchange failed");
                AppError::ProviderUnreachable(format!("WeChat {}", reason))
            })?;

        let status = response.status();
        if status.is_server_error() {
            tracing::error!(status = %status, "WeChat returned a server error");
            return Err(AppError::ProviderUnreachable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "WeChat rejected code exchange");
            return Err(AppError::UpstreamRejected(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "Failed reading WeChat response");
            AppError::ProviderUnreachable("WeChat response could not be read".to_string())
        })?;

        parse_code2session(&body)
    }
}

/// Interpret a `jscode2session` body.
fn parse_code2session(body: &str) -> Result<ExternalIdentity, AppError> {
    let parsed: Code2SessionResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "Malformed WeChat response");
        AppError::ProviderUnreachable("WeChat returned a malformed response".to_string())
    })?;

    if let Some(errcode) = parsed.errcode.filter(|&c| c != 0) {
        let errmsg = parsed.errmsg.unwrap_or_else(|| "unknown error".to_string());
        tracing::warn!(errcode, errmsg = %errmsg, "WeChat rejected login code");
        return Err(AppError::UpstreamRejected(format!(
            "WeChat error {}: {}",
            errcode, errmsg
        )));
    }

    match parsed.openid.filter(|id| !id.is_empty()) {
        Some(openid) => Ok(ExternalIdentity {
            openid,
            unionid: parsed.unionid.filter(|id| !id.is_empty()),
        }),
        None => Err(AppError::UpstreamRejected(
            "WeChat response did not include an openid".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success() {
        let identity =
            parse_code2session(r#"{"openid":"o-abc","session_key":"sk","unionid":"u-1"}"#)
                .unwrap();
        assert_eq!(identity.openid, "o-abc");
        assert_eq!(identity.unionid.as_deref(), Some("u-1"));
    }

    #[test]
    fn parse_errcode_zero_is_success() {
        let identity =
            parse_code2session(r#"{"openid":"o-abc","session_key":"sk","errcode":0,"errmsg":"ok"}"#)
                .unwrap();
        assert_eq!(identity.openid, "o-abc");
        assert_eq!(identity.unionid, None);
    }

    #[test]
    fn parse_provider_error_carries_message() {
        let err = parse_code2session(r#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap_err();
        match err {
            AppError::UpstreamRejected(msg) => assert!(msg.contains("invalid code")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parse_missing_openid_is_rejected() {
        let err = parse_code2session(r#"{"session_key":"sk"}"#).unwrap_err();
        assert!(matches!(err, AppError::UpstreamRejected(_)));
    }

    #[test]
    fn parse_garbage_is_unreachable() {
        let err = parse_code2session("<html>busy</html>").unwrap_err();
        assert!(matches!(err, AppError::ProviderUnreachable(_)));
    }
}
