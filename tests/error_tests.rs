// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use checkin_service::error::AppError;

mod common;

use common::body_json;

#[test]
fn test_status_and_category_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
        (
            AppError::NotFound("x".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (
            AppError::BadRequest("x".to_string()),
            StatusCode::BAD_REQUEST,
            "bad_request",
        ),
        (
            AppError::UpstreamRejected("x".to_string()),
            StatusCode::BAD_GATEWAY,
            "upstream_rejected",
        ),
        (
            AppError::ProviderUnreachable("x".to_string()),
            StatusCode::BAD_GATEWAY,
            "provider_unreachable",
        ),
        (
            AppError::Config("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "config_error",
        ),
        (
            AppError::Database("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
        ),
        (
            AppError::Internal(anyhow::anyhow!("x")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
        ),
    ];

    for (err, status, category) in cases {
        assert_eq!(err.status(), status, "{:?}", err);
        assert_eq!(err.category(), category, "{:?}", err);
    }
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let response = AppError::NotFound("Check-in record not found".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Check-in record not found");
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let response = AppError::Database("connection reset by peer".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());

    let response = AppError::Internal(anyhow::anyhow!("secret internals")).into_response();
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_auth_errors_challenge_bearer() {
    for err in [AppError::Unauthorized, AppError::InvalidToken] {
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body = body_json(response).await;
        assert!(body.get("details").is_none());
    }
}
