// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use studio_booking::error::AppError;

#[test]
fn test_is_upstream_matches_collaborator_failures() {
    assert!(AppError::PaymentGateway("timeout".to_string()).is_upstream());
    assert!(AppError::ImageStore("503".to_string()).is_upstream());
    assert!(AppError::EmailDelivery("refused".to_string()).is_upstream());
    assert!(AppError::Database("unavailable".to_string()).is_upstream());
}

#[test]
fn test_is_upstream_no_match() {
    assert!(!AppError::BadRequest("Bad Request".to_string()).is_upstream());
    assert!(!AppError::CapacityExceeded("c1".to_string()).is_upstream());
    assert!(!AppError::PaymentIncomplete("cs_1".to_string()).is_upstream());
    assert!(!AppError::Forbidden("no".to_string()).is_upstream());
}

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
        (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (
            AppError::PaymentIncomplete("cs_1".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            AppError::CapacityExceeded("c1".to_string()),
            StatusCode::CONFLICT,
        ),
        (AppError::Conflict("x".to_string()), StatusCode::CONFLICT),
        (
            AppError::PaymentGateway("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, status) in cases {
        let label = error.to_string();
        assert_eq!(error.into_response().status(), status, "{}", label);
    }
}

#[tokio::test]
async fn test_internal_details_not_leaked() {
    let response = AppError::Database("connection reset by peer 10.0.0.3".to_string())
        .into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "database_error");
    assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
}
