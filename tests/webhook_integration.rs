// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for webhook handling.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use studio_booking::db::Store;
use studio_booking::models::Role;
use tower::ServiceExt;

mod common;
use common::{create_test_app, seed_class, seed_trainer, seed_user, TestApp};

const WEBHOOK_SECRET: &str = "whsec_test_secret"; // Matches Config::test_default()

fn signed_request(payload: &serde_json::Value, secret: &str, timestamp: i64) -> Request<Body> {
    let body = payload.to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("content-type", "application/json")
        .header("Stripe-Signature", format!("t={},v1={}", timestamp, signature))
        .body(Body::from(body))
        .unwrap()
}

fn completed_event(session_id: &str) -> serde_json::Value {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": { "id": session_id, "object": "checkout.session" } }
    })
}

async fn setup_paid_booking(app: &TestApp) {
    seed_user(app.db.as_ref(), "u1", Role::Customer).await;
    seed_trainer(app.db.as_ref(), "t1", "coach").await;
    seed_class(app.db.as_ref(), "c1", "t1", 5, 20.0).await;
    app.gateway.paid_session(
        "cs_hook",
        2000,
        &[
            ("kind", "booking"),
            ("user_id", "u1"),
            ("class_id", "c1"),
            ("session_date", "2024-06-01"),
        ],
    );
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::test]
async fn test_completed_session_creates_booking() {
    let app = create_test_app();
    setup_paid_booking(&app).await;

    let response = app
        .router
        .clone()
        .oneshot(signed_request(&completed_event("cs_hook"), WEBHOOK_SECRET, now()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entry = app.db.get_ledger_entry("cs_hook").await.unwrap().unwrap();
    let booking = app.db.get_booking(&entry.record_id).await.unwrap().unwrap();
    assert_eq!(booking.user_id, "u1");
    assert_eq!(booking.external_session_id.as_deref(), Some("cs_hook"));

    // Redelivery is a replay
    let response = app
        .router
        .oneshot(signed_request(&completed_event("cs_hook"), WEBHOOK_SECRET, now()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.db.booking_count().await, 1);
}

#[tokio::test]
async fn test_paid_session_for_full_class_acknowledged_without_booking() {
    let app = create_test_app();
    setup_paid_booking(&app).await;
    let mut class = app.db.get_class("c1").await.unwrap().unwrap();
    class.capacity = 1;
    class.attendees.insert("someone_else".to_string());
    app.db.upsert_class(&class).await.unwrap();

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(signed_request(&completed_event("cs_hook"), WEBHOOK_SECRET, now()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.db.booking_count().await, 0);
    assert!(app.db.get_ledger_entry("cs_hook").await.unwrap().is_none());
    let class = app.db.get_class("c1").await.unwrap().unwrap();
    assert_eq!(class.attendees.len(), 1);
    assert!(!class.attendees.contains("u1"));
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let app = create_test_app();
    setup_paid_booking(&app).await;

    let response = app
        .router
        .oneshot(signed_request(&completed_event("cs_hook"), "whsec_wrong", now()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.db.booking_count().await, 0);
    assert_eq!(app.gateway.retrievals(), 0);
}

#[tokio::test]
async fn test_stale_signature_rejected() {
    let app = create_test_app();
    setup_paid_booking(&app).await;

    let response = app
        .router
        .oneshot(signed_request(
            &completed_event("cs_hook"),
            WEBHOOK_SECRET,
            now() - 3600,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.db.booking_count().await, 0);
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/stripe")
                .header("content-type", "application/json")
                .body(Body::from(completed_event("cs_hook").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unpaid_session_acknowledged_without_record() {
    let app = create_test_app();
    seed_user(app.db.as_ref(), "u1", Role::Customer).await;
    app.gateway.insert_session(studio_booking::services::payment::RetrievedSession {
        id: "cs_async".to_string(),
        payment_status: studio_booking::services::payment::GatewayPaymentStatus::Unpaid,
        amount_total: Some(1000),
        metadata: Default::default(),
        customer_email: None,
    });

    let response = app
        .router
        .oneshot(signed_request(&completed_event("cs_async"), WEBHOOK_SECRET, now()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.db.get_ledger_entry("cs_async").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_event_type_acknowledged() {
    let app = create_test_app();

    let event = json!({
        "id": "evt_2",
        "type": "customer.created",
        "data": { "object": { "id": "cus_1" } }
    });
    let response = app
        .router
        .oneshot(signed_request(&event, WEBHOOK_SECRET, now()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.gateway.retrievals(), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
