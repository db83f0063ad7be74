// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use studio_booking::config::Config;
use studio_booking::db::{FirestoreDb, MemoryDb, Store};
use studio_booking::error::AppError;
use studio_booking::middleware::auth::create_jwt;
use studio_booking::models::{
    ClassStatus, FitnessClass, Product, Role, TimeSlot, Trainer, TrainerRating, User,
};
use studio_booking::routes::create_router;
use studio_booking::services::images::{ImageStore, StoredImage};
use studio_booking::services::notifications::{EmailMessage, Mailer};
use studio_booking::services::payment::{
    CheckoutRequest, CheckoutSession, GatewayPaymentStatus, PaymentGateway, RetrievedSession,
};
use studio_booking::AppState;

/// Check if emulator is available via environment variable.
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
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─── Mock Collaborators ──────────────────────────────────────────

/// Payment gateway whose sessions are scripted by the test.
///
/// Sessions created through checkout start out unpaid; tests flip them with
/// [`ScriptedGateway::mark_paid`] or insert finished sessions directly.
#[derive(Default)]
pub struct ScriptedGateway {
    sessions: Mutex<HashMap<String, RetrievedSession>>,
    requests: Mutex<Vec<CheckoutRequest>>,
    retrievals: AtomicUsize,
}

impl ScriptedGateway {
    pub fn insert_session(&self, session: RetrievedSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    /// Add a paid session carrying `metadata`.
    pub fn paid_session(&self, id: &str, amount_total: i64, metadata: &[(&str, &str)]) {
        self.insert_session(RetrievedSession {
            id: id.to_string(),
            payment_status: GatewayPaymentStatus::Paid,
            amount_total: Some(amount_total),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            customer_email: Some("checkout@example.com".to_string()),
        });
    }

    pub fn mark_paid(&self, id: &str) {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(id) {
            session.payment_status = GatewayPaymentStatus::Paid;
        }
    }

    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AppError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("cs_test_{}", requests.len());

        let amount_total = request
            .line_items
            .iter()
            .map(|l| l.unit_amount_cents * i64::from(l.quantity))
            .sum();
        self.insert_session(RetrievedSession {
            id: id.clone(),
            payment_status: GatewayPaymentStatus::Unpaid,
            amount_total: Some(amount_total),
            metadata: request.metadata.clone().into_iter().collect(),
            customer_email: request.customer_email.clone(),
        });

        Ok(CheckoutSession {
            url: format!("https://checkout.test/{}", id),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<RetrievedSession, AppError> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Payment session {} not found", session_id)))
    }
}

/// Mailer that keeps every message, optionally failing each send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(AppError::EmailDelivery("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

/// Image store that hands out sequential public IDs.
#[derive(Default)]
pub struct MockImageStore {
    uploads: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl MockImageStore {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(&self, _bytes: Vec<u8>, folder: &str) -> Result<StoredImage, AppError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StoredImage {
            url: format!("https://images.test/{}/img{}.png", folder, n),
            public_id: format!("{}/img{}", folder, n),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

// ─── Test App ────────────────────────────────────────────────────

pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub gateway: Arc<ScriptedGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub images: Arc<MockImageStore>,
}

/// Create a test app over an in-memory store and mock collaborators.
pub fn create_test_app() -> TestApp {
    build_app(Config::test_default(), RecordingMailer::default())
}

pub fn create_test_app_with_frontend_url(frontend_url: &str) -> TestApp {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    build_app(config, RecordingMailer::default())
}

pub fn create_test_app_with_mailer(mailer: RecordingMailer) -> TestApp {
    build_app(Config::test_default(), mailer)
}

fn build_app(config: Config, mailer: RecordingMailer) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let gateway = Arc::new(ScriptedGateway::default());
    let mailer = Arc::new(mailer);
    let images = Arc::new(MockImageStore::default());

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        gateway.clone(),
        mailer.clone(),
        images.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        gateway,
        mailer,
        images,
    }
}

/// Signed bearer token for `user_id`.
pub fn create_test_jwt(user_id: &str, role: Role) -> String {
    let config = Config::test_default();
    create_jwt(user_id, role, &config.jwt_signing_key).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── Fixtures ────────────────────────────────────────────────────

pub async fn seed_user(db: &dyn Store, id: &str, role: Role) -> User {
    let user = User {
        id: id.to_string(),
        username: id.to_string(),
        email: format!("{}@example.com", id),
        role,
        cart_items: vec![],
        profile_image: None,
        has_trainer_profile: role == Role::Trainer,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };
    db.upsert_user(&user).await.unwrap();
    user
}

pub async fn seed_product(db: &dyn Store, id: &str, price: f64) -> Product {
    let product = Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        description: String::new(),
        price,
        image_url: None,
        featured: true,
    };
    db.upsert_product(&product).await.unwrap();
    product
}

pub async fn seed_trainer(db: &dyn Store, id: &str, user_id: &str) -> Trainer {
    let trainer = Trainer {
        id: id.to_string(),
        user_id: user_id.to_string(),
        specialization: "Yoga".to_string(),
        bio: String::new(),
        certifications: vec![],
        experience_years: 5,
        profile_image: None,
        profile_image_id: None,
        rating: TrainerRating::default(),
    };
    db.upsert_trainer(&trainer).await.unwrap();
    trainer
}

/// A Saturday 09:00-10:00 class.
pub fn class_fixture(id: &str, trainer_id: &str, capacity: u32, price: f64) -> FitnessClass {
    FitnessClass {
        id: id.to_string(),
        trainer_id: trainer_id.to_string(),
        title: format!("Class {}", id),
        description: String::new(),
        class_type: "yoga".to_string(),
        duration_minutes: 60,
        time_slot: TimeSlot {
            day: "Saturday".to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
        },
        capacity,
        price,
        attendees: BTreeSet::new(),
        status: ClassStatus::Available,
        created_at: "2024-05-01T00:00:00Z".to_string(),
    }
}

pub async fn seed_class(
    db: &dyn Store,
    id: &str,
    trainer_id: &str,
    capacity: u32,
    price: f64,
) -> FitnessClass {
    let class = class_fixture(id, trainer_id, capacity, price);
    db.upsert_class(&class).await.unwrap();
    class
}
