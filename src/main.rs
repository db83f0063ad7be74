// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Studio booking API server
//!
//! Serves the class booking, shop checkout and payment confirmation API for
//! a fitness studio.

use studio_booking::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, Store},
    services::{
        CloudinaryStore, DisabledImageStore, ImageStore, LogMailer, Mailer, SendGridMailer,
        StripeGateway,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "studio_booking=debug,info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting studio booking API");

    let db: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let gateway = Arc::new(StripeGateway::new(config.stripe_secret_key.clone()));

    let mailer: Arc<dyn Mailer> = match &config.sendgrid_api_key {
        Some(key) => Arc::new(SendGridMailer::new(key.clone(), config.email_from.clone())),
        None => {
            tracing::warn!("SENDGRID_API_KEY not set; confirmation emails are only logged");
            Arc::new(LogMailer)
        }
    };

    let images: Arc<dyn ImageStore> = match &config.cloudinary {
        Some(cloudinary) => Arc::new(CloudinaryStore::new(cloudinary.clone())),
        None => {
            tracing::warn!("Cloudinary not configured; image uploads are disabled");
            Arc::new(DisabledImageStore)
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, gateway, mailer, images));

    // Build router
    let app = studio_booking::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
///
/// `RUST_LOG` overrides the default filter.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
