// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Studio booking: class bookings, product orders and payment reconciliation
//! for a fitness studio.
//!
//! This crate provides the backend API. Paid checkouts are turned into
//! exactly one order or booking per payment session, class rosters never
//! exceed capacity, and trainer ratings always equal the mean of their
//! reviews.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{
    BookingService, CatalogService, CheckoutInitiator, ImageStore, Mailer,
    NotificationDispatcher, PaymentGateway, PaymentReconciler, ReviewService, TrainerService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub catalog: CatalogService,
    pub checkout: CheckoutInitiator,
    pub reconciler: PaymentReconciler,
    pub bookings: BookingService,
    pub reviews: ReviewService,
    pub trainers: TrainerService,
}

impl AppState {
    /// Wire the services over the given collaborators.
    pub fn new(
        config: Config,
        db: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(mailer);
        Self {
            catalog: CatalogService::new(db.clone(), config.featured_cache_ttl_secs),
            checkout: CheckoutInitiator::new(
                db.clone(),
                gateway.clone(),
                config.frontend_url.clone(),
            ),
            reconciler: PaymentReconciler::new(db.clone(), gateway, dispatcher.clone()),
            bookings: BookingService::new(db.clone(), dispatcher),
            reviews: ReviewService::new(db.clone()),
            trainers: TrainerService::new(db.clone(), images),
            db,
            config,
        }
    }
}
