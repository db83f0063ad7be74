// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bookings;
pub mod catalog;
pub mod checkout;
pub mod images;
pub mod notifications;
pub mod payment;
pub mod reconciler;
pub mod reviews;
pub mod trainers;

pub use bookings::BookingService;
pub use catalog::CatalogService;
pub use checkout::CheckoutInitiator;
pub use images::{CloudinaryStore, DisabledImageStore, ImageStore};
pub use notifications::{LogMailer, Mailer, NotificationDispatcher, SendGridMailer};
pub use payment::{PaymentGateway, StripeGateway};
pub use reconciler::PaymentReconciler;
pub use reviews::ReviewService;
pub use trainers::TrainerService;
