// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod booking;
pub mod class;
pub mod ledger;
pub mod order;
pub mod product;
pub mod review;
pub mod stats;
pub mod trainer;
pub mod user;

pub use booking::{Booking, BookingSlot, BookingStatus, PaymentStatus};
pub use class::{ClassStatus, FitnessClass, GuardRejection, MembershipDelta, TimeSlot};
pub use ledger::{FulfillmentKind, LedgerEntry};
pub use order::{Order, OrderLine};
pub use product::Product;
pub use review::{is_valid_rating, review_id, Review, MAX_RATING, MIN_RATING};
pub use stats::DashboardStats;
pub use trainer::{RatingDelta, Trainer, TrainerRating};
pub use user::{CartLine, Role, User};
