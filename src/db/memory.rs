// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! In-process document store.
//!
//! All collections live behind a single async mutex, so every operation,
//! including the compound `*_atomic` ones, runs as if serialized. Used for
//! local development (`STORE_BACKEND=memory`) and the test suite.

use crate::db::{
    authored_review, decide_seat, release_seat, BookingOutcome, CancelOutcome, OrderOutcome,
    ReviewOutcome, SeatDecision, Store,
};
use crate::error::AppError;
use crate::models::booking::slot_key;
use crate::models::{
    Booking, BookingSlot, DashboardStats, FitnessClass, LedgerEntry, Order, Product, RatingDelta,
    Review, Trainer, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    products: HashMap<String, Product>,
    classes: HashMap<String, FitnessClass>,
    trainers: HashMap<String, Trainer>,
    bookings: HashMap<String, Booking>,
    booking_slots: HashMap<String, BookingSlot>,
    orders: HashMap<String, Order>,
    reviews: HashMap<String, Review>,
    fulfillments: HashMap<String, LedgerEntry>,
}

impl Collections {
    fn user_class_bookings(&self, user_id: &str, class_id: &str) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|b| b.user_id == user_id && b.class_id == class_id)
            .cloned()
            .collect()
    }
}

/// In-memory [`Store`] implementation.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders (test inspection).
    pub async fn order_count(&self) -> usize {
        self.inner.lock().await.orders.len()
    }

    /// Number of stored bookings (test inspection).
    pub async fn booking_count(&self) -> usize {
        self.inner.lock().await.bookings.len()
    }

    /// Number of stored reviews (test inspection).
    pub async fn review_count(&self) -> usize {
        self.inner.lock().await.reviews.len()
    }
}

#[async_trait]
impl Store for MemoryDb {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.lock().await.users.get(user_id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    // ─── Catalog ─────────────────────────────────────────────────

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.inner.lock().await.products.get(product_id).cloned())
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .products
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn list_featured_products(&self) -> Result<Vec<Product>, AppError> {
        let tables = self.inner.lock().await;
        let mut featured: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.featured)
            .cloned()
            .collect();
        featured.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(featured)
    }

    async fn get_class(&self, class_id: &str) -> Result<Option<FitnessClass>, AppError> {
        Ok(self.inner.lock().await.classes.get(class_id).cloned())
    }

    async fn upsert_class(&self, class: &FitnessClass) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .classes
            .insert(class.id.clone(), class.clone());
        Ok(())
    }

    async fn delete_class_cascade(&self, class_id: &str) -> Result<usize, AppError> {
        let mut tables = self.inner.lock().await;
        let before = tables.bookings.len();
        tables.bookings.retain(|_, b| b.class_id != class_id);
        tables.booking_slots.retain(|_, s| s.class_id != class_id);
        tables.classes.remove(class_id);
        Ok(before - tables.bookings.len())
    }

    // ─── Trainers ────────────────────────────────────────────────

    async fn get_trainer(&self, trainer_id: &str) -> Result<Option<Trainer>, AppError> {
        Ok(self.inner.lock().await.trainers.get(trainer_id).cloned())
    }

    async fn get_trainer_by_user(&self, user_id: &str) -> Result<Option<Trainer>, AppError> {
        Ok(self
            .inner
            .lock()
            .await
            .trainers
            .values()
            .find(|t| t.user_id == user_id)
            .cloned())
    }

    async fn upsert_trainer(&self, trainer: &Trainer) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .trainers
            .insert(trainer.id.clone(), trainer.clone());
        Ok(())
    }

    // ─── Fulfillment ─────────────────────────────────────────────

    async fn get_ledger_entry(&self, session_id: &str) -> Result<Option<LedgerEntry>, AppError> {
        Ok(self.inner.lock().await.fulfillments.get(session_id).cloned())
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.inner.lock().await.orders.get(order_id).cloned())
    }

    async fn create_order_atomic(
        &self,
        order: &Order,
        ledger: &LedgerEntry,
    ) -> Result<OrderOutcome, AppError> {
        let mut tables = self.inner.lock().await;

        if let Some(entry) = tables.fulfillments.get(&ledger.session_id) {
            return Ok(OrderOutcome::AlreadyFulfilled(entry.clone()));
        }

        tables.orders.insert(order.id.clone(), order.clone());
        tables
            .fulfillments
            .insert(ledger.session_id.clone(), ledger.clone());
        if let Some(user) = tables.users.get_mut(&order.user_id) {
            user.cart_items.clear();
        }

        Ok(OrderOutcome::Created(order.clone()))
    }

    // ─── Bookings ────────────────────────────────────────────────

    async fn get_booking(&self, booking_id: &str) -> Result<Option<Booking>, AppError> {
        Ok(self.inner.lock().await.bookings.get(booking_id).cloned())
    }

    async fn find_active_booking(
        &self,
        class_id: &str,
        user_id: &str,
        start_time: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let tables = self.inner.lock().await;
        Ok(tables
            .booking_slots
            .get(&slot_key(class_id, user_id, start_time))
            .and_then(|slot| tables.bookings.get(&slot.booking_id))
            .filter(|b| b.is_active())
            .cloned())
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        let tables = self.inner.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(bookings)
    }

    async fn has_booked(&self, user_id: &str, class_id: &str) -> Result<bool, AppError> {
        Ok(self
            .inner
            .lock()
            .await
            .bookings
            .values()
            .any(|b| b.user_id == user_id && b.class_id == class_id))
    }

    async fn book_seat_atomic(
        &self,
        booking: &Booking,
        ledger: Option<&LedgerEntry>,
    ) -> Result<BookingOutcome, AppError> {
        let mut tables = self.inner.lock().await;
        let key = booking.slot_key();

        let existing_ledger =
            ledger.and_then(|entry| tables.fulfillments.get(&entry.session_id).cloned());
        let existing_booking = tables
            .booking_slots
            .get(&key)
            .and_then(|slot| tables.bookings.get(&slot.booking_id))
            .cloned();
        let class = tables.classes.get(&booking.class_id).cloned();

        let class = match decide_seat(booking, existing_ledger, existing_booking, class) {
            SeatDecision::Done(outcome) => return Ok(outcome),
            SeatDecision::Write(class) => class,
        };

        tables.bookings.insert(booking.id.clone(), booking.clone());
        tables.booking_slots.insert(key, BookingSlot::from(booking));
        if let Some(entry) = ledger {
            tables
                .fulfillments
                .insert(entry.session_id.clone(), entry.clone());
        }
        tables.classes.insert(class.id.clone(), class);

        Ok(BookingOutcome::Created(booking.clone()))
    }

    async fn cancel_booking_atomic(
        &self,
        booking_id: &str,
        user_id: &str,
    ) -> Result<CancelOutcome, AppError> {
        let mut tables = self.inner.lock().await;

        let booking = match tables.bookings.get(booking_id) {
            None => return Ok(CancelOutcome::NotFound),
            Some(b) if b.user_id != user_id => return Ok(CancelOutcome::NotOwner),
            Some(b) => b.clone(),
        };

        let user_bookings = tables.user_class_bookings(&booking.user_id, &booking.class_id);
        if let Some(class) = tables.classes.get_mut(&booking.class_id) {
            release_seat(class, &user_bookings, &booking);
        }
        tables.bookings.remove(&booking.id);
        tables.booking_slots.remove(&booking.slot_key());

        Ok(CancelOutcome::Cancelled(booking))
    }

    // ─── Reviews ─────────────────────────────────────────────────

    async fn get_review(&self, review_id: &str) -> Result<Option<Review>, AppError> {
        Ok(self.inner.lock().await.reviews.get(review_id).cloned())
    }

    async fn create_review_atomic(&self, review: &Review) -> Result<ReviewOutcome, AppError> {
        let mut tables = self.inner.lock().await;

        if let Some(existing) = tables.reviews.get(&review.id) {
            return Ok(ReviewOutcome::Duplicate(existing.clone()));
        }
        let Some(trainer) = tables.trainers.get_mut(&review.trainer_id) else {
            return Ok(ReviewOutcome::TrainerNotFound);
        };

        trainer.rating.apply(RatingDelta::Added(review.rating));
        tables.reviews.insert(review.id.clone(), review.clone());

        Ok(ReviewOutcome::Saved(review.clone()))
    }

    async fn update_review_atomic(
        &self,
        review_id: &str,
        user_id: &str,
        rating: u8,
        text: Option<String>,
    ) -> Result<ReviewOutcome, AppError> {
        let mut tables = self.inner.lock().await;

        let mut review = match authored_review(tables.reviews.get(review_id).cloned(), user_id) {
            Ok(r) => r,
            Err(outcome) => return Ok(outcome),
        };

        if let Some(trainer) = tables.trainers.get_mut(&review.trainer_id) {
            trainer.rating.apply(RatingDelta::Changed {
                from: review.rating,
                to: rating,
            });
        }
        review.rating = rating;
        if let Some(text) = text {
            review.text = text;
        }
        tables.reviews.insert(review.id.clone(), review.clone());

        Ok(ReviewOutcome::Saved(review))
    }

    async fn delete_review_atomic(
        &self,
        review_id: &str,
        user_id: &str,
    ) -> Result<ReviewOutcome, AppError> {
        let mut tables = self.inner.lock().await;

        let review = match authored_review(tables.reviews.get(review_id).cloned(), user_id) {
            Ok(r) => r,
            Err(outcome) => return Ok(outcome),
        };

        if let Some(trainer) = tables.trainers.get_mut(&review.trainer_id) {
            trainer.rating.apply(RatingDelta::Removed(review.rating));
        }
        tables.reviews.remove(&review.id);

        Ok(ReviewOutcome::Deleted(review))
    }

    // ─── Admin ───────────────────────────────────────────────────

    async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let tables = self.inner.lock().await;
        let revenue_cents: i64 = tables
            .orders
            .values()
            .map(|o| crate::models::order::to_cents(o.total_amount))
            .sum();

        Ok(DashboardStats {
            total_users: tables.users.len() as u64,
            total_trainers: tables.trainers.len() as u64,
            total_products: tables.products.len() as u64,
            total_classes: tables.classes.len() as u64,
            total_orders: tables.orders.len() as u64,
            total_bookings: tables.bookings.len() as u64,
            order_revenue: crate::models::order::from_cents(revenue_cents),
        })
    }
}
