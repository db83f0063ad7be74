// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and carts
//! - Products and classes (catalog)
//! - Trainers and reviews (with the rating aggregate)
//! - Orders, bookings and the fulfillment ledger
//!
//! Every multi-document invariant is written through `run_transaction`, which
//! reads inside the transaction and retries the whole closure on contention.
//! A retried seat claim therefore re-reads the ledger, slot marker and class
//! and resolves a lost race to "already fulfilled" instead of an error.

use crate::db::{
    authored_review, collections, decide_seat, release_seat, BookingOutcome, CancelOutcome,
    OrderOutcome, ReviewOutcome, SeatDecision, Store,
};
use crate::error::AppError;
use crate::models::booking::slot_key;
use crate::models::order::{from_cents, to_cents};
use crate::models::{
    Booking, BookingSlot, ClassStatus, DashboardStats, FitnessClass, LedgerEntry, Order, Product,
    RatingDelta, Review, Trainer, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::{BackoffError, FirestoreError};
use futures_util::future::try_join5;
use serde::{de::DeserializeOwned, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn count_docs(&self, collection: &str) -> Result<u64, AppError> {
        let docs = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(docs.len() as u64)
    }

    async fn bookings_for_class(&self, class_id: &str) -> Result<Vec<Booking>, AppError> {
        let class_id = class_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(move |q| q.for_all([q.field("class_id").eq(class_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

fn tx_failed(e: FirestoreError) -> AppError {
    AppError::Database(format!("Transaction failed: {}", e))
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    // ─── Catalog Operations ──────────────────────────────────────

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        self.get_doc(collections::PRODUCTS, product_id).await
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), AppError> {
        self.set_doc(collections::PRODUCTS, &product.id, product)
            .await
    }

    async fn list_featured_products(&self) -> Result<Vec<Product>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PRODUCTS)
            .filter(|q| q.for_all([q.field("featured").eq(true)]))
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_class(&self, class_id: &str) -> Result<Option<FitnessClass>, AppError> {
        self.get_doc(collections::CLASSES, class_id).await
    }

    async fn upsert_class(&self, class: &FitnessClass) -> Result<(), AppError> {
        self.set_doc(collections::CLASSES, &class.id, class).await
    }

    /// Cascade delete in three steps.
    ///
    /// The class is first marked cancelled in a transaction, which makes every
    /// concurrent seat claim fail with `ClassUnavailable`. Bookings and slot
    /// markers are then removed in batches and the class document last.
    async fn delete_class_cascade(&self, class_id: &str) -> Result<usize, AppError> {
        let id = class_id.to_string();
        self.get_client()?
            .run_transaction(|db, transaction| {
                let id = id.clone();
                Box::pin(async move {
                    let class: Option<FitnessClass> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CLASSES)
                        .obj()
                        .one(&id)
                        .await?;
                    if let Some(mut class) = class {
                        class.status = ClassStatus::Cancelled;
                        db.fluent()
                            .update()
                            .in_col(collections::CLASSES)
                            .document_id(&id)
                            .object(&class)
                            .add_to_transaction(transaction)?;
                    }
                    Ok::<_, BackoffError<FirestoreError>>(())
                })
            })
            .await
            .map_err(tx_failed)?;

        let bookings = self.bookings_for_class(class_id).await?;
        let count = bookings.len();

        self.batch_delete(&bookings, collections::BOOKING_SLOTS, |b: &Booking| {
            b.slot_key()
        })
        .await?;
        self.batch_delete(&bookings, collections::BOOKINGS, |b: &Booking| b.id.clone())
            .await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CLASSES)
            .document_id(class_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(class_id, bookings = count, "Class deleted with bookings");

        Ok(count)
    }

    // ─── Trainer Operations ──────────────────────────────────────

    async fn get_trainer(&self, trainer_id: &str) -> Result<Option<Trainer>, AppError> {
        self.get_doc(collections::TRAINERS, trainer_id).await
    }

    async fn get_trainer_by_user(&self, user_id: &str) -> Result<Option<Trainer>, AppError> {
        let user_id = user_id.to_string();
        let trainers: Vec<Trainer> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRAINERS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(trainers.into_iter().next())
    }

    async fn upsert_trainer(&self, trainer: &Trainer) -> Result<(), AppError> {
        self.set_doc(collections::TRAINERS, &trainer.id, trainer)
            .await
    }

    // ─── Fulfillment Operations ──────────────────────────────────

    async fn get_ledger_entry(&self, session_id: &str) -> Result<Option<LedgerEntry>, AppError> {
        self.get_doc(collections::FULFILLMENTS, session_id).await
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        self.get_doc(collections::ORDERS, order_id).await
    }

    async fn create_order_atomic(
        &self,
        order: &Order,
        ledger: &LedgerEntry,
    ) -> Result<OrderOutcome, AppError> {
        let order = order.clone();
        let ledger = ledger.clone();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let order = order.clone();
                let ledger = ledger.clone();
                Box::pin(async move {
                    let existing: Option<LedgerEntry> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::FULFILLMENTS)
                        .obj()
                        .one(&ledger.session_id)
                        .await?;
                    if let Some(entry) = existing {
                        return Ok(OrderOutcome::AlreadyFulfilled(entry));
                    }

                    let user: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&order.user_id)
                        .await?;

                    db.fluent()
                        .update()
                        .in_col(collections::ORDERS)
                        .document_id(&order.id)
                        .object(&order)
                        .add_to_transaction(transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::FULFILLMENTS)
                        .document_id(&ledger.session_id)
                        .object(&ledger)
                        .add_to_transaction(transaction)?;
                    if let Some(mut user) = user {
                        user.cart_items.clear();
                        db.fluent()
                            .update()
                            .in_col(collections::USERS)
                            .document_id(&user.id)
                            .object(&user)
                            .add_to_transaction(transaction)?;
                    }

                    Ok::<_, BackoffError<FirestoreError>>(OrderOutcome::Created(order))
                })
            })
            .await
            .map_err(tx_failed)?;

        Ok(outcome)
    }

    // ─── Booking Operations ──────────────────────────────────────

    async fn get_booking(&self, booking_id: &str) -> Result<Option<Booking>, AppError> {
        self.get_doc(collections::BOOKINGS, booking_id).await
    }

    async fn find_active_booking(
        &self,
        class_id: &str,
        user_id: &str,
        start_time: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let slot: Option<BookingSlot> = self
            .get_doc(
                collections::BOOKING_SLOTS,
                &slot_key(class_id, user_id, start_time),
            )
            .await?;
        let Some(slot) = slot else {
            return Ok(None);
        };
        let booking: Option<Booking> = self
            .get_doc(collections::BOOKINGS, &slot.booking_id)
            .await?;
        Ok(booking.filter(|b| b.is_active()))
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([(
                "start_time",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn has_booked(&self, user_id: &str, class_id: &str) -> Result<bool, AppError> {
        let user_id = user_id.to_string();
        let class_id = class_id.to_string();
        let bookings: Vec<Booking> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("class_id").eq(class_id.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(!bookings.is_empty())
    }

    async fn book_seat_atomic(
        &self,
        booking: &Booking,
        ledger: Option<&LedgerEntry>,
    ) -> Result<BookingOutcome, AppError> {
        let booking = booking.clone();
        let ledger = ledger.cloned();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let booking = booking.clone();
                let ledger = ledger.clone();
                Box::pin(async move {
                    // 1. Read everything the decision depends on.
                    //    Reads register the documents for conflict detection.
                    let existing_ledger: Option<LedgerEntry> = match &ledger {
                        Some(entry) => {
                            db.fluent()
                                .select()
                                .by_id_in(collections::FULFILLMENTS)
                                .obj()
                                .one(&entry.session_id)
                                .await?
                        }
                        None => None,
                    };

                    let key = booking.slot_key();
                    let slot: Option<BookingSlot> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::BOOKING_SLOTS)
                        .obj()
                        .one(&key)
                        .await?;
                    let existing_booking: Option<Booking> = match &slot {
                        Some(slot) => {
                            db.fluent()
                                .select()
                                .by_id_in(collections::BOOKINGS)
                                .obj()
                                .one(&slot.booking_id)
                                .await?
                        }
                        None => None,
                    };

                    let class: Option<FitnessClass> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CLASSES)
                        .obj()
                        .one(&booking.class_id)
                        .await?;

                    // 2. Ledger, slot and capacity checks
                    let class = match decide_seat(&booking, existing_ledger, existing_booking, class)
                    {
                        SeatDecision::Done(outcome) => return Ok(outcome),
                        SeatDecision::Write(class) => class,
                    };

                    // 3. Booking, slot marker, ledger entry and attendees commit together
                    db.fluent()
                        .update()
                        .in_col(collections::BOOKINGS)
                        .document_id(&booking.id)
                        .object(&booking)
                        .add_to_transaction(transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::BOOKING_SLOTS)
                        .document_id(&key)
                        .object(&BookingSlot::from(&booking))
                        .add_to_transaction(transaction)?;
                    if let Some(entry) = &ledger {
                        db.fluent()
                            .update()
                            .in_col(collections::FULFILLMENTS)
                            .document_id(&entry.session_id)
                            .object(entry)
                            .add_to_transaction(transaction)?;
                    }
                    db.fluent()
                        .update()
                        .in_col(collections::CLASSES)
                        .document_id(&class.id)
                        .object(&class)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(BookingOutcome::Created(booking))
                })
            })
            .await
            .map_err(tx_failed)?;

        Ok(outcome)
    }

    async fn cancel_booking_atomic(
        &self,
        booking_id: &str,
        user_id: &str,
    ) -> Result<CancelOutcome, AppError> {
        let booking_id = booking_id.to_string();
        let user_id = user_id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let booking_id = booking_id.clone();
                let user_id = user_id.clone();
                Box::pin(async move {
                    let booking: Option<Booking> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::BOOKINGS)
                        .obj()
                        .one(&booking_id)
                        .await?;
                    let booking = match booking {
                        None => return Ok(CancelOutcome::NotFound),
                        Some(b) if b.user_id != user_id => return Ok(CancelOutcome::NotOwner),
                        Some(b) => b,
                    };

                    let class: Option<FitnessClass> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CLASSES)
                        .obj()
                        .one(&booking.class_id)
                        .await?;

                    let owner = booking.user_id.clone();
                    let class_id = booking.class_id.clone();
                    let user_bookings: Vec<Booking> = db
                        .fluent()
                        .select()
                        .from(collections::BOOKINGS)
                        .filter(move |q| {
                            q.for_all([
                                q.field("user_id").eq(owner.clone()),
                                q.field("class_id").eq(class_id.clone()),
                            ])
                        })
                        .obj()
                        .query()
                        .await?;

                    if let Some(mut class) = class {
                        release_seat(&mut class, &user_bookings, &booking);
                        db.fluent()
                            .update()
                            .in_col(collections::CLASSES)
                            .document_id(&class.id)
                            .object(&class)
                            .add_to_transaction(transaction)?;
                    }
                    db.fluent()
                        .delete()
                        .from(collections::BOOKINGS)
                        .document_id(&booking.id)
                        .add_to_transaction(transaction)?;
                    db.fluent()
                        .delete()
                        .from(collections::BOOKING_SLOTS)
                        .document_id(booking.slot_key())
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(CancelOutcome::Cancelled(booking))
                })
            })
            .await
            .map_err(tx_failed)?;

        Ok(outcome)
    }

    // ─── Review Operations ───────────────────────────────────────

    async fn get_review(&self, review_id: &str) -> Result<Option<Review>, AppError> {
        self.get_doc(collections::REVIEWS, review_id).await
    }

    async fn create_review_atomic(&self, review: &Review) -> Result<ReviewOutcome, AppError> {
        let review = review.clone();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let review = review.clone();
                Box::pin(async move {
                    let existing: Option<Review> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::REVIEWS)
                        .obj()
                        .one(&review.id)
                        .await?;
                    if let Some(existing) = existing {
                        return Ok(ReviewOutcome::Duplicate(existing));
                    }

                    let trainer: Option<Trainer> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::TRAINERS)
                        .obj()
                        .one(&review.trainer_id)
                        .await?;
                    let Some(mut trainer) = trainer else {
                        return Ok(ReviewOutcome::TrainerNotFound);
                    };
                    trainer.rating.apply(RatingDelta::Added(review.rating));

                    db.fluent()
                        .update()
                        .in_col(collections::REVIEWS)
                        .document_id(&review.id)
                        .object(&review)
                        .add_to_transaction(transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::TRAINERS)
                        .document_id(&trainer.id)
                        .object(&trainer)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(ReviewOutcome::Saved(review))
                })
            })
            .await
            .map_err(tx_failed)
    }

    async fn update_review_atomic(
        &self,
        review_id: &str,
        user_id: &str,
        rating: u8,
        text: Option<String>,
    ) -> Result<ReviewOutcome, AppError> {
        let review_id = review_id.to_string();
        let user_id = user_id.to_string();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let review_id = review_id.clone();
                let user_id = user_id.clone();
                let text = text.clone();
                Box::pin(async move {
                    let review: Option<Review> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::REVIEWS)
                        .obj()
                        .one(&review_id)
                        .await?;
                    let mut review = match authored_review(review, &user_id) {
                        Ok(r) => r,
                        Err(outcome) => return Ok(outcome),
                    };

                    let trainer: Option<Trainer> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::TRAINERS)
                        .obj()
                        .one(&review.trainer_id)
                        .await?;
                    if let Some(mut trainer) = trainer {
                        trainer.rating.apply(RatingDelta::Changed {
                            from: review.rating,
                            to: rating,
                        });
                        db.fluent()
                            .update()
                            .in_col(collections::TRAINERS)
                            .document_id(&trainer.id)
                            .object(&trainer)
                            .add_to_transaction(transaction)?;
                    }

                    review.rating = rating;
                    if let Some(text) = text {
                        review.text = text;
                    }
                    db.fluent()
                        .update()
                        .in_col(collections::REVIEWS)
                        .document_id(&review.id)
                        .object(&review)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(ReviewOutcome::Saved(review))
                })
            })
            .await
            .map_err(tx_failed)
    }

    async fn delete_review_atomic(
        &self,
        review_id: &str,
        user_id: &str,
    ) -> Result<ReviewOutcome, AppError> {
        let review_id = review_id.to_string();
        let user_id = user_id.to_string();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let review_id = review_id.clone();
                let user_id = user_id.clone();
                Box::pin(async move {
                    let review: Option<Review> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::REVIEWS)
                        .obj()
                        .one(&review_id)
                        .await?;
                    let review = match authored_review(review, &user_id) {
                        Ok(r) => r,
                        Err(outcome) => return Ok(outcome),
                    };

                    let trainer: Option<Trainer> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::TRAINERS)
                        .obj()
                        .one(&review.trainer_id)
                        .await?;
                    if let Some(mut trainer) = trainer {
                        trainer.rating.apply(RatingDelta::Removed(review.rating));
                        db.fluent()
                            .update()
                            .in_col(collections::TRAINERS)
                            .document_id(&trainer.id)
                            .object(&trainer)
                            .add_to_transaction(transaction)?;
                    }
                    db.fluent()
                        .delete()
                        .from(collections::REVIEWS)
                        .document_id(&review.id)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(ReviewOutcome::Deleted(review))
                })
            })
            .await
            .map_err(tx_failed)
    }

    // ─── Admin ───────────────────────────────────────────────────

    async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let orders: Vec<Order> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ORDERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let revenue_cents: i64 = orders.iter().map(|o| to_cents(o.total_amount)).sum();

        let (total_users, total_trainers, total_products, total_classes, total_bookings) =
            try_join5(
                self.count_docs(collections::USERS),
                self.count_docs(collections::TRAINERS),
                self.count_docs(collections::PRODUCTS),
                self.count_docs(collections::CLASSES),
                self.count_docs(collections::BOOKINGS),
            )
            .await?;

        Ok(DashboardStats {
            total_users,
            total_trainers,
            total_products,
            total_classes,
            total_orders: orders.len() as u64,
            total_bookings,
            order_revenue: from_cents(revenue_cents),
        })
    }
}
