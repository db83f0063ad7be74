//! Database layer.
//!
//! [`Store`] is the document-store interface used by every service. Each
//! `*_atomic` operation reads and writes all documents it touches in one
//! transaction, so the invariants tying bookings to class attendees, reviews
//! to trainer ratings and payment sessions to fulfillment records hold under
//! concurrent requests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    Booking, DashboardStats, FitnessClass, GuardRejection, LedgerEntry, MembershipDelta, Order,
    Product, Review, Trainer, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
    pub const CLASSES: &str = "classes";
    pub const TRAINERS: &str = "trainers";
    pub const BOOKINGS: &str = "bookings";
    /// Active-booking markers keyed by `slot_key(class, user, start)`
    pub const BOOKING_SLOTS: &str = "booking_slots";
    pub const ORDERS: &str = "orders";
    pub const REVIEWS: &str = "reviews";
    /// Idempotency ledger keyed by payment session ID
    pub const FULFILLMENTS: &str = "fulfillments";
}

/// Result of [`Store::create_order_atomic`].
#[derive(Debug, Clone)]
pub enum OrderOutcome {
    Created(Order),
    /// The session already produced a record.
    AlreadyFulfilled(LedgerEntry),
}

/// Result of [`Store::book_seat_atomic`].
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Created(Booking),
    /// The session already produced a record.
    AlreadyFulfilled(LedgerEntry),
    /// The user already holds an active booking for this class and start time.
    AlreadyBooked(Booking),
    ClassFull,
    ClassUnavailable,
    ClassNotFound,
}

/// Result of [`Store::cancel_booking_atomic`].
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled(Booking),
    NotFound,
    NotOwner,
}

/// Result of the review write operations.
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    Saved(Review),
    Deleted(Review),
    /// The user already reviewed this class.
    Duplicate(Review),
    NotFound,
    NotAuthor,
    TrainerNotFound,
}

/// Document store used by the application.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    // ─── Catalog ─────────────────────────────────────────────────

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, AppError>;

    async fn upsert_product(&self, product: &Product) -> Result<(), AppError>;

    async fn list_featured_products(&self) -> Result<Vec<Product>, AppError>;

    async fn get_class(&self, class_id: &str) -> Result<Option<FitnessClass>, AppError>;

    async fn upsert_class(&self, class: &FitnessClass) -> Result<(), AppError>;

    /// Delete a class together with all its bookings and slot markers.
    ///
    /// Returns the number of bookings removed.
    async fn delete_class_cascade(&self, class_id: &str) -> Result<usize, AppError>;

    // ─── Trainers ────────────────────────────────────────────────

    async fn get_trainer(&self, trainer_id: &str) -> Result<Option<Trainer>, AppError>;

    async fn get_trainer_by_user(&self, user_id: &str) -> Result<Option<Trainer>, AppError>;

    async fn upsert_trainer(&self, trainer: &Trainer) -> Result<(), AppError>;

    // ─── Fulfillment ─────────────────────────────────────────────

    /// Look up the ledger entry for a payment session.
    async fn get_ledger_entry(&self, session_id: &str) -> Result<Option<LedgerEntry>, AppError>;

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, AppError>;

    /// Write the order and its ledger entry and clear the buyer's cart.
    async fn create_order_atomic(
        &self,
        order: &Order,
        ledger: &LedgerEntry,
    ) -> Result<OrderOutcome, AppError>;

    // ─── Bookings ────────────────────────────────────────────────

    async fn get_booking(&self, booking_id: &str) -> Result<Option<Booking>, AppError>;

    async fn find_active_booking(
        &self,
        class_id: &str,
        user_id: &str,
        start_time: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError>;

    /// Whether the user holds any booking for the class.
    async fn has_booked(&self, user_id: &str, class_id: &str) -> Result<bool, AppError>;

    /// Claim a seat: ledger check, slot check, capacity guard, then write the
    /// booking, its slot marker, the ledger entry (if any) and the class
    /// attendee set together.
    async fn book_seat_atomic(
        &self,
        booking: &Booking,
        ledger: Option<&LedgerEntry>,
    ) -> Result<BookingOutcome, AppError>;

    /// Delete the caller's booking and its slot marker and release the seat.
    async fn cancel_booking_atomic(
        &self,
        booking_id: &str,
        user_id: &str,
    ) -> Result<CancelOutcome, AppError>;

    // ─── Reviews ─────────────────────────────────────────────────

    async fn get_review(&self, review_id: &str) -> Result<Option<Review>, AppError>;

    /// Store a new review and add its rating to the trainer aggregate.
    async fn create_review_atomic(&self, review: &Review) -> Result<ReviewOutcome, AppError>;

    /// Change the author's rating/text and adjust the trainer aggregate.
    async fn update_review_atomic(
        &self,
        review_id: &str,
        user_id: &str,
        rating: u8,
        text: Option<String>,
    ) -> Result<ReviewOutcome, AppError>;

    /// Delete the author's review and remove its rating from the trainer aggregate.
    async fn delete_review_atomic(
        &self,
        review_id: &str,
        user_id: &str,
    ) -> Result<ReviewOutcome, AppError>;

    // ─── Admin ───────────────────────────────────────────────────

    async fn dashboard_stats(&self) -> Result<DashboardStats, AppError>;
}

// ─── Shared Transaction Logic ────────────────────────────────────

/// What a seat claim should do, given the state read inside the transaction.
pub(crate) enum SeatDecision {
    /// Stop without writing.
    Done(BookingOutcome),
    /// Write the booking, its slot, the ledger entry and this class.
    Write(FitnessClass),
}

/// Decide a seat claim.
///
/// `existing_ledger` is the ledger entry for the booking's session (if the
/// claim is paid), `existing_booking` the booking behind an existing slot
/// marker and `class` the current class document.
pub(crate) fn decide_seat(
    booking: &Booking,
    existing_ledger: Option<LedgerEntry>,
    existing_booking: Option<Booking>,
    class: Option<FitnessClass>,
) -> SeatDecision {
    if let Some(entry) = existing_ledger {
        return SeatDecision::Done(BookingOutcome::AlreadyFulfilled(entry));
    }
    if let Some(existing) = existing_booking.filter(|b| b.is_active()) {
        return SeatDecision::Done(BookingOutcome::AlreadyBooked(existing));
    }
    let Some(mut class) = class else {
        return SeatDecision::Done(BookingOutcome::ClassNotFound);
    };
    match class.apply_membership(MembershipDelta::Join(booking.user_id.clone())) {
        Ok(()) => SeatDecision::Write(class),
        Err(GuardRejection::CapacityExceeded) => SeatDecision::Done(BookingOutcome::ClassFull),
        Err(GuardRejection::Unavailable) => SeatDecision::Done(BookingOutcome::ClassUnavailable),
    }
}

/// Release the seat held by `removed` if it was the user's last active
/// booking of the class. `user_bookings` are all bookings the user holds for
/// that class, including `removed`.
pub(crate) fn release_seat(class: &mut FitnessClass, user_bookings: &[Booking], removed: &Booking) {
    let still_booked = user_bookings
        .iter()
        .any(|b| b.id != removed.id && b.is_active());
    if !still_booked {
        // Leave never fails
        let _ = class.apply_membership(MembershipDelta::Leave(removed.user_id.clone()));
    }
}

/// Ownership check shared by review update and delete.
pub(crate) fn authored_review(
    review: Option<Review>,
    user_id: &str,
) -> Result<Review, ReviewOutcome> {
    match review {
        None => Err(ReviewOutcome::NotFound),
        Some(r) if r.user_id != user_id => Err(ReviewOutcome::NotAuthor),
        Some(r) => Ok(r),
    }
}
