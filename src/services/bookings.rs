// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct bookings for free classes, cancellation and listing.

use crate::db::{BookingOutcome, CancelOutcome, Store};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::Booking;
use crate::services::checkout::ensure_class_runs_on;
use crate::services::notifications::{booking_confirmation, NotificationDispatcher};
use crate::time_utils::parse_session_date;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Result of [`BookingService::book_free`].
pub struct DirectBooking {
    pub booking: Booking,
    /// True when the caller already held this session
    pub replayed: bool,
    pub notification: Option<JoinHandle<()>>,
}

pub struct BookingService {
    db: Arc<dyn Store>,
    dispatcher: NotificationDispatcher,
}

impl BookingService {
    pub fn new(db: Arc<dyn Store>, dispatcher: NotificationDispatcher) -> Self {
        Self { db, dispatcher }
    }

    /// Book a session of a free class without going through the gateway.
    pub async fn book_free(
        &self,
        user: &AuthUser,
        class_id: &str,
        session_date: &str,
    ) -> Result<DirectBooking, AppError> {
        let class = self
            .db
            .get_class(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))?;
        if !class.is_free() {
            return Err(AppError::BadRequest(
                "Paid classes must be booked through checkout".to_string(),
            ));
        }
        let date = parse_session_date(session_date).ok_or_else(|| {
            AppError::BadRequest("session_date must be a YYYY-MM-DD date".to_string())
        })?;
        ensure_class_runs_on(&class, date)?;
        let booking = Booking::for_session(&class, &user.user_id, date, None)
            .ok_or_else(|| AppError::BadRequest("Class has an invalid time slot".to_string()))?;

        let booking = match self.db.book_seat_atomic(&booking, None).await? {
            BookingOutcome::Created(booking) => booking,
            BookingOutcome::AlreadyBooked(existing) => {
                tracing::info!(
                    booking_id = %existing.id,
                    user_id = %user.user_id,
                    "Free session already booked"
                );
                return Ok(DirectBooking {
                    booking: existing,
                    replayed: true,
                    notification: None,
                });
            }
            BookingOutcome::ClassFull => return Err(AppError::CapacityExceeded(class.id)),
            BookingOutcome::ClassUnavailable => {
                return Err(AppError::BadRequest(format!(
                    "Class {} is not open for booking",
                    class.id
                )))
            }
            BookingOutcome::ClassNotFound | BookingOutcome::AlreadyFulfilled(_) => {
                return Err(AppError::NotFound(format!("Class {} not found", class.id)))
            }
        };

        tracing::info!(
            booking_id = %booking.id,
            class_id = %class.id,
            user_id = %user.user_id,
            "Free booking created"
        );

        let notification = match self.db.get_user(&user.user_id).await {
            Ok(Some(profile)) if !profile.email.is_empty() => Some(
                self.dispatcher
                    .dispatch(booking_confirmation(&profile.email, &booking, &class)),
            ),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, error = %e, "Could not load user for confirmation email");
                None
            }
        };

        Ok(DirectBooking {
            booking,
            replayed: false,
            notification,
        })
    }

    /// Cancel one of the caller's bookings and release the seat.
    pub async fn cancel(&self, user: &AuthUser, booking_id: &str) -> Result<Booking, AppError> {
        match self
            .db
            .cancel_booking_atomic(booking_id, &user.user_id)
            .await?
        {
            CancelOutcome::Cancelled(booking) => {
                tracing::info!(
                    booking_id,
                    class_id = %booking.class_id,
                    user_id = %user.user_id,
                    "Booking cancelled"
                );
                Ok(booking)
            }
            CancelOutcome::NotFound => Err(AppError::NotFound(format!(
                "Booking {} not found",
                booking_id
            ))),
            CancelOutcome::NotOwner => Err(AppError::Forbidden(
                "You can only cancel your own bookings".to_string(),
            )),
        }
    }

    /// The caller's bookings, soonest first.
    pub async fn list(&self, user: &AuthUser) -> Result<Vec<Booking>, AppError> {
        let mut bookings = self.db.list_bookings_for_user(&user.user_id).await?;
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }
}
