// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Class booking model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::class::FitnessClass;
use crate::time_utils::now_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Upcoming,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

/// Stored booking record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Booking {
    /// Booking ID (also used as document ID)
    pub id: String,
    pub user_id: String,
    pub class_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub session_date: NaiveDate,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_time: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Payment session that paid for this booking (absent for free classes)
    pub external_session_id: Option<String>,
    pub created_at: String,
}

impl Booking {
    /// A new paid booking of `class` on `session_date`.
    ///
    /// Start and end come from the class time slot. Returns `None` if the
    /// slot times are unusable.
    pub fn for_session(
        class: &FitnessClass,
        user_id: &str,
        session_date: NaiveDate,
        external_session_id: Option<String>,
    ) -> Option<Self> {
        let (start_time, end_time) = class.time_slot.session_window(session_date)?;
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            class_id: class.id.clone(),
            session_date,
            start_time,
            end_time,
            status: BookingStatus::Upcoming,
            payment_status: PaymentStatus::Paid,
            external_session_id,
            created_at: now_rfc3339(),
        })
    }

    /// Active bookings occupy a seat and block a second booking of the same session.
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn slot_key(&self) -> String {
        slot_key(&self.class_id, &self.user_id, self.start_time)
    }
}

/// Marker document enforcing one active booking per (class, user, start time).
///
/// Stored in `booking_slots` under [`slot_key`] and deleted together with the
/// booking, so a cancelled session can be booked again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSlot {
    pub booking_id: String,
    pub class_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
}

impl From<&Booking> for BookingSlot {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            class_id: booking.class_id.clone(),
            user_id: booking.user_id.clone(),
            start_time: booking.start_time,
        }
    }
}

/// Document ID for the active-booking marker of (class, user, start time).
pub fn slot_key(class_id: &str, user_id: &str, start_time: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        urlencoding::encode(class_id),
        urlencoding::encode(user_id),
        start_time.timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_key_is_path_safe() {
        let start = DateTime::from_timestamp(1_717_232_400, 0).unwrap();
        let key = slot_key("class/1", "user 2", start);
        assert_eq!(key, "class%2F1_user%202_1717232400");
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_cancelled_booking_is_inactive() {
        let start = DateTime::from_timestamp(1_717_232_400, 0).unwrap();
        let mut booking = Booking {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            class_id: "c1".to_string(),
            session_date: start.date_naive(),
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            status: BookingStatus::Upcoming,
            payment_status: PaymentStatus::Paid,
            external_session_id: None,
            created_at: "2024-05-01T00:00:00Z".to_string(),
        };
        assert!(booking.is_active());
        booking.status = BookingStatus::Cancelled;
        assert!(!booking.is_active());
    }
}
