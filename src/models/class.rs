// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trainer-led class model and the attendee/capacity guard.
//!
//! `attendees` is a denormalized mirror of the users holding at least one
//! active booking for the class. It only changes through
//! [`FitnessClass::apply_membership`], which is always called inside the same
//! store transaction that creates or deletes the booking.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::parse_clock_time;

/// Weekly time slot of a class (`HH:MM`, 24h, UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeSlot {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimeSlot {
    /// Whether `date` falls on this slot's weekday.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.day
            .trim()
            .parse::<Weekday>()
            .is_ok_and(|day| day == date.weekday())
    }

    /// Concrete start/end instants of this slot on `date`.
    ///
    /// Returns `None` if either clock time is malformed or the slot does not
    /// end after it starts.
    pub fn session_window(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_clock_time(&self.start_time)?;
        let end = parse_clock_time(&self.end_time)?;
        if end <= start {
            return None;
        }
        Some((
            date.and_time(start).and_utc(),
            date.and_time(end).and_utc(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    #[default]
    Available,
    Cancelled,
    Completed,
}

/// Stored class record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FitnessClass {
    /// Class ID (also used as document ID)
    pub id: String,
    /// Owning trainer profile
    pub trainer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Discipline (yoga, HIIT, ...)
    #[serde(rename = "type")]
    pub class_type: String,
    pub duration_minutes: u32,
    pub time_slot: TimeSlot,
    /// Maximum number of attendees
    pub capacity: u32,
    /// Price per session; 0 means the class is booked directly without payment
    pub price: f64,
    /// Users with at least one active booking
    #[serde(default)]
    pub attendees: BTreeSet<String>,
    #[serde(default)]
    pub status: ClassStatus,
    pub created_at: String,
}

/// A change to the attendee set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipDelta {
    /// A new active booking is being created for this user.
    Join(String),
    /// The user's last active booking for this class is being removed.
    Leave(String),
}

/// Why the guard refused a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// `|attendees| >= capacity`
    CapacityExceeded,
    /// The class is cancelled or completed.
    Unavailable,
}

impl FitnessClass {
    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }

    pub fn seats_left(&self) -> u32 {
        self.capacity
            .saturating_sub(u32::try_from(self.attendees.len()).unwrap_or(u32::MAX))
    }

    /// Apply a membership change, enforcing `|attendees| <= capacity`.
    ///
    /// A join is refused whenever the roster is already at capacity, even if
    /// the user is on it through another session.
    pub fn apply_membership(&mut self, delta: MembershipDelta) -> Result<(), GuardRejection> {
        match delta {
            MembershipDelta::Join(user_id) => {
                if self.status != ClassStatus::Available {
                    return Err(GuardRejection::Unavailable);
                }
                if self.seats_left() == 0 {
                    return Err(GuardRejection::CapacityExceeded);
                }
                self.attendees.insert(user_id);
                Ok(())
            }
            MembershipDelta::Leave(user_id) => {
                self.attendees.remove(&user_id);
                Ok(())
            }
        }
    }
}
