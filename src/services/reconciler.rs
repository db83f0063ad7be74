// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment confirmation.
//!
//! Turns a paid gateway session into exactly one order or booking. Each call
//! walks the stages in [`Stage`]:
//!
//! 1. Verifying: fetch the session from the gateway; unpaid stops here
//! 2. Ledger check: a session that already produced a record returns it
//! 3. Guard check (bookings): an existing active booking for the same
//!    user, class and start time is returned as is
//! 4. Persisting: one store transaction writes the record, the ledger entry
//!    and the side effects (cart clear or attendee add)
//! 5. Notifying: the confirmation email is dispatched after commit
//!
//! A concurrent confirmation that loses the race at step 4 sees the winner's
//! ledger entry or slot marker inside its transaction and returns that record.

use crate::db::{BookingOutcome, OrderOutcome, Store};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::order::{from_cents, lines_total_cents, to_cents};
use crate::models::{Booking, FulfillmentKind, LedgerEntry, Order, OrderLine};
use crate::services::checkout::CheckoutMetadata;
use crate::services::notifications::{
    booking_confirmation, order_confirmation, NotificationDispatcher,
};
use crate::services::payment::{PaymentGateway, RetrievedSession};
use crate::time_utils::now_rfc3339;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Reconciliation stages, logged as they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Verifying,
    LedgerCheck,
    GuardCheck,
    Persisting,
    SideEffects,
    Notifying,
    Done,
}

/// What a confirmation resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Confirmation {
    pub kind: FulfillmentKind,
    /// Order or booking ID
    pub record_id: String,
    /// True when the record existed before this call
    pub replayed: bool,
}

/// Result of [`PaymentReconciler::confirm`].
pub struct Reconciled {
    pub confirmation: Confirmation,
    /// Pending confirmation email, present only for newly created records.
    pub notification: Option<JoinHandle<()>>,
}

impl Reconciled {
    fn replayed(kind: FulfillmentKind, record_id: String) -> Self {
        Self {
            confirmation: Confirmation {
                kind,
                record_id,
                replayed: true,
            },
            notification: None,
        }
    }
}

pub struct PaymentReconciler {
    db: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    dispatcher: NotificationDispatcher,
}

struct Trace<'a> {
    session_id: &'a str,
    user_id: &'a str,
}

impl Trace<'_> {
    fn enter(&self, stage: Stage) {
        tracing::debug!(
            stage = ?stage,
            session_id = %self.session_id,
            user_id = %self.user_id,
            "Reconciliation stage"
        );
    }
}

impl PaymentReconciler {
    pub fn new(
        db: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            db,
            gateway,
            dispatcher,
        }
    }

    /// Confirm a payment session.
    ///
    /// `caller` is the authenticated user for client callbacks and `None` for
    /// gateway webhooks. A caller may only confirm their own sessions.
    pub async fn confirm(
        &self,
        caller: Option<&AuthUser>,
        session_id: &str,
    ) -> Result<Reconciled, AppError> {
        let caller_id = caller.map(|c| c.user_id.as_str()).unwrap_or("webhook");
        Trace {
            session_id,
            user_id: caller_id,
        }
        .enter(Stage::Verifying);

        let session = self.gateway.retrieve_session(session_id).await?;
        if !session.is_paid() {
            tracing::info!(session_id, payment_status = ?session.payment_status, "Session not paid");
            return Err(AppError::PaymentIncomplete(session_id.to_string()));
        }

        let metadata = CheckoutMetadata::from_map(&session.metadata)?;
        if let Some(caller) = caller {
            if caller.user_id != metadata.user_id() {
                tracing::warn!(
                    session_id,
                    caller = %caller.user_id,
                    owner = %metadata.user_id(),
                    "Confirmation attempted for another user's session"
                );
                return Err(AppError::Forbidden(
                    "Payment session belongs to another user".to_string(),
                ));
            }
        }

        let owner_id = metadata.user_id().to_string();
        let trace = Trace {
            session_id,
            user_id: &owner_id,
        };

        trace.enter(Stage::LedgerCheck);
        if let Some(entry) = self.db.get_ledger_entry(session_id).await? {
            tracing::info!(
                session_id,
                record_id = %entry.record_id,
                "Session already fulfilled (replay)"
            );
            trace.enter(Stage::Done);
            return Ok(Reconciled::replayed(entry.kind, entry.record_id));
        }

        let result = match metadata {
            CheckoutMetadata::Products { user_id, lines } => {
                self.fulfill_order(&trace, &session, user_id, lines).await?
            }
            CheckoutMetadata::Class {
                user_id,
                class_id,
                session_date,
            } => {
                self.fulfill_booking(&trace, &session, user_id, &class_id, session_date)
                    .await?
            }
        };

        trace.enter(Stage::Done);
        Ok(result)
    }

    async fn fulfill_order(
        &self,
        trace: &Trace<'_>,
        session: &RetrievedSession,
        user_id: String,
        lines: Vec<OrderLine>,
    ) -> Result<Reconciled, AppError> {
        let line_cents = lines_total_cents(&lines);
        let charged_cents = session.amount_total.unwrap_or(line_cents);
        if charged_cents != line_cents {
            tracing::warn!(
                session_id = %session.id,
                charged_cents,
                line_cents,
                "Charged amount differs from line total"
            );
        }

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            lines,
            total_amount: from_cents(charged_cents),
            external_session_id: session.id.clone(),
            created_at: now_rfc3339(),
        };
        let ledger = ledger_entry(&session.id, FulfillmentKind::Order, &order.id, &user_id);

        trace.enter(Stage::Persisting);
        let order = match self.db.create_order_atomic(&order, &ledger).await? {
            OrderOutcome::Created(order) => order,
            OrderOutcome::AlreadyFulfilled(entry) => {
                tracing::info!(
                    session_id = %session.id,
                    record_id = %entry.record_id,
                    "Concurrent confirmation won, returning its order"
                );
                return Ok(Reconciled::replayed(entry.kind, entry.record_id));
            }
        };
        trace.enter(Stage::SideEffects);
        tracing::info!(
            session_id = %session.id,
            order_id = %order.id,
            total = order.total_amount,
            "Order created, cart cleared"
        );

        trace.enter(Stage::Notifying);
        let notification = self
            .recipient(&user_id, session)
            .await
            .map(|to| self.dispatcher.dispatch(order_confirmation(&to, &order)));

        Ok(Reconciled {
            confirmation: Confirmation {
                kind: FulfillmentKind::Order,
                record_id: order.id,
                replayed: false,
            },
            notification,
        })
    }

    async fn fulfill_booking(
        &self,
        trace: &Trace<'_>,
        session: &RetrievedSession,
        user_id: String,
        class_id: &str,
        session_date: NaiveDate,
    ) -> Result<Reconciled, AppError> {
        let class = self
            .db
            .get_class(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))?;
        let booking =
            Booking::for_session(&class, &user_id, session_date, Some(session.id.clone()))
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Class {} has an invalid time slot", class_id))
                })?;

        if let Some(charged) = session.amount_total {
            if charged != to_cents(class.price) {
                tracing::warn!(
                    session_id = %session.id,
                    charged_cents = charged,
                    price_cents = to_cents(class.price),
                    "Charged amount differs from current class price"
                );
            }
        }

        trace.enter(Stage::GuardCheck);
        if let Some(existing) = self
            .db
            .find_active_booking(class_id, &user_id, booking.start_time)
            .await?
        {
            tracing::warn!(
                session_id = %session.id,
                booking_id = %existing.id,
                "Session already booked under another payment"
            );
            return Ok(Reconciled::replayed(FulfillmentKind::Booking, existing.id));
        }

        let ledger = ledger_entry(&session.id, FulfillmentKind::Booking, &booking.id, &user_id);

        trace.enter(Stage::Persisting);
        let booking = claim_seat(self.db.as_ref(), &booking, Some(&ledger))
            .await
            .map_err(|e| {
                if e.is_upstream() {
                    tracing::warn!(session_id = %session.id, error = %e, "Paid booking not stored");
                } else {
                    // Charged with no seat; nothing else records this session
                    tracing::error!(
                        session_id = %session.id,
                        amount_total = ?session.amount_total,
                        class_id,
                        user_id = %user_id,
                        error = %e,
                        "Paid booking rejected, manual refund required"
                    );
                }
                e
            })?;
        let booking = match booking {
            Claimed::New(booking) => booking,
            Claimed::Existing(kind, record_id) => return Ok(Reconciled::replayed(kind, record_id)),
        };
        trace.enter(Stage::SideEffects);
        tracing::info!(
            session_id = %session.id,
            booking_id = %booking.id,
            class_id,
            "Booking created, attendee added"
        );

        trace.enter(Stage::Notifying);
        let notification = self
            .recipient(&user_id, session)
            .await
            .map(|to| {
                self.dispatcher
                    .dispatch(booking_confirmation(&to, &booking, &class))
            });

        Ok(Reconciled {
            confirmation: Confirmation {
                kind: FulfillmentKind::Booking,
                record_id: booking.id,
                replayed: false,
            },
            notification,
        })
    }

    /// Confirmation recipient: the account email, else the checkout email.
    async fn recipient(&self, user_id: &str, session: &RetrievedSession) -> Option<String> {
        let account_email = match self.db.get_user(user_id).await {
            Ok(user) => user.map(|u| u.email),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Could not load user for confirmation email");
                None
            }
        };
        let to = account_email
            .filter(|e| !e.is_empty())
            .or_else(|| session.customer_email.clone());
        if to.is_none() {
            tracing::warn!(user_id, "No email address for confirmation");
        }
        to
    }
}

/// Outcome of a successful seat claim.
pub enum Claimed {
    New(Booking),
    /// The claim resolved to a record that already existed.
    Existing(FulfillmentKind, String),
}

/// Run a seat claim and map refusals to errors.
pub async fn claim_seat(
    db: &dyn Store,
    booking: &Booking,
    ledger: Option<&LedgerEntry>,
) -> Result<Claimed, AppError> {
    match db.book_seat_atomic(booking, ledger).await? {
        BookingOutcome::Created(booking) => Ok(Claimed::New(booking)),
        BookingOutcome::AlreadyFulfilled(entry) => {
            Ok(Claimed::Existing(entry.kind, entry.record_id))
        }
        BookingOutcome::AlreadyBooked(existing) => {
            Ok(Claimed::Existing(FulfillmentKind::Booking, existing.id))
        }
        BookingOutcome::ClassFull => Err(AppError::CapacityExceeded(booking.class_id.clone())),
        BookingOutcome::ClassUnavailable => Err(AppError::BadRequest(format!(
            "Class {} is not open for booking",
            booking.class_id
        ))),
        BookingOutcome::ClassNotFound => Err(AppError::NotFound(format!(
            "Class {} not found",
            booking.class_id
        ))),
    }
}

fn ledger_entry(
    session_id: &str,
    kind: FulfillmentKind,
    record_id: &str,
    user_id: &str,
) -> LedgerEntry {
    LedgerEntry {
        session_id: session_id.to_string(),
        kind,
        record_id: record_id.to_string(),
        user_id: user_id.to_string(),
        created_at: now_rfc3339(),
    }
}
