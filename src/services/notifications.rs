// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Confirmation emails.
//!
//! Delivery is best effort. [`NotificationDispatcher::dispatch`] runs the send
//! on its own task after the fulfillment transaction has committed; failures
//! are logged and never reach the caller.

use crate::error::AppError;
use crate::models::{Booking, FitnessClass, Order};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email interface.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

// ─── SendGrid ────────────────────────────────────────────────────

#[derive(Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct SendGridPersonalization<'a> {
    to: Vec<SendGridAddress<'a>>,
}

#[derive(Serialize)]
struct SendGridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: SendGridAddress<'a>,
    subject: &'a str,
    content: Vec<SendGridContent<'a>>,
}

/// Sends mail through the SendGrid v3 API.
pub struct SendGridMailer {
    http: reqwest::Client,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let request = SendGridRequest {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress { email: &message.to }],
            }],
            from: SendGridAddress { email: &self.from },
            subject: &message.subject,
            content: vec![SendGridContent {
                content_type: "text/plain",
                value: &message.body,
            }],
        };

        let response = self
            .http
            .post(SENDGRID_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EmailDelivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmailDelivery(format!(
                "SendGrid returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Mailer used when no email provider is configured. Only logs.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email provider not configured, skipping send"
        );
        Ok(())
    }
}

// ─── Dispatcher ──────────────────────────────────────────────────

/// Fire-and-forget front end for a [`Mailer`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Send on a background task.
    ///
    /// The returned handle only exists so tests can wait for delivery;
    /// request handlers drop it.
    pub fn dispatch(&self, message: EmailMessage) -> JoinHandle<()> {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            match mailer.send(&message).await {
                Ok(()) => tracing::debug!(to = %message.to, "Confirmation email sent"),
                Err(e) => tracing::warn!(
                    to = %message.to,
                    subject = %message.subject,
                    error = %e,
                    "Confirmation email failed"
                ),
            }
        })
    }
}

// ─── Templates ───────────────────────────────────────────────────

pub fn order_confirmation(to: &str, order: &Order) -> EmailMessage {
    let mut body = format!("Thank you for your order!\n\nOrder: {}\n\n", order.id);
    for line in &order.lines {
        body.push_str(&format!(
            "  {} x {} @ {:.2}\n",
            line.quantity, line.name, line.unit_price
        ));
    }
    body.push_str(&format!("\nTotal: {:.2}\n", order.total_amount));

    EmailMessage {
        to: to.to_string(),
        subject: "Your order confirmation".to_string(),
        body,
    }
}

pub fn booking_confirmation(to: &str, booking: &Booking, class: &FitnessClass) -> EmailMessage {
    let body = format!(
        "You're booked!\n\nClass: {}\nDate: {}\nTime: {} - {} UTC\nBooking: {}\n",
        class.title,
        booking.session_date.format("%A, %B %-d, %Y"),
        booking.start_time.format("%H:%M"),
        booking.end_time.format("%H:%M"),
        booking.id,
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Booking confirmed: {}", class.title),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingMailer {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), AppError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AppError::EmailDelivery("smtp down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let mailer = Arc::new(FailingMailer {
            attempts: AtomicUsize::new(0),
        });
        let dispatcher = NotificationDispatcher::new(mailer.clone());

        let handle = dispatcher.dispatch(EmailMessage {
            to: "a@example.com".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        });

        // The task completes normally even though the send failed
        handle.await.unwrap();
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_order_confirmation_lists_lines() {
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            lines: vec![OrderLine {
                product_id: "p1".to_string(),
                name: "Mat".to_string(),
                quantity: 2,
                unit_price: 10.0,
            }],
            total_amount: 20.0,
            external_session_id: "cs_1".to_string(),
            created_at: "2024-06-01T00:00:00Z".to_string(),
        };
        let msg = order_confirmation("a@example.com", &order);
        assert!(msg.body.contains("2 x Mat @ 10.00"));
        assert!(msg.body.contains("Total: 20.00"));
    }
}
