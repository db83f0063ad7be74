// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout session initiation.
//!
//! Nothing is persisted here. Everything needed to create the order or
//! booking later is written into the session metadata, which only the server
//! authors and the gateway echoes back on retrieval. Prices are taken from the
//! catalog at this point, never from the request.

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::order::{from_cents, to_cents};
use crate::models::{FitnessClass, FulfillmentKind, OrderLine};
use crate::services::payment::{
    CheckoutLineItem, CheckoutRequest, CheckoutSession, PaymentGateway,
};
use crate::time_utils::parse_session_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// ─── Metadata Codec ──────────────────────────────────────────────

const KEY_KIND: &str = "kind";
const KEY_USER: &str = "user_id";
const KEY_CLASS: &str = "class_id";
const KEY_DATE: &str = "session_date";
const LINES_PREFIX: &str = "lines_";

/// Gateway limit on the length of one metadata value.
const MAX_VALUE_CHARS: usize = 500;
/// Keep well below the gateway's 50-key limit.
const MAX_LINE_CHUNKS: usize = 40;

/// Compact line encoding to stay within metadata limits.
#[derive(Serialize, Deserialize)]
struct MetaLine {
    #[serde(rename = "p")]
    product_id: String,
    #[serde(rename = "n")]
    name: String,
    #[serde(rename = "q")]
    quantity: u32,
    /// Unit price in cents
    #[serde(rename = "u")]
    unit_cents: i64,
}

/// Purchase description carried through the payment gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutMetadata {
    Products {
        user_id: String,
        lines: Vec<OrderLine>,
    },
    Class {
        user_id: String,
        class_id: String,
        session_date: NaiveDate,
    },
}

impl CheckoutMetadata {
    pub fn user_id(&self) -> &str {
        match self {
            CheckoutMetadata::Products { user_id, .. } => user_id,
            CheckoutMetadata::Class { user_id, .. } => user_id,
        }
    }

    pub fn kind(&self) -> FulfillmentKind {
        match self {
            CheckoutMetadata::Products { .. } => FulfillmentKind::Order,
            CheckoutMetadata::Class { .. } => FulfillmentKind::Booking,
        }
    }

    pub fn to_map(&self) -> Result<BTreeMap<String, String>, AppError> {
        let mut map = BTreeMap::new();
        map.insert(KEY_KIND.to_string(), self.kind().as_str().to_string());
        map.insert(KEY_USER.to_string(), self.user_id().to_string());

        match self {
            CheckoutMetadata::Products { lines, .. } => {
                let compact: Vec<MetaLine> = lines
                    .iter()
                    .map(|l| MetaLine {
                        product_id: l.product_id.clone(),
                        name: l.name.clone(),
                        quantity: l.quantity,
                        unit_cents: to_cents(l.unit_price),
                    })
                    .collect();
                let json = serde_json::to_string(&compact)
                    .map_err(|e| AppError::Internal(e.into()))?;

                let chars: Vec<char> = json.chars().collect();
                let chunks: Vec<String> = chars
                    .chunks(MAX_VALUE_CHARS)
                    .map(|c| c.iter().collect())
                    .collect();
                if chunks.len() > MAX_LINE_CHUNKS {
                    return Err(AppError::BadRequest(
                        "Cart is too large for a single checkout".to_string(),
                    ));
                }
                for (i, chunk) in chunks.into_iter().enumerate() {
                    map.insert(format!("{}{}", LINES_PREFIX, i), chunk);
                }
            }
            CheckoutMetadata::Class {
                class_id,
                session_date,
                ..
            } => {
                map.insert(KEY_CLASS.to_string(), class_id.clone());
                map.insert(
                    KEY_DATE.to_string(),
                    session_date.format("%Y-%m-%d").to_string(),
                );
            }
        }

        Ok(map)
    }

    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, AppError> {
        let malformed = |what: &str| {
            AppError::BadRequest(format!("Payment session metadata is missing {}", what))
        };

        let user_id = map.get(KEY_USER).ok_or_else(|| malformed(KEY_USER))?.clone();
        let kind: FulfillmentKind = map
            .get(KEY_KIND)
            .ok_or_else(|| malformed(KEY_KIND))?
            .parse()
            .map_err(AppError::BadRequest)?;

        match kind {
            FulfillmentKind::Order => {
                let mut json = String::new();
                for i in 0.. {
                    match map.get(&format!("{}{}", LINES_PREFIX, i)) {
                        Some(chunk) => json.push_str(chunk),
                        None => break,
                    }
                }
                if json.is_empty() {
                    return Err(malformed("line items"));
                }
                let compact: Vec<MetaLine> =
                    serde_json::from_str(&json).map_err(|_| malformed("valid line items"))?;
                let lines = compact
                    .into_iter()
                    .map(|l| OrderLine {
                        product_id: l.product_id,
                        name: l.name,
                        quantity: l.quantity,
                        unit_price: from_cents(l.unit_cents),
                    })
                    .collect();
                Ok(CheckoutMetadata::Products { user_id, lines })
            }
            FulfillmentKind::Booking => {
                let class_id = map.get(KEY_CLASS).ok_or_else(|| malformed(KEY_CLASS))?.clone();
                let session_date = map
                    .get(KEY_DATE)
                    .and_then(|d| parse_session_date(d))
                    .ok_or_else(|| malformed(KEY_DATE))?;
                Ok(CheckoutMetadata::Class {
                    user_id,
                    class_id,
                    session_date,
                })
            }
        }
    }
}

// ─── Initiator ───────────────────────────────────────────────────

/// Builds gateway checkout sessions from a cart or a class selection.
pub struct CheckoutInitiator {
    db: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    frontend_url: String,
}

impl CheckoutInitiator {
    pub fn new(db: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>, frontend_url: String) -> Self {
        Self {
            db,
            gateway,
            frontend_url,
        }
    }

    fn success_url(&self) -> String {
        format!(
            "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url
        )
    }

    /// Start checkout for everything in the caller's cart.
    pub async fn start_product_checkout(
        &self,
        user: &AuthUser,
    ) -> Result<CheckoutSession, AppError> {
        let profile = self
            .db
            .get_user(&user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

        if profile.cart_items.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".to_string()));
        }

        let mut lines = Vec::with_capacity(profile.cart_items.len());
        for item in &profile.cart_items {
            let product = self.db.get_product(&item.product_id).await?.ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Product {} is no longer available",
                    item.product_id
                ))
            })?;
            lines.push(OrderLine {
                product_id: product.id,
                name: product.name,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let line_items = lines
            .iter()
            .map(|l| CheckoutLineItem {
                name: l.name.clone(),
                unit_amount_cents: to_cents(l.unit_price),
                quantity: l.quantity,
            })
            .collect();
        let metadata = CheckoutMetadata::Products {
            user_id: user.user_id.clone(),
            lines,
        };

        let session = self
            .gateway
            .create_checkout_session(&CheckoutRequest {
                line_items,
                success_url: self.success_url(),
                cancel_url: format!("{}/cart", self.frontend_url),
                customer_email: Some(profile.email),
                metadata: metadata.to_map()?,
            })
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.id,
            "Product checkout started"
        );
        Ok(session)
    }

    /// Start checkout for one session of a paid class.
    pub async fn start_class_checkout(
        &self,
        user: &AuthUser,
        class_id: &str,
        session_date: &str,
    ) -> Result<CheckoutSession, AppError> {
        let class = self
            .db
            .get_class(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))?;
        let session_date = parse_session_date(session_date).ok_or_else(|| {
            AppError::BadRequest("session_date must be a YYYY-MM-DD date".to_string())
        })?;

        if class.is_free() {
            return Err(AppError::BadRequest(
                "Free classes are booked directly".to_string(),
            ));
        }
        check_bookable(self.db.as_ref(), &class, &user.user_id, session_date).await?;

        let profile = self.db.get_user(&user.user_id).await?;
        let metadata = CheckoutMetadata::Class {
            user_id: user.user_id.clone(),
            class_id: class.id.clone(),
            session_date,
        };

        let session = self
            .gateway
            .create_checkout_session(&CheckoutRequest {
                line_items: vec![CheckoutLineItem {
                    name: format!("{} ({})", class.title, session_date.format("%Y-%m-%d")),
                    unit_amount_cents: to_cents(class.price),
                    quantity: 1,
                }],
                success_url: self.success_url(),
                cancel_url: format!("{}/classes/{}", self.frontend_url, class.id),
                customer_email: profile.map(|p| p.email),
                metadata: metadata.to_map()?,
            })
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            class_id = %class.id,
            session_id = %session.id,
            "Class checkout started"
        );
        Ok(session)
    }
}

/// Reject a session date that falls on a different weekday than the class.
pub fn ensure_class_runs_on(
    class: &FitnessClass,
    session_date: NaiveDate,
) -> Result<(), AppError> {
    if class.time_slot.runs_on(session_date) {
        return Ok(());
    }
    Err(AppError::BadRequest(format!(
        "Class {} runs on {}; {} is a {}",
        class.id,
        class.time_slot.day.trim(),
        session_date.format("%Y-%m-%d"),
        session_date.format("%A")
    )))
}

/// Pre-payment checks for booking `class` on `session_date`.
///
/// Advisory only: the authoritative checks run again inside the booking
/// transaction.
pub async fn check_bookable(
    db: &dyn Store,
    class: &FitnessClass,
    user_id: &str,
    session_date: NaiveDate,
) -> Result<(), AppError> {
    ensure_class_runs_on(class, session_date)?;
    let (start_time, _) = class
        .time_slot
        .session_window(session_date)
        .ok_or_else(|| AppError::BadRequest("Class has an invalid time slot".to_string()))?;

    if db
        .find_active_booking(&class.id, user_id, start_time)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "You have already booked this session".to_string(),
        ));
    }
    if class.status != crate::models::ClassStatus::Available {
        return Err(AppError::BadRequest(format!(
            "Class {} is not open for booking",
            class.id
        )));
    }
    if class.seats_left() == 0 {
        return Err(AppError::CapacityExceeded(class.id.clone()));
    }
    Ok(())
}
