// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Idempotency ledger entries.
//!
//! One entry per payment session, stored at `fulfillments/{session_id}` and
//! written in the same transaction as the order or booking it points to.
//! Entries are never deleted, so a replayed session id always resolves to the
//! record it originally produced.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// What a payment session paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentKind {
    Order,
    Booking,
}

impl FulfillmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentKind::Order => "order",
            FulfillmentKind::Booking => "booking",
        }
    }
}

impl std::str::FromStr for FulfillmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(FulfillmentKind::Order),
            "booking" => Ok(FulfillmentKind::Booking),
            other => Err(format!("unknown fulfillment kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Payment gateway session ID (also used as document ID)
    pub session_id: String,
    pub kind: FulfillmentKind,
    /// ID of the order or booking created for this session
    pub record_id: String,
    pub user_id: String,
    pub created_at: String,
}
