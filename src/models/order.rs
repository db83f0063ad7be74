// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Product order model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A purchased line, with the unit price captured at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Stored order. Created exactly once per payment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Order {
    /// Order ID (also used as document ID)
    pub id: String,
    pub user_id: String,
    pub lines: Vec<OrderLine>,
    /// Amount charged, in major currency units
    pub total_amount: f64,
    /// Payment gateway session that paid for this order
    pub external_session_id: String,
    pub created_at: String,
}

/// Convert a major-unit amount to integer cents.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert integer cents to a major-unit amount.
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Sum of `quantity * unit_price` over all lines, in cents.
pub fn lines_total_cents(lines: &[OrderLine]) -> i64 {
    lines
        .iter()
        .map(|l| to_cents(l.unit_price) * i64::from(l.quantity))
        .sum()
}
