//! Admin dashboard aggregates.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Studio-wide totals for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardStats {
    // ─── Accounts ────────────────────────────────────────────────
    pub total_users: u64,
    pub total_trainers: u64,

    // ─── Catalog ─────────────────────────────────────────────────
    pub total_products: u64,
    pub total_classes: u64,

    // ─── Sales ───────────────────────────────────────────────────
    pub total_orders: u64,
    pub total_bookings: u64,
    /// Sum of order totals, in major currency units
    pub order_revenue: f64,
}
