// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Product catalog model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A purchasable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Product {
    /// Product ID (also used as document ID)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in major currency units
    pub price: f64,
    pub image_url: Option<String>,
    /// Shown on the landing page
    #[serde(default)]
    pub featured: bool,
}
