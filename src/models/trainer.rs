// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trainer profile and the review rating aggregate.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Running rating aggregate for a trainer.
///
/// The exact integer sum of all current review ratings is stored next to the
/// count, so `average_rating * total_reviews == rating_sum` holds after every
/// review write instead of drifting through repeated float updates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrainerRating {
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub rating_sum: u32,
}

/// A change to the set of ratings counted by a [`TrainerRating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingDelta {
    Added(u8),
    Removed(u8),
    Changed { from: u8, to: u8 },
}

impl TrainerRating {
    pub fn apply(&mut self, delta: RatingDelta) {
        match delta {
            RatingDelta::Added(rating) => {
                self.total_reviews += 1;
                self.rating_sum += u32::from(rating);
            }
            RatingDelta::Removed(rating) => {
                if self.total_reviews == 0 || self.rating_sum < u32::from(rating) {
                    tracing::warn!(
                        total_reviews = self.total_reviews,
                        rating_sum = self.rating_sum,
                        rating,
                        "Rating aggregate underflow, clamping at zero"
                    );
                }
                self.total_reviews = self.total_reviews.saturating_sub(1);
                self.rating_sum = self.rating_sum.saturating_sub(u32::from(rating));
            }
            RatingDelta::Changed { from, to } => {
                self.rating_sum = self
                    .rating_sum
                    .saturating_sub(u32::from(from))
                    .saturating_add(u32::from(to));
            }
        }

        if self.total_reviews == 0 {
            self.rating_sum = 0;
            self.average_rating = 0.0;
        } else {
            self.average_rating = f64::from(self.rating_sum) / f64::from(self.total_reviews);
        }
    }
}

/// Stored trainer profile in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Trainer {
    /// Trainer ID (also used as document ID)
    pub id: String,
    /// Owning user account
    pub user_id: String,
    pub specialization: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub experience_years: u32,
    pub profile_image: Option<String>,
    /// Image store handle for `profile_image`, needed to delete it
    pub profile_image_id: Option<String>,
    #[serde(default)]
    pub rating: TrainerRating,
}
