//! Class review model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Stored review in Firestore.
///
/// Document ID is `{user_id}_{class_id}`, so a user has at most one review
/// per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub class_id: String,
    pub trainer_id: String,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    pub created_at: String,
}

/// Deterministic review document ID for (user, class).
pub fn review_id(user_id: &str, class_id: &str) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(user_id),
        urlencoding::encode(class_id)
    )
}

pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
