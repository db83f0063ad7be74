// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Class reviews and the trainer rating aggregate.
//!
//! Only users who booked a class may review it, once. Every write applies the
//! matching rating delta to the trainer in the same store transaction.

use crate::db::{ReviewOutcome, Store};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{is_valid_rating, review_id, Review, MAX_RATING, MIN_RATING};
use crate::time_utils::now_rfc3339;
use std::sync::Arc;

pub struct ReviewService {
    db: Arc<dyn Store>,
}

fn check_rating(rating: u8) -> Result<(), AppError> {
    if is_valid_rating(rating) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )))
    }
}

fn into_review(outcome: ReviewOutcome, review_id: &str) -> Result<Review, AppError> {
    match outcome {
        ReviewOutcome::Saved(review) | ReviewOutcome::Deleted(review) => Ok(review),
        ReviewOutcome::Duplicate(_) => Err(AppError::Conflict(
            "You have already reviewed this class".to_string(),
        )),
        ReviewOutcome::NotFound => Err(AppError::NotFound(format!(
            "Review {} not found",
            review_id
        ))),
        ReviewOutcome::NotAuthor => Err(AppError::Forbidden(
            "You can only change your own reviews".to_string(),
        )),
        ReviewOutcome::TrainerNotFound => Err(AppError::NotFound(
            "Trainer for this class not found".to_string(),
        )),
    }
}

impl ReviewService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        class_id: &str,
        rating: u8,
        text: Option<String>,
    ) -> Result<Review, AppError> {
        check_rating(rating)?;
        let class = self
            .db
            .get_class(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))?;

        if !self.db.has_booked(&user.user_id, class_id).await? {
            return Err(AppError::Forbidden(
                "You can only review classes you have booked".to_string(),
            ));
        }

        let review = Review {
            id: review_id(&user.user_id, class_id),
            user_id: user.user_id.clone(),
            class_id: class_id.to_string(),
            trainer_id: class.trainer_id,
            rating,
            text: text.unwrap_or_default(),
            created_at: now_rfc3339(),
        };
        let id = review.id.clone();
        let review = into_review(self.db.create_review_atomic(&review).await?, &id)?;

        tracing::info!(
            review_id = %review.id,
            trainer_id = %review.trainer_id,
            rating,
            "Review created"
        );
        Ok(review)
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        review_id: &str,
        rating: u8,
        text: Option<String>,
    ) -> Result<Review, AppError> {
        check_rating(rating)?;
        let outcome = self
            .db
            .update_review_atomic(review_id, &user.user_id, rating, text)
            .await?;
        let review = into_review(outcome, review_id)?;
        tracing::info!(review_id, rating, "Review updated");
        Ok(review)
    }

    pub async fn delete(&self, user: &AuthUser, review_id: &str) -> Result<(), AppError> {
        let outcome = self
            .db
            .delete_review_atomic(review_id, &user.user_id)
            .await?;
        into_review(outcome, review_id)?;
        tracing::info!(review_id, "Review deleted");
        Ok(())
    }
}
