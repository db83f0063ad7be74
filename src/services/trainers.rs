// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer-owned classes and trainer profile images.

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{ClassStatus, FitnessClass, Role, TimeSlot, Trainer};
use crate::services::images::{ImageStore, MAX_IMAGE_BYTES};
use crate::time_utils::{now_rfc3339, parse_clock_time};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Folder in the image store holding trainer pictures.
pub const TRAINER_IMAGE_FOLDER: &str = "trainers";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn validate_slot(slot: &TimeSlot) -> Result<(), ValidationError> {
    if !WEEKDAYS.iter().any(|d| d.eq_ignore_ascii_case(slot.day.trim())) {
        return Err(ValidationError::new("day").with_message("must be a weekday name".into()));
    }
    match (
        parse_clock_time(&slot.start_time),
        parse_clock_time(&slot.end_time),
    ) {
        (Some(start), Some(end)) if end > start => Ok(()),
        (Some(_), Some(_)) => Err(ValidationError::new("order")
            .with_message("must end after it starts".into())),
        _ => Err(ValidationError::new("format").with_message("times must be HH:MM".into())),
    }
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("price").with_message("must be zero or more".into()))
    }
}

/// Body of a class creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewClass {
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "is required"))]
    pub class_type: String,
    #[validate(range(min = 1, max = 600, message = "must be 1-600 minutes"))]
    pub duration_minutes: u32,
    #[validate(custom(function = "validate_slot"))]
    pub time_slot: TimeSlot,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub capacity: u32,
    #[validate(custom(function = "validate_price"))]
    pub price: f64,
}

pub struct TrainerService {
    db: Arc<dyn Store>,
    images: Arc<dyn ImageStore>,
}

impl TrainerService {
    pub fn new(db: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        Self { db, images }
    }

    async fn own_profile(&self, user: &AuthUser) -> Result<Trainer, AppError> {
        user.require_role(Role::Trainer)?;
        self.db
            .get_trainer_by_user(&user.user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("A trainer profile is required".to_string()))
    }

    pub async fn create_class(
        &self,
        user: &AuthUser,
        new_class: NewClass,
    ) -> Result<FitnessClass, AppError> {
        new_class.validate()?;
        let trainer = self.own_profile(user).await?;

        let class = FitnessClass {
            id: uuid::Uuid::new_v4().to_string(),
            trainer_id: trainer.id,
            title: new_class.title.trim().to_string(),
            description: new_class.description,
            class_type: new_class.class_type,
            duration_minutes: new_class.duration_minutes,
            time_slot: new_class.time_slot,
            capacity: new_class.capacity,
            price: new_class.price,
            attendees: BTreeSet::new(),
            status: ClassStatus::Available,
            created_at: now_rfc3339(),
        };
        self.db.upsert_class(&class).await?;

        tracing::info!(class_id = %class.id, trainer_id = %class.trainer_id, "Class created");
        Ok(class)
    }

    /// Delete a class and every booking made for it.
    ///
    /// Only the owning trainer or an admin may delete.
    pub async fn delete_class(&self, user: &AuthUser, class_id: &str) -> Result<usize, AppError> {
        let class = self
            .db
            .get_class(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))?;

        if user.role != Role::Admin {
            let trainer = self.own_profile(user).await?;
            if trainer.id != class.trainer_id {
                return Err(AppError::Forbidden(
                    "You can only delete your own classes".to_string(),
                ));
            }
        }

        let removed = self.db.delete_class_cascade(class_id).await?;
        tracing::info!(class_id, bookings_removed = removed, "Class deleted");
        Ok(removed)
    }

    /// Replace the caller's profile picture.
    pub async fn update_profile_image(
        &self,
        user: &AuthUser,
        bytes: Vec<u8>,
    ) -> Result<Trainer, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Image body is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }
        let mut trainer = self.own_profile(user).await?;

        let image = self.images.upload(bytes, TRAINER_IMAGE_FOLDER).await?;
        let previous = trainer.profile_image_id.replace(image.public_id);
        trainer.profile_image = Some(image.url);
        self.db.upsert_trainer(&trainer).await?;

        if let Some(old) = previous {
            if let Err(e) = self.images.delete(&old).await {
                tracing::warn!(public_id = %old, error = %e, "Failed to delete previous trainer image");
            }
        }

        tracing::info!(trainer_id = %trainer.id, "Trainer image updated");
        Ok(trainer)
    }
}
