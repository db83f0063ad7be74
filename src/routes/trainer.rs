// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer routes: class management and profile image.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{FitnessClass, Trainer};
use crate::routes::extract::ValidJson;
use crate::services::images::MAX_IMAGE_BYTES;
use crate::services::trainers::NewClass;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{delete, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trainer/classes", post(create_class))
        .route("/api/trainer/classes/{class_id}", delete(delete_class))
        .route(
            "/api/trainer/profile-image",
            // One extra byte so oversized uploads reach the service check
            put(upload_profile_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1)),
        )
}

async fn create_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<NewClass>,
) -> Result<(StatusCode, Json<FitnessClass>)> {
    let class = state.trainers.create_class(&user, body).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[derive(Serialize)]
pub struct DeleteClassResponse {
    pub bookings_removed: usize,
}

async fn delete_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<String>,
) -> Result<Json<DeleteClassResponse>> {
    let bookings_removed = state.trainers.delete_class(&user, &class_id).await?;
    Ok(Json(DeleteClassResponse { bookings_removed }))
}

/// Replace the trainer's profile image with the raw request body.
async fn upload_profile_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<Trainer>> {
    let trainer = state
        .trainers
        .update_profile_image(&user, body.to_vec())
        .await?;
    Ok(Json(trainer))
}
