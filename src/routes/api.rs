// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Booking, CartLine, Review, Role};
use crate::routes::extract::ValidJson;
use crate::services::reconciler::Confirmation;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/cart", get(get_cart))
        .route("/api/cart/items", post(add_cart_item))
        .route("/api/cart/items/{product_id}", delete(remove_cart_item))
        .route("/api/checkout/products", post(checkout_products))
        .route("/api/checkout/classes", post(checkout_class))
        .route("/api/checkout/confirm", post(confirm_checkout))
        .route("/api/classes/{class_id}/book", post(book_free_class))
        .route("/api/bookings", get(list_bookings))
        .route("/api/bookings/{booking_id}", delete(cancel_booking))
        .route("/api/reviews", post(create_review))
        .route("/api/reviews/{review_id}", put(update_review).delete(delete_review))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub has_trainer_profile: bool,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse {
        id: profile.id,
        username: profile.username,
        email: profile.email,
        role: user.role,
        profile_image: profile.profile_image,
        has_trainer_profile: profile.has_trainer_profile,
    }))
}

// ─── Cart ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
}

#[derive(Deserialize, Validate)]
pub struct AddCartItemRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub product_id: String,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 99, message = "must be between 1 and 99"))]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CartResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    Ok(Json(CartResponse {
        items: profile.cart_items,
    }))
}

/// Add a product to the cart, merging with an existing line.
async fn add_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<AddCartItemRequest>,
) -> Result<Json<CartResponse>> {
    if state.db.get_product(&body.product_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Product {} not found",
            body.product_id
        )));
    }

    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    profile.add_to_cart(&body.product_id, body.quantity);
    state.db.upsert_user(&profile).await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %body.product_id,
        quantity = body.quantity,
        "Cart item added"
    );
    Ok(Json(CartResponse {
        items: profile.cart_items,
    }))
}

async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    if !profile.remove_from_cart(&product_id) {
        return Err(AppError::NotFound(format!(
            "Product {} is not in the cart",
            product_id
        )));
    }
    state.db.upsert_user(&profile).await?;

    Ok(Json(CartResponse {
        items: profile.cart_items,
    }))
}

// ─── Checkout ────────────────────────────────────────────────

/// Where to send the browser to pay.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Deserialize, Validate)]
pub struct ClassCheckoutRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub class_id: String,
    /// `YYYY-MM-DD`, optionally followed by a time that is ignored
    #[validate(length(min = 10, message = "must be a YYYY-MM-DD date"))]
    pub session_date: String,
}

#[derive(Deserialize, Validate)]
pub struct ConfirmRequest {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub session_id: String,
}

async fn checkout_products(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CheckoutResponse>> {
    let session = state.checkout.start_product_checkout(&user).await?;
    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

async fn checkout_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<ClassCheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let session = state
        .checkout
        .start_class_checkout(&user, &body.class_id, &body.session_date)
        .await?;
    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// Confirm a completed payment.
///
/// Replays of an already fulfilled session return the existing record with
/// `replayed: true`.
async fn confirm_checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<ConfirmRequest>,
) -> Result<Json<Confirmation>> {
    let result = state
        .reconciler
        .confirm(Some(&user), &body.session_id)
        .await?;
    Ok(Json(result.confirmation))
}

// ─── Bookings ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct BookRequest {
    #[validate(length(min = 10, message = "must be a YYYY-MM-DD date"))]
    pub session_date: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BookingResponse {
    pub booking: Booking,
    pub replayed: bool,
}

/// Book a free class directly.
async fn book_free_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<String>,
    ValidJson(body): ValidJson<BookRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let result = state
        .bookings
        .book_free(&user, &class_id, &body.session_date)
        .await?;
    let status = if result.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(BookingResponse {
            booking: result.booking,
            replayed: result.replayed,
        }),
    ))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.list(&user).await?))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<String>,
) -> Result<StatusCode> {
    state.bookings.cancel(&user, &booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Reviews ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub class_id: String,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub text: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub text: Option<String>,
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = state
        .reviews
        .create(&user, &body.class_id, body.rating, body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(review_id): Path<String>,
    ValidJson(body): ValidJson<UpdateReviewRequest>,
) -> Result<Json<Review>> {
    let review = state
        .reviews
        .update(&user, &review_id, body.rating, body.text)
        .await?;
    Ok(Json(review))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(review_id): Path<String>,
) -> Result<StatusCode> {
    state.reviews.delete(&user, &review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
