//! Public catalog routes.

use crate::error::Result;
use crate::models::Product;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/products/featured", get(featured_products))
}

async fn featured_products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog.featured_products().await?))
}
