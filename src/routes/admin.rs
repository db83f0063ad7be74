//! Admin dashboard routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{DashboardStats, Role};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/stats", get(dashboard_stats))
}

async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardStats>> {
    user.require_role(Role::Admin)?;
    let stats = state.db.dashboard_stats().await?;
    tracing::debug!(user_id = %user.user_id, "Dashboard stats served");
    Ok(Json(stats))
}
