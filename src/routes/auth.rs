// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes.
//!
//! Tokens are issued by the identity flow in front of this service; the only
//! session action handled here is logout.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::middleware::auth::{TOKEN_COOKIE, TOKEN_TTL_SECS};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

/// Build the token cookie with the attributes it is issued with.
pub fn token_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(TOKEN_TTL_SECS as i64))
        .build()
}

/// Clear the access-token cookie.
///
/// The removal cookie is always sent, even when the request carried none.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut removal = token_cookie(String::new(), state.config.secure_cookies());
    removal.make_removal();
    (jar.add(removal), StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie("abc".to_string(), true).to_string();
        assert!(cookie.starts_with("studio_token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));

        let insecure = token_cookie("abc".to_string(), false).to_string();
        assert!(!insecure.contains("Secure"));
    }
}
