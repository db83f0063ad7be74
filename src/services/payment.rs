// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment gateway client (Stripe Checkout).

use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// One display line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount_cents: i64,
    pub quantity: u32,
}

/// Everything needed to open a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    /// Server-authored data echoed back on retrieval
    pub metadata: BTreeMap<String, String>,
}

/// A newly created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

/// Authoritative state of a checkout session as reported by the gateway.
#[derive(Debug, Clone)]
pub struct RetrievedSession {
    pub id: String,
    pub payment_status: GatewayPaymentStatus,
    /// Total charged, in cents
    pub amount_total: Option<i64>,
    pub metadata: HashMap<String, String>,
    pub customer_email: Option<String>,
}

impl RetrievedSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == GatewayPaymentStatus::Paid
    }
}

/// Checkout-session interface of the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AppError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<RetrievedSession, AppError>;
}

/// Stripe Checkout implementation of [`PaymentGateway`].
#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    currency: String,
}

#[derive(Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

#[derive(Deserialize)]
struct StripeSession {
    id: String,
    payment_status: GatewayPaymentStatus,
    amount_total: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            currency: "usd".to_string(),
        }
    }

    /// Encode a checkout request as Stripe form parameters.
    fn form_params(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        if let Some(email) = &request.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        for (i, item) in request.line_items.iter().enumerate() {
            let prefix = format!("line_items[{}]", i);
            form.push((
                format!("{}[price_data][currency]", prefix),
                self.currency.clone(),
            ));
            form.push((
                format!("{}[price_data][product_data][name]", prefix),
                item.name.clone(),
            ));
            form.push((
                format!("{}[price_data][unit_amount]", prefix),
                item.unit_amount_cents.to_string(),
            ));
            form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
        }
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }
        form
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        response: reqwest::Response,
        session_id: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Stripe API error");

        match (status, session_id) {
            (reqwest::StatusCode::NOT_FOUND, Some(id)) => Err(AppError::NotFound(format!(
                "Payment session {} not found",
                id
            ))),
            _ => Err(AppError::PaymentGateway(format!(
                "Stripe API error: {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AppError> {
        let response = self
            .http
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&self.form_params(request))
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(e.to_string()))?;

        let response = self.check_response(response, None).await?;
        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| AppError::PaymentGateway(e.to_string()))?;

        tracing::debug!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<RetrievedSession, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/checkout/sessions/{}",
                STRIPE_API_BASE,
                urlencoding::encode(session_id)
            ))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(e.to_string()))?;

        let response = self.check_response(response, Some(session_id)).await?;
        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| AppError::PaymentGateway(e.to_string()))?;

        let customer_email = session
            .customer_details
            .and_then(|d| d.email)
            .or(session.customer_email);

        Ok(RetrievedSession {
            id: session.id,
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            metadata: session.metadata,
            customer_email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_params_encoding() {
        let gateway = StripeGateway::new("sk_test".to_string());
        let mut metadata = BTreeMap::new();
        metadata.insert("user_id".to_string(), "u1".to_string());
        let request = CheckoutRequest {
            line_items: vec![CheckoutLineItem {
                name: "Yoga Mat".to_string(),
                unit_amount_cents: 1000,
                quantity: 2,
            }],
            success_url: "http://localhost/success".to_string(),
            cancel_url: "http://localhost/cart".to_string(),
            customer_email: None,
            metadata,
        };

        let form: HashMap<String, String> = gateway.form_params(&request).into_iter().collect();
        assert_eq!(form["mode"], "payment");
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "1000");
        assert_eq!(form["line_items[0][price_data][product_data][name]"], "Yoga Mat");
        assert_eq!(form["line_items[0][quantity]"], "2");
        assert_eq!(form["metadata[user_id]"], "u1");
        assert!(!form.contains_key("customer_email"));
    }

    #[test]
    fn test_session_deserialization_prefers_customer_details() {
        let json = r#"{
            "id": "cs_test_1",
            "payment_status": "paid",
            "amount_total": 2000,
            "metadata": {"kind": "order"},
            "customer_email": null,
            "customer_details": {"email": "buyer@example.com"}
        }"#;
        let session: StripeSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.payment_status, GatewayPaymentStatus::Paid);
        assert_eq!(session.amount_total, Some(2000));
        assert_eq!(
            session.customer_details.and_then(|d| d.email).as_deref(),
            Some("buyer@example.com")
        );
    }

    #[test]
    fn test_unpaid_status_parses() {
        let status: GatewayPaymentStatus = serde_json::from_str("\"unpaid\"").unwrap();
        assert_eq!(status, GatewayPaymentStatus::Unpaid);
    }
}
