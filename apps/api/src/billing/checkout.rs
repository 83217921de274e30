//! Thin client for the payment processor's hosted checkout API.
//!
//! The contract is deliberately narrow: create a session, get back its id
//! and the hosted payment page URL. Everything else (card handling, taxes,
//! receipts) lives on the processor's side.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page the frontend redirects the user to.
    pub url: String,
}

#[derive(Clone)]
pub struct CheckoutClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl CheckoutClient {
    pub fn new(http: reqwest::Client, api_base: String, secret_key: String) -> Self {
        Self {
            http,
            api_base,
            secret_key,
        }
    }

    /// Creates a hosted checkout session for one booking. Single attempt;
    /// a failed call leaves the booking in `pending_payment` and the caller
    /// surfaces the error.
    pub async fn create_session(
        &self,
        reference: &str,
        description: &str,
        amount_cents: i64,
        currency: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, AppError> {
        let amount = amount_cents.to_string();
        let params = [
            ("mode", "payment"),
            ("client_reference_id", reference),
            ("line_items[0][price_data][currency]", currency),
            ("line_items[0][price_data][product_data][name]", description),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("checkout request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!(
                "checkout session creation failed ({status}): {body}"
            )));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::Payment(format!("invalid checkout response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_deserializes() {
        let json = r#"{
            "id": "cs_test_123",
            "url": "https://checkout.example.com/pay/cs_test_123",
            "object": "checkout.session",
            "status": "open"
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert!(session.url.starts_with("https://"));
    }
}
