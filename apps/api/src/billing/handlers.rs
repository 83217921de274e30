use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::billing::BookingRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub topic: String,
    pub scheduled_at: DateTime<Utc>,
    pub amount_cents: i64,
    /// ISO currency code, lowercase. Defaults to "usd".
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub booking: BookingRow,
    /// Hosted payment page the frontend redirects the user to.
    pub checkout_url: String,
}

/// POST /api/v1/bookings
///
/// Creates a pending booking and a hosted checkout session for it. The
/// booking flips to "paid" when the processor's webhook arrives.
pub async fn handle_create_booking(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    if req.topic.trim().is_empty() {
        return Err(AppError::Validation("topic is required".to_string()));
    }
    if req.amount_cents <= 0 {
        return Err(AppError::Validation(
            "amount_cents must be positive".to_string(),
        ));
    }

    let booking_id = Uuid::new_v4();
    let currency = req.currency.as_deref().unwrap_or("usd");

    let checkout = state
        .checkout
        .create_session(
            &booking_id.to_string(),
            &format!("Coaching session: {}", req.topic.trim()),
            req.amount_cents,
            currency,
            &format!("{}/bookings?paid=1", state.config.frontend_base_url),
            &format!("{}/bookings?cancelled=1", state.config.frontend_base_url),
        )
        .await?;

    let booking = sqlx::query_as::<_, BookingRow>(
        r#"
        INSERT INTO bookings
            (id, user_id, topic, scheduled_at, amount_cents, currency, status,
             checkout_session_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending_payment', $7, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .bind(session.user.id)
    .bind(req.topic.trim())
    .bind(req.scheduled_at)
    .bind(req.amount_cents)
    .bind(currency)
    .bind(&checkout.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(CreateBookingResponse {
        booking,
        checkout_url: checkout.url,
    }))
}

/// GET /api/v1/bookings
pub async fn handle_list_bookings(
    State(state): State<AppState>,
    session: CurrentUser,
) -> Result<Json<Vec<BookingRow>>, AppError> {
    let bookings = sqlx::query_as::<_, BookingRow>(
        "SELECT * FROM bookings WHERE user_id = $1 ORDER BY scheduled_at DESC",
    )
    .bind(session.user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(bookings))
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub session_id: String,
}

/// POST /api/v1/billing/webhook
///
/// Processor callback. Authenticated by a shared secret header; marking a
/// booking paid is idempotent, so replays are harmless.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let secret = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secret != state.config.checkout_webhook_secret {
        warn!("billing webhook with bad or missing secret");
        return Err(AppError::Forbidden);
    }

    if event.event_type != "checkout.session.completed" {
        // Other event types are acknowledged and ignored.
        return Ok(Json(serde_json::json!({ "received": true })));
    }

    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = 'paid', updated_at = NOW()
        WHERE checkout_session_id = $1 AND status = 'pending_payment'
        "#,
    )
    .bind(&event.session_id)
    .execute(&state.db)
    .await?;

    info!(
        "billing webhook: session {} marked {} booking(s) paid",
        event.session_id,
        result.rows_affected()
    );

    Ok(Json(serde_json::json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_event_deserializes() {
        let json = r#"{"type": "checkout.session.completed", "session_id": "cs_test_123"}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.session_id, "cs_test_123");
    }
}
