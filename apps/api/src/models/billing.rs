use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A coaching session booking paid through the hosted checkout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub scheduled_at: DateTime<Utc>,
    pub amount_cents: i64,
    pub currency: String,
    /// "pending_payment" | "paid" | "cancelled"
    pub status: String,
    /// Hosted checkout session id, set when the session is created.
    pub checkout_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
