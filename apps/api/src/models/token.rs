use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted OAuth token record per (user, provider).
///
/// Reconnecting upserts over the existing row; disconnect deletes it.
/// Access and refresh tokens are opaque secrets and are never serialized
/// into API responses.
#[derive(Debug, Clone, FromRow)]
pub struct OAuthTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub access_token: String,
    /// Absent when the provider did not re-issue one on re-consent.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Connection status exposed to the frontend (no secrets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub provider: String,
    pub connected: bool,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
