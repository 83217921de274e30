//! Token store and refresher.
//!
//! One row per (user, provider). Reads go through
//! [`ensure_fresh_access_token`], which refreshes an expired-within-buffer
//! token and persists the result before returning it; a stale token is never
//! handed to a provider API. Refresh is a single attempt; on failure the
//! caller degrades to requiring manual reconnection.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::token::{ConnectionStatus, OAuthTokenRow};
use crate::oauth::provider::{Provider, ProviderConfig};

/// Safety margin before the recorded expiry. A token that expires within
/// this window is treated as already expired so it cannot lapse mid-flight
/// during a provider call.
pub const EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// True when `now` is strictly inside the buffer window before `expires_at`
/// (or past it). Exactly five minutes remaining is still considered valid.
pub fn is_token_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at - Duration::seconds(EXPIRY_BUFFER_SECS)
}

/// What to do with a stored token record before handing a token to a
/// provider API.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenAction {
    /// Stored access token is still fresh; use it as-is.
    UseStored(String),
    /// Within the buffer (or past expiry) with a refresh token on record:
    /// perform exactly one refresh grant, persist it, and use the new
    /// access token. Carries the refresh token to present.
    Refresh(String),
    /// Expired with no refresh token on record; only reconnecting helps.
    Reauthorize,
}

/// Pure decision step of [`ensure_fresh_access_token`]: never returns the
/// stored access token once it is inside the expiry buffer.
pub fn plan_token_use(record: &OAuthTokenRow, now: DateTime<Utc>) -> TokenAction {
    if !is_token_expired(record.expires_at, now) {
        return TokenAction::UseStored(record.access_token.clone());
    }
    match &record.refresh_token {
        Some(refresh_token) => TokenAction::Refresh(refresh_token.clone()),
        None => TokenAction::Reauthorize,
    }
}

/// Token endpoint response for both the code exchange and the refresh grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent on refresh, and on re-consent for providers that only issue
    /// a refresh token once.
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub scope: Option<String>,
}

impl TokenGrant {
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.expires_in)
    }
}

/// Exchanges an authorization code for tokens. Single attempt; any
/// non-success response surfaces as an upstream failure.
pub async fn exchange_code(
    http: &reqwest::Client,
    cfg: &ProviderConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant, AppError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("client_id", cfg.client_id.as_str()),
        ("client_secret", cfg.client_secret.as_str()),
    ];

    let response = http
        .post(&cfg.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "token exchange failed ({status}): {body}"
        )));
    }

    response
        .json::<TokenGrant>()
        .await
        .map_err(|e| AppError::Upstream(format!("invalid token response: {e}")))
}

/// Exchanges a refresh token for a new access token. Single attempt, no
/// backoff; any failure means the connection has effectively expired and the
/// user must re-authorize.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    cfg: &ProviderConfig,
    refresh_token: &str,
) -> Result<TokenGrant, AppError> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", cfg.client_id.as_str()),
        ("client_secret", cfg.client_secret.as_str()),
    ];

    let response = http
        .post(&cfg.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|_| AppError::TokenExpired(cfg.provider.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("token refresh failed ({status}): {body}");
        return Err(AppError::TokenExpired(cfg.provider.to_string()));
    }

    response
        .json::<TokenGrant>()
        .await
        .map_err(|_| AppError::TokenExpired(cfg.provider.to_string()))
}

/// Persists a token grant, keyed by (user, provider). Reconnection
/// overwrites the existing row; an absent refresh token keeps the old one.
pub async fn upsert_token(
    pool: &PgPool,
    user_id: Uuid,
    provider: Provider,
    grant: &TokenGrant,
) -> Result<(), AppError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO oauth_tokens
            (id, user_id, provider, access_token, refresh_token, expires_at, scope, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        ON CONFLICT (user_id, provider) DO UPDATE SET
            access_token = EXCLUDED.access_token,
            refresh_token = COALESCE(EXCLUDED.refresh_token, oauth_tokens.refresh_token),
            expires_at = EXCLUDED.expires_at,
            scope = EXCLUDED.scope,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(provider.as_str())
    .bind(&grant.access_token)
    .bind(&grant.refresh_token)
    .bind(grant.expires_at(now))
    .bind(grant.scope.as_deref().unwrap_or_default())
    .bind(now)
    .execute(pool)
    .await?;

    info!("stored {provider} token for user {user_id}");
    Ok(())
}

pub async fn load_token(
    pool: &PgPool,
    user_id: Uuid,
    provider: Provider,
) -> Result<Option<OAuthTokenRow>, AppError> {
    let row = sqlx::query_as::<_, OAuthTokenRow>(
        "SELECT * FROM oauth_tokens WHERE user_id = $1 AND provider = $2",
    )
    .bind(user_id)
    .bind(provider.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes the token record. Idempotent: returns the number of rows removed,
/// zero when no record existed.
pub async fn delete_token(
    pool: &PgPool,
    user_id: Uuid,
    provider: Provider,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM oauth_tokens WHERE user_id = $1 AND provider = $2")
        .bind(user_id)
        .bind(provider.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Returns a non-expired access token for the user, refreshing and
/// persisting first when the stored one is inside the expiry buffer.
///
/// Failure codes are what the calendar endpoints report to clients:
/// no record at all is `NOT_CONNECTED`; a refresh that cannot be performed
/// (missing refresh token) or fails is `TOKEN_EXPIRED`.
pub async fn ensure_fresh_access_token(
    pool: &PgPool,
    http: &reqwest::Client,
    cfg: &ProviderConfig,
    user_id: Uuid,
) -> Result<String, AppError> {
    let record = load_token(pool, user_id, cfg.provider)
        .await?
        .ok_or_else(|| AppError::NotConnected(cfg.provider.to_string()))?;

    let refresh_token = match plan_token_use(&record, Utc::now()) {
        TokenAction::UseStored(access_token) => return Ok(access_token),
        TokenAction::Reauthorize => {
            return Err(AppError::TokenExpired(cfg.provider.to_string()))
        }
        TokenAction::Refresh(refresh_token) => refresh_token,
    };

    debug!(
        "access token for user {user_id} expired or near expiry, refreshing via {}",
        cfg.provider
    );
    let grant = refresh_access_token(http, cfg, &refresh_token).await?;

    // Last write wins; a concurrent refresh simply overwrites this row.
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE oauth_tokens
        SET access_token = $1,
            refresh_token = COALESCE($2, refresh_token),
            expires_at = $3,
            updated_at = $4
        WHERE user_id = $5 AND provider = $6
        "#,
    )
    .bind(&grant.access_token)
    .bind(&grant.refresh_token)
    .bind(grant.expires_at(now))
    .bind(now)
    .bind(user_id)
    .bind(cfg.provider.as_str())
    .execute(pool)
    .await?;

    Ok(grant.access_token)
}

/// Connection summary for the settings page: never exposes token material.
pub async fn connection_status(
    pool: &PgPool,
    user_id: Uuid,
    provider: Provider,
) -> Result<ConnectionStatus, AppError> {
    let record = load_token(pool, user_id, provider).await?;
    Ok(match record {
        Some(row) => ConnectionStatus {
            provider: provider.to_string(),
            connected: true,
            scope: Some(row.scope),
            expires_at: Some(row.expires_at),
        },
        None => ConnectionStatus {
            provider: provider.to_string(),
            connected: false,
            scope: None,
            expires_at: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_row(expires_at: DateTime<Utc>, refresh_token: Option<&str>) -> OAuthTokenRow {
        let now = Utc::now();
        OAuthTokenRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider: "google_calendar".to_string(),
            access_token: "stale-access-token".to_string(),
            refresh_token: refresh_token.map(String::from),
            expires_at,
            scope: "calendar.readonly".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_expired_ten_minutes_ago_plans_one_refresh() {
        let now = Utc::now();
        let record = stored_row(now - Duration::minutes(10), Some("rt-1"));

        // One refresh grant, presenting the stored refresh token; the stale
        // access token is never the one handed out.
        assert_eq!(
            plan_token_use(&record, now),
            TokenAction::Refresh("rt-1".to_string())
        );
    }

    #[test]
    fn test_refreshed_grant_token_replaces_stale_one() {
        let now = Utc::now();
        let record = stored_row(now - Duration::minutes(10), Some("rt-1"));
        assert!(matches!(
            plan_token_use(&record, now),
            TokenAction::Refresh(_)
        ));

        let grant = TokenGrant {
            access_token: "fresh-access-token".to_string(),
            refresh_token: None,
            expires_in: 3600,
            scope: None,
        };
        assert_ne!(grant.access_token, record.access_token);
        assert!(!is_token_expired(grant.expires_at(now), now));
    }

    #[test]
    fn test_fresh_token_is_used_as_stored() {
        let now = Utc::now();
        let record = stored_row(now + Duration::hours(1), Some("rt-1"));
        assert_eq!(
            plan_token_use(&record, now),
            TokenAction::UseStored("stale-access-token".to_string())
        );
    }

    #[test]
    fn test_expired_without_refresh_token_requires_reauthorization() {
        let now = Utc::now();
        let record = stored_row(now - Duration::minutes(10), None);
        assert_eq!(plan_token_use(&record, now), TokenAction::Reauthorize);
    }

    #[test]
    fn test_token_valid_at_exactly_five_minutes_remaining() {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(EXPIRY_BUFFER_SECS);
        assert!(!is_token_expired(expires_at, now));
    }

    #[test]
    fn test_token_expired_at_4m59s_remaining() {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(EXPIRY_BUFFER_SECS - 1);
        assert!(is_token_expired(expires_at, now));
    }

    #[test]
    fn test_token_expired_when_past_expiry() {
        let now = Utc::now();
        assert!(is_token_expired(now - Duration::minutes(10), now));
    }

    #[test]
    fn test_token_valid_well_before_expiry() {
        let now = Utc::now();
        assert!(!is_token_expired(now + Duration::hours(1), now));
    }

    #[test]
    fn test_grant_expiry_instant() {
        let now = Utc::now();
        let grant = TokenGrant {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_in: 3600,
            scope: None,
        };
        assert_eq!(grant.expires_at(now), now + Duration::seconds(3600));
    }

    #[test]
    fn test_grant_deserializes_without_refresh_token() {
        let json = r#"{"access_token": "ya29.x", "expires_in": 3599, "scope": "calendar.readonly", "token_type": "Bearer"}"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.access_token, "ya29.x");
        assert!(grant.refresh_token.is_none());
        assert_eq!(grant.expires_in, 3599);
    }
}
