//! Generic OAuth handshake: authorization redirect and callback.
//!
//! Both providers share this single implementation; the differences are
//! confined to `ProviderConfig`. The CSRF state nonce round-trips through an
//! HttpOnly SameSite=Lax cookie with a ten-minute lifetime, and callback
//! failures never surface as HTTP errors — every branch redirects back to
//! the settings page with a machine-readable `error` query parameter. The
//! state cookie is cleared only on the success path.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::oauth::provider::{build_authorize_url, Provider};
use crate::oauth::tokens::{self, connection_status};
use crate::state::AppState;

/// Lifetime of the CSRF state cookie.
const STATE_COOKIE_MAX_AGE_MINUTES: i64 = 10;

fn state_cookie_name(provider: Provider) -> String {
    format!("oauth_state_{}", provider.as_str())
}

/// Random URL-safe state nonce (32 bytes of entropy).
fn generate_state_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Exact-match comparison of the returned state against the cookie-stored
/// one. Absence on either side is a hard failure, never a soft warning.
pub fn verify_state(returned: Option<&str>, stored: Option<&str>) -> bool {
    match (returned, stored) {
        (Some(r), Some(s)) => !r.is_empty() && r == s,
        _ => false,
    }
}

fn parse_provider(slug: &str) -> Result<Provider, AppError> {
    Provider::from_str(slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown OAuth provider '{slug}'")))
}

fn settings_redirect(state: &AppState, query: &str) -> Redirect {
    Redirect::to(&format!("{}?{}", state.config.settings_url(), query))
}

/// GET /api/v1/oauth/:provider/connect
///
/// Issues the authorization redirect: generates a state nonce, stores it in
/// the state cookie, and sends the user agent to the provider consent screen.
pub async fn handle_connect(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    _session: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let provider = parse_provider(&slug)?;
    let cfg = state.providers.get(provider);

    let nonce = generate_state_nonce();
    let cookie = Cookie::build((state_cookie_name(provider), nonce.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(STATE_COOKIE_MAX_AGE_MINUTES))
        .build();

    let redirect_uri = cfg.redirect_uri(&state.config.app_base_url);
    let url = build_authorize_url(cfg, &redirect_uri, &nonce);

    info!("issuing {provider} authorization redirect");
    Ok((jar.add(cookie), Redirect::to(&url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /api/v1/oauth/:provider/callback
///
/// Verifies the state nonce, exchanges the code, and persists the token
/// record for the logged-in user. Branch order follows the handshake state
/// machine: provider error, then state mismatch, then missing code, then
/// exchange failure, then missing session, then store failure. Each failure
/// lands back on the settings page with an error reason and leaves the state
/// cookie in place.
pub async fn handle_callback(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<CallbackQuery>,
    session: Option<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let provider = parse_provider(&slug)?;
    let cfg = state.providers.get(provider);
    let cookie_name = state_cookie_name(provider);
    let stored_state = jar.get(&cookie_name).map(|c| c.value().to_string());

    if let Some(err) = &query.error {
        warn!(
            "{provider} authorization error: {err} ({})",
            query.error_description.as_deref().unwrap_or("no description")
        );
        return Ok((
            jar,
            settings_redirect(&state, &format!("error={}_auth_failed", provider.error_slug())),
        ));
    }

    if !verify_state(query.state.as_deref(), stored_state.as_deref()) {
        // Security-relevant: forged or replayed callback.
        warn!("{provider} callback state mismatch, rejecting");
        return Ok((jar, settings_redirect(&state, "error=invalid_state")));
    }

    let Some(code) = query.code.as_deref() else {
        warn!("{provider} callback carried no authorization code");
        return Ok((jar, settings_redirect(&state, "error=missing_code")));
    };

    let redirect_uri = cfg.redirect_uri(&state.config.app_base_url);
    let grant = match tokens::exchange_code(&state.http, cfg, code, &redirect_uri).await {
        Ok(grant) => grant,
        Err(e) => {
            warn!("{provider} token exchange failed: {e}");
            return Ok((jar, settings_redirect(&state, "error=token_exchange_failed")));
        }
    };

    // The callback must correlate to an existing logged-in session; it does
    // not create application accounts.
    let Some(session) = session else {
        warn!("{provider} callback without an authenticated session");
        return Ok((jar, settings_redirect(&state, "error=not_authenticated")));
    };

    if let Err(e) = tokens::upsert_token(&state.db, session.user.id, provider, &grant).await {
        warn!("failed to persist {provider} token: {e}");
        return Ok((jar, settings_redirect(&state, "error=connection_failed")));
    }

    info!("{provider} connected for user {}", session.user.id);

    let mut removal = Cookie::from(cookie_name);
    removal.set_path("/");
    Ok((
        jar.remove(removal),
        settings_redirect(&state, &format!("connected={}", provider.error_slug())),
    ))
}

/// GET /api/v1/oauth/status
///
/// Connection summary for the settings page; no token material is exposed.
pub async fn handle_status(
    State(state): State<AppState>,
    session: CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let calendar =
        connection_status(&state.db, session.user.id, Provider::GoogleCalendar).await?;
    let linkedin = connection_status(&state.db, session.user.id, Provider::Linkedin).await?;
    Ok(Json(serde_json::json!({
        "connections": [calendar, linkedin]
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_state_exact_match() {
        assert!(verify_state(Some("abc123"), Some("abc123")));
    }

    #[test]
    fn test_verify_state_mismatch_is_hard_failure() {
        assert!(!verify_state(Some("abc123"), Some("abc124")));
    }

    #[test]
    fn test_verify_state_missing_returned() {
        assert!(!verify_state(None, Some("abc123")));
    }

    #[test]
    fn test_verify_state_missing_cookie() {
        assert!(!verify_state(Some("abc123"), None));
    }

    #[test]
    fn test_verify_state_rejects_empty_strings() {
        assert!(!verify_state(Some(""), Some("")));
    }

    #[test]
    fn test_state_nonce_is_unique_and_url_safe() {
        let a = generate_state_nonce();
        let b = generate_state_nonce();
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_state_cookie_name_is_provider_scoped() {
        assert_eq!(
            state_cookie_name(Provider::GoogleCalendar),
            "oauth_state_google_calendar"
        );
        assert_eq!(state_cookie_name(Provider::Linkedin), "oauth_state_linkedin");
    }
}
