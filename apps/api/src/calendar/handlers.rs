use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::calendar::client::{self, CalendarEvent, EventQuery};
use crate::errors::AppError;
use crate::oauth::provider::Provider;
use crate::oauth::tokens::{delete_token, ensure_fresh_access_token, load_token};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQueryParams {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub q: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<CalendarEvent>,
}

/// GET /api/v1/calendar/events
///
/// Requires a calendar connection. The token layer refreshes an
/// expired-within-buffer token before the read, so the events call always
/// carries a fresh token; `NOT_CONNECTED` / `TOKEN_EXPIRED` come back as
/// structured error codes when reconnection is required.
pub async fn handle_list_events(
    State(state): State<AppState>,
    session: CurrentUser,
    Query(params): Query<EventsQueryParams>,
) -> Result<Json<EventsResponse>, AppError> {
    let cfg = state.providers.get(Provider::GoogleCalendar);
    let access_token =
        ensure_fresh_access_token(&state.db, &state.http, cfg, session.user.id).await?;

    let query = EventQuery {
        time_min: params.time_min,
        time_max: params.time_max,
        text_filter: params.q,
        max_results: params.max_results,
    };

    let events = client::list_events(&state.http, &access_token, &query).await?;
    Ok(Json(EventsResponse { events }))
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
    /// Token records removed; zero when nothing was connected.
    pub removed: u64,
}

/// POST /api/v1/calendar/disconnect
///
/// Best-effort revokes the token at the provider, deletes the local record,
/// and clears cached calendar-link fields on the user's interview steps.
/// Revocation failures are logged and swallowed so local cleanup always
/// proceeds. Idempotent when no record exists.
pub async fn handle_disconnect(
    State(state): State<AppState>,
    session: CurrentUser,
) -> Result<Json<DisconnectResponse>, AppError> {
    let cfg = state.providers.get(Provider::GoogleCalendar);

    if let Some(record) = load_token(&state.db, session.user.id, Provider::GoogleCalendar).await? {
        if let Some(revoke_url) = cfg.revoke_url.as_deref() {
            client::revoke_token(&state.http, revoke_url, &record.access_token).await;
        }
    }

    let removed = delete_token(&state.db, session.user.id, Provider::GoogleCalendar).await?;

    // Explicit subquery across processes -> steps; steps have no user_id of
    // their own.
    sqlx::query(
        r#"
        UPDATE interview_steps
        SET calendar_event_id = NULL,
            calendar_event_summary = NULL,
            updated_at = NOW()
        WHERE calendar_event_id IS NOT NULL
          AND process_id IN (SELECT id FROM processes WHERE user_id = $1)
        "#,
    )
    .bind(session.user.id)
    .execute(&state.db)
    .await?;

    info!(
        "calendar disconnected for user {} ({} token record(s) removed)",
        session.user.id, removed
    );

    Ok(Json(DisconnectResponse {
        success: true,
        removed,
    }))
}
