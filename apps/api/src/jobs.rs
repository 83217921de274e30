//! Externally-triggered jobs. The reminder job is a stateless handler
//! invoked by a scheduler (cron, hosted trigger); it is not a long-running
//! process and holds no state between invocations.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    /// Reminders recorded in this invocation.
    pub created: u64,
}

/// POST /api/v1/jobs/reminders
///
/// Records one reminder for every upcoming interview step scheduled within
/// the next 24 hours that has not been reminded yet. Idempotent: a second
/// trigger in the same window creates nothing.
pub async fn handle_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RemindersResponse>, AppError> {
    let secret = headers
        .get("x-job-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secret != state.config.job_trigger_secret {
        warn!("reminder job trigger with bad or missing secret");
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO reminders (id, step_id, user_id, scheduled_at, created_at)
        SELECT gen_random_uuid(), s.id, p.user_id, s.scheduled_at, NOW()
        FROM interview_steps s
        JOIN processes p ON p.id = s.process_id
        WHERE s.status = 'upcoming'
          AND s.scheduled_at IS NOT NULL
          AND s.scheduled_at BETWEEN NOW() AND NOW() + INTERVAL '24 hours'
          AND NOT EXISTS (SELECT 1 FROM reminders r WHERE r.step_id = s.id)
        "#,
    )
    .execute(&state.db)
    .await?;

    let created = result.rows_affected();
    info!("reminder job: {created} reminder(s) recorded");

    Ok(Json(RemindersResponse { created }))
}
