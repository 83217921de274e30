//! Axum route handlers for processes and interview steps.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::calendar::client::EventTime;
use crate::errors::AppError;
use crate::models::pipeline::{
    is_valid_category, is_valid_process_status, is_valid_step_status, InterviewStepRow, ProcessRow,
};
use crate::pipeline::linker::step_from_event;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProcessRequest {
    pub company: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProcessRequest {
    pub status: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessDetailResponse {
    pub process: ProcessRow,
    pub steps: Vec<InterviewStepRow>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStepRequest {
    pub category: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub objectives: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStepRequest {
    pub category: Option<String>,
    pub status: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub objectives: Option<Vec<String>>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

/// A calendar event chosen by the user from the events listing.
#[derive(Debug, Deserialize)]
pub struct ChosenEvent {
    pub event_id: String,
    pub summary: String,
    pub start: EventTime,
}

// ────────────────────────────────────────────────────────────────────────────
// Process handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/processes
pub async fn handle_create_process(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(req): Json<CreateProcessRequest>,
) -> Result<Json<ProcessRow>, AppError> {
    if req.company.trim().is_empty() || req.role.trim().is_empty() {
        return Err(AppError::Validation(
            "company and role are required".to_string(),
        ));
    }

    let process = sqlx::query_as::<_, ProcessRow>(
        r#"
        INSERT INTO processes (id, user_id, company, role, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'active', NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session.user.id)
    .bind(req.company.trim())
    .bind(req.role.trim())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(process))
}

/// GET /api/v1/processes
pub async fn handle_list_processes(
    State(state): State<AppState>,
    session: CurrentUser,
) -> Result<Json<Vec<ProcessRow>>, AppError> {
    let processes = sqlx::query_as::<_, ProcessRow>(
        "SELECT * FROM processes WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(session.user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(processes))
}

/// GET /api/v1/processes/:id
pub async fn handle_get_process(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(process_id): Path<Uuid>,
) -> Result<Json<ProcessDetailResponse>, AppError> {
    let process = fetch_owned_process(&state, session.user.id, process_id).await?;

    let steps = sqlx::query_as::<_, InterviewStepRow>(
        "SELECT * FROM interview_steps WHERE process_id = $1 ORDER BY position",
    )
    .bind(process_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ProcessDetailResponse { process, steps }))
}

/// PATCH /api/v1/processes/:id
pub async fn handle_update_process(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(process_id): Path<Uuid>,
    Json(req): Json<UpdateProcessRequest>,
) -> Result<Json<ProcessRow>, AppError> {
    if let Some(status) = &req.status {
        if !is_valid_process_status(status) {
            return Err(AppError::Validation(format!(
                "unknown process status '{status}'"
            )));
        }
    }

    fetch_owned_process(&state, session.user.id, process_id).await?;

    let process = sqlx::query_as::<_, ProcessRow>(
        r#"
        UPDATE processes
        SET status = COALESCE($1, status),
            company = COALESCE($2, company),
            role = COALESCE($3, role),
            updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&req.status)
    .bind(&req.company)
    .bind(&req.role)
    .bind(process_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(process))
}

/// DELETE /api/v1/processes/:id
pub async fn handle_delete_process(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(process_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    fetch_owned_process(&state, session.user.id, process_id).await?;

    // Steps go with the process (FK cascade).
    sqlx::query("DELETE FROM processes WHERE id = $1")
        .bind(process_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Step handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/processes/:id/steps
pub async fn handle_create_step(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(process_id): Path<Uuid>,
    Json(req): Json<CreateStepRequest>,
) -> Result<Json<InterviewStepRow>, AppError> {
    if !is_valid_category(&req.category) {
        return Err(AppError::Validation(format!(
            "unknown step category '{}'",
            req.category
        )));
    }

    fetch_owned_process(&state, session.user.id, process_id).await?;
    let existing = count_steps(&state, process_id).await?;

    let step = sqlx::query_as::<_, InterviewStepRow>(
        r#"
        INSERT INTO interview_steps
            (id, process_id, position, category, status, scheduled_at, objectives, notes,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'upcoming', $5, $6, $7, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(process_id)
    .bind(existing as i32 + 1)
    .bind(&req.category)
    .bind(req.scheduled_at)
    .bind(&req.objectives)
    .bind(&req.notes)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(step))
}

/// PATCH /api/v1/steps/:id
pub async fn handle_update_step(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(step_id): Path<Uuid>,
    Json(req): Json<UpdateStepRequest>,
) -> Result<Json<InterviewStepRow>, AppError> {
    if let Some(category) = &req.category {
        if !is_valid_category(category) {
            return Err(AppError::Validation(format!(
                "unknown step category '{category}'"
            )));
        }
    }
    if let Some(status) = &req.status {
        if !is_valid_step_status(status) {
            return Err(AppError::Validation(format!(
                "unknown step status '{status}'"
            )));
        }
    }

    fetch_owned_step(&state, session.user.id, step_id).await?;

    let step = sqlx::query_as::<_, InterviewStepRow>(
        r#"
        UPDATE interview_steps
        SET category = COALESCE($1, category),
            status = COALESCE($2, status),
            scheduled_at = COALESCE($3, scheduled_at),
            objectives = COALESCE($4, objectives),
            notes = COALESCE($5, notes),
            outcome = COALESCE($6, outcome),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&req.category)
    .bind(&req.status)
    .bind(req.scheduled_at)
    .bind(&req.objectives)
    .bind(&req.notes)
    .bind(&req.outcome)
    .bind(step_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(step))
}

// ────────────────────────────────────────────────────────────────────────────
// Calendar-event linking
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/steps/:id/link-event
///
/// Link-to-existing mode: records the chosen event's id + summary on the
/// step and aligns the scheduled date with the event start.
pub async fn handle_link_event(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(step_id): Path<Uuid>,
    Json(event): Json<ChosenEvent>,
) -> Result<Json<InterviewStepRow>, AppError> {
    fetch_owned_step(&state, session.user.id, step_id).await?;

    let step = sqlx::query_as::<_, InterviewStepRow>(
        r#"
        UPDATE interview_steps
        SET calendar_event_id = $1,
            calendar_event_summary = $2,
            scheduled_at = $3,
            updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&event.event_id)
    .bind(&event.summary)
    .bind(event.start.as_instant())
    .bind(step_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(step))
}

/// POST /api/v1/processes/:id/steps/from-event
///
/// Import mode: creates a brand-new step from the chosen event. It lands at
/// the next ordinal position with category "other", status "upcoming", notes
/// seeded from the event summary, and the link fields set immediately.
pub async fn handle_import_event(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(process_id): Path<Uuid>,
    Json(event): Json<ChosenEvent>,
) -> Result<Json<InterviewStepRow>, AppError> {
    fetch_owned_process(&state, session.user.id, process_id).await?;
    let existing = count_steps(&state, process_id).await?;

    let fields = step_from_event(existing, &event.event_id, &event.summary, &event.start);

    let step = sqlx::query_as::<_, InterviewStepRow>(
        r#"
        INSERT INTO interview_steps
            (id, process_id, position, category, status, scheduled_at, objectives, notes,
             calendar_event_id, calendar_event_summary, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, '{}', $7, $8, $9, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(process_id)
    .bind(fields.position)
    .bind(fields.category)
    .bind(fields.status)
    .bind(fields.scheduled_at)
    .bind(&fields.notes)
    .bind(&fields.calendar_event_id)
    .bind(&fields.calendar_event_summary)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(step))
}

/// POST /api/v1/steps/:id/unlink-event
///
/// Clears the cached reference only; the provider-side event and the step's
/// manually-set fields are untouched.
pub async fn handle_unlink_event(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(step_id): Path<Uuid>,
) -> Result<Json<InterviewStepRow>, AppError> {
    fetch_owned_step(&state, session.user.id, step_id).await?;

    let step = sqlx::query_as::<_, InterviewStepRow>(
        r#"
        UPDATE interview_steps
        SET calendar_event_id = NULL,
            calendar_event_summary = NULL,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(step_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(step))
}

// ────────────────────────────────────────────────────────────────────────────
// Ownership lookups
// ────────────────────────────────────────────────────────────────────────────

async fn fetch_owned_process(
    state: &AppState,
    user_id: Uuid,
    process_id: Uuid,
) -> Result<ProcessRow, AppError> {
    sqlx::query_as::<_, ProcessRow>("SELECT * FROM processes WHERE id = $1 AND user_id = $2")
        .bind(process_id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Process {process_id} not found")))
}

async fn fetch_owned_step(
    state: &AppState,
    user_id: Uuid,
    step_id: Uuid,
) -> Result<InterviewStepRow, AppError> {
    sqlx::query_as::<_, InterviewStepRow>(
        r#"
        SELECT s.* FROM interview_steps s
        JOIN processes p ON p.id = s.process_id
        WHERE s.id = $1 AND p.user_id = $2
        "#,
    )
    .bind(step_id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Interview step {step_id} not found")))
}

async fn count_steps(state: &AppState, process_id: Uuid) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM interview_steps WHERE process_id = $1")
            .bind(process_id)
            .fetch_one(&state.db)
            .await?;
    Ok(count)
}
