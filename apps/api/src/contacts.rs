//! Professional contacts CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::contact::ContactRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/v1/contacts
pub async fn handle_create_contact(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(req): Json<CreateContactRequest>,
) -> Result<Json<ContactRow>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let contact = sqlx::query_as::<_, ContactRow>(
        r#"
        INSERT INTO contacts
            (id, user_id, name, email, company, role, linkedin_url, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session.user.id)
    .bind(req.name.trim())
    .bind(&req.email)
    .bind(&req.company)
    .bind(&req.role)
    .bind(&req.linkedin_url)
    .bind(&req.notes)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(contact))
}

/// GET /api/v1/contacts
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    session: CurrentUser,
) -> Result<Json<Vec<ContactRow>>, AppError> {
    let contacts = sqlx::query_as::<_, ContactRow>(
        "SELECT * FROM contacts WHERE user_id = $1 ORDER BY name",
    )
    .bind(session.user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(contacts))
}

/// PATCH /api/v1/contacts/:id
pub async fn handle_update_contact(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(contact_id): Path<Uuid>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<ContactRow>, AppError> {
    let contact = sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts
        SET name = COALESCE($1, name),
            email = COALESCE($2, email),
            company = COALESCE($3, company),
            role = COALESCE($4, role),
            linkedin_url = COALESCE($5, linkedin_url),
            notes = COALESCE($6, notes),
            updated_at = NOW()
        WHERE id = $7 AND user_id = $8
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.company)
    .bind(&req.role)
    .bind(&req.linkedin_url)
    .bind(&req.notes)
    .bind(contact_id)
    .bind(session.user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Contact {contact_id} not found")))?;

    Ok(Json(contact))
}

/// DELETE /api/v1/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(contact_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(contact_id)
        .bind(session.user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Contact {contact_id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
