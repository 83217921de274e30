use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::session::{CurrentUser, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct MintSessionRequest {
    /// Identity asserted by the hosted auth provider.
    pub external_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// POST /api/v1/auth/session
///
/// Upserts the user by external identity and opens a session. The cookie is
/// HttpOnly + SameSite=Lax like the OAuth state cookie.
pub async fn handle_mint_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<MintSessionRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    if req.external_id.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::Validation(
            "external_id and email are required".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, external_id, email, display_name, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (external_id) DO UPDATE SET
            email = EXCLUDED.email,
            display_name = COALESCE(EXCLUDED.display_name, users.display_name)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.external_id)
    .bind(&req.email)
    .bind(&req.display_name)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    let session_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(session_id)
    .bind(user.id)
    .bind(Utc::now())
    .bind(Utc::now() + Duration::days(SESSION_TTL_DAYS))
    .execute(&state.db)
    .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build();

    Ok((jar.add(cookie), Json(user)))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    session: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session.session_id)
        .execute(&state.db)
        .await?;

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");

    Ok((
        jar.remove(removal),
        Json(serde_json::json!({ "success": true })),
    ))
}

/// GET /api/v1/auth/me
pub async fn handle_me(session: CurrentUser) -> Json<User> {
    Json(session.user)
}
