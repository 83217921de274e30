//! Career achievements CRUD with LLM-backed tag suggestion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_RULES;
use crate::llm_client::LlmClient;
use crate::models::achievement::AchievementRow;
use crate::state::AppState;

const TAG_SYSTEM: &str = "You are a career coach who labels achievements \
    with short, reusable skill tags.";

const TAG_PROMPT_TEMPLATE: &str = r#"Suggest 3-6 short lowercase skill tags for this achievement.

Title: {title}
Description: {description}

Return a JSON object with this EXACT schema:
{"tags": ["leadership", "rust", "mentoring"]}"#;

#[derive(Debug, Deserialize)]
struct TagSuggestion {
    tags: Vec<String>,
}

/// Asks the LLM for skill tags. Failures degrade to no tags — tagging is a
/// convenience, not a requirement for saving.
async fn suggest_tags(llm: &LlmClient, title: &str, description: Option<&str>) -> Vec<String> {
    let prompt = TAG_PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{description}", description.unwrap_or(""));
    let system = format!("{TAG_SYSTEM} {JSON_ONLY_RULES}");

    match llm.call_json::<TagSuggestion>(&prompt, &system).await {
        Ok(suggestion) => suggestion.tags,
        Err(e) => {
            warn!("tag suggestion failed, saving without tags: {e}");
            Vec::new()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAchievementRequest {
    pub title: String,
    pub description: Option<String>,
    pub achieved_on: Option<NaiveDate>,
    /// When omitted, tags are suggested by the LLM.
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAchievementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub achieved_on: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

/// POST /api/v1/achievements
pub async fn handle_create_achievement(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(req): Json<CreateAchievementRequest>,
) -> Result<Json<AchievementRow>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let tags = match req.tags {
        Some(tags) => tags,
        None => suggest_tags(&state.llm, &req.title, req.description.as_deref()).await,
    };

    let achievement = sqlx::query_as::<_, AchievementRow>(
        r#"
        INSERT INTO achievements
            (id, user_id, title, description, achieved_on, tags, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session.user.id)
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(req.achieved_on)
    .bind(&tags)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(achievement))
}

/// GET /api/v1/achievements
pub async fn handle_list_achievements(
    State(state): State<AppState>,
    session: CurrentUser,
) -> Result<Json<Vec<AchievementRow>>, AppError> {
    let achievements = sqlx::query_as::<_, AchievementRow>(
        "SELECT * FROM achievements WHERE user_id = $1 ORDER BY achieved_on DESC NULLS LAST, created_at DESC",
    )
    .bind(session.user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(achievements))
}

/// PATCH /api/v1/achievements/:id
pub async fn handle_update_achievement(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(achievement_id): Path<Uuid>,
    Json(req): Json<UpdateAchievementRequest>,
) -> Result<Json<AchievementRow>, AppError> {
    let achievement = sqlx::query_as::<_, AchievementRow>(
        r#"
        UPDATE achievements
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            achieved_on = COALESCE($3, achieved_on),
            tags = COALESCE($4, tags),
            updated_at = NOW()
        WHERE id = $5 AND user_id = $6
        RETURNING *
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.achieved_on)
    .bind(&req.tags)
    .bind(achievement_id)
    .bind(session.user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Achievement {achievement_id} not found")))?;

    Ok(Json(achievement))
}

/// DELETE /api/v1/achievements/:id
pub async fn handle_delete_achievement(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(achievement_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM achievements WHERE id = $1 AND user_id = $2")
        .bind(achievement_id)
        .bind(session.user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Achievement {achievement_id} not found"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_suggestion_deserializes() {
        let json = r#"{"tags": ["rust", "mentoring"]}"#;
        let suggestion: TagSuggestion = serde_json::from_str(json).unwrap();
        assert_eq!(suggestion.tags, vec!["rust", "mentoring"]);
    }

    #[test]
    fn test_tag_prompt_substitution() {
        let prompt = TAG_PROMPT_TEMPLATE
            .replace("{title}", "Shipped billing rewrite")
            .replace("{description}", "Led a 3-person team");
        assert!(prompt.contains("Shipped billing rewrite"));
        assert!(prompt.contains("Led a 3-person team"));
        assert!(!prompt.contains("{title}"));
    }
}
