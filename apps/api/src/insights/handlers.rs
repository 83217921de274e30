use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::insights::prompts::{
    ASK_PROMPT_TEMPLATE, ASK_SYSTEM, RECOMMEND_PROMPT_TEMPLATE, RECOMMEND_SYSTEM,
};
use crate::llm_client::prompts::JSON_ONLY_RULES;
use crate::models::achievement::AchievementRow;
use crate::models::pipeline::{InterviewStepRow, ProcessRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub suggested_category: String,
}

/// POST /api/v1/insights/ask
///
/// Q&A over the user's own processes, steps, and achievements. The model
/// sees only this user's rows; it is instructed to answer from that data
/// alone.
pub async fn handle_ask(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let context = gather_user_context(&state, session.user.id).await?;
    let prompt = ASK_PROMPT_TEMPLATE
        .replace("{context}", &context.to_string())
        .replace("{question}", req.question.trim());

    let response = state
        .llm
        .call(&prompt, ASK_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("insights ask failed: {e}")))?;

    let answer = response
        .text()
        .ok_or_else(|| AppError::Llm("empty LLM response".to_string()))?
        .to_string();

    Ok(Json(AskResponse { answer }))
}

/// POST /api/v1/processes/:id/recommendation
///
/// Next-step recommendation for one process.
pub async fn handle_recommend(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(process_id): Path<Uuid>,
) -> Result<Json<Recommendation>, AppError> {
    let process = sqlx::query_as::<_, ProcessRow>(
        "SELECT * FROM processes WHERE id = $1 AND user_id = $2",
    )
    .bind(process_id)
    .bind(session.user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Process {process_id} not found")))?;

    let steps = sqlx::query_as::<_, InterviewStepRow>(
        "SELECT * FROM interview_steps WHERE process_id = $1 ORDER BY position",
    )
    .bind(process_id)
    .fetch_all(&state.db)
    .await?;

    let context = serde_json::json!({
        "company": process.company,
        "role": process.role,
        "status": process.status,
        "steps": steps.iter().map(|s| serde_json::json!({
            "position": s.position,
            "category": s.category,
            "status": s.status,
            "outcome": s.outcome,
            "notes": s.notes,
        })).collect::<Vec<_>>(),
    });

    let prompt = RECOMMEND_PROMPT_TEMPLATE.replace("{process}", &context.to_string());
    let system = format!("{RECOMMEND_SYSTEM} {JSON_ONLY_RULES}");

    let recommendation = state
        .llm
        .call_json::<Recommendation>(&prompt, &system)
        .await
        .map_err(|e| AppError::Llm(format!("recommendation failed: {e}")))?;

    Ok(Json(recommendation))
}

/// Compact JSON snapshot of everything the user owns, for prompt context.
async fn gather_user_context(
    state: &AppState,
    user_id: Uuid,
) -> Result<serde_json::Value, AppError> {
    let processes = sqlx::query_as::<_, ProcessRow>(
        "SELECT * FROM processes WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    let steps = sqlx::query_as::<_, InterviewStepRow>(
        r#"
        SELECT s.* FROM interview_steps s
        JOIN processes p ON p.id = s.process_id
        WHERE p.user_id = $1
        ORDER BY s.process_id, s.position
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    let achievements = sqlx::query_as::<_, AchievementRow>(
        "SELECT * FROM achievements WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(serde_json::json!({
        "processes": processes.iter().map(|p| serde_json::json!({
            "id": p.id,
            "company": p.company,
            "role": p.role,
            "status": p.status,
        })).collect::<Vec<_>>(),
        "steps": steps.iter().map(|s| serde_json::json!({
            "process_id": s.process_id,
            "position": s.position,
            "category": s.category,
            "status": s.status,
            "scheduled_at": s.scheduled_at,
            "outcome": s.outcome,
        })).collect::<Vec<_>>(),
        "achievements": achievements.iter().map(|a| serde_json::json!({
            "title": a.title,
            "tags": a.tags,
            "achieved_on": a.achieved_on,
        })).collect::<Vec<_>>(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_deserializes() {
        let json = r#"{
            "recommendation": "Prepare a system design walkthrough before the onsite.",
            "suggested_category": "onsite"
        }"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.suggested_category, "onsite");
    }
}
