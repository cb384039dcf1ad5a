use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::reward::{CreateRewardData, Reward};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rewards", get(list_active_rewards))
        .route("/admin/rewards", post(create_reward))
        .route("/admin/rewards", get(list_all_rewards))
        .route("/admin/rewards/:id/activate", post(activate_reward))
        .route("/admin/rewards/:id/deactivate", post(deactivate_reward))
}

/// Public: the categories a user can pick on the submission form.
async fn list_active_rewards(State(state): State<AppState>) -> Result<Json<Vec<Reward>>> {
    Ok(Json(Reward::list_active(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
struct CreateRewardBody {
    name: String,
    description: Option<String>,
    display_order: Option<i32>,
}

async fn create_reward(
    State(state): State<AppState>,
    Json(body): Json<CreateRewardBody>,
) -> Result<(StatusCode, Json<Reward>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let reward = Reward::create(
        &state.pool,
        CreateRewardData {
            name: body.name,
            description: body.description,
            display_order: body.display_order.unwrap_or(0),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(reward)))
}

async fn list_all_rewards(State(state): State<AppState>) -> Result<Json<Vec<Reward>>> {
    Ok(Json(Reward::list_all(&state.pool).await?))
}

async fn activate_reward(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Reward>> {
    set_active(&state, id, true).await
}

async fn deactivate_reward(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Reward>> {
    set_active(&state, id, false).await
}

async fn set_active(state: &AppState, id: i64, is_active: bool) -> Result<Json<Reward>> {
    let rows = Reward::set_active(&state.pool, id, is_active).await?;
    if rows == 0 {
        return Err(AppError::NotFound("reward not found".to_string()));
    }

    let reward = Reward::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("reward not found".to_string()))?;

    Ok(Json(reward))
}
