use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::Result;
use crate::models::reward_account::{RewardAccount, RewardAccountStatus};
use crate::services::inventory;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/reward-accounts", post(create_account))
        .route("/admin/reward-accounts", get(list_accounts))
        .route("/admin/reward-accounts/expire-sweep", post(expire_sweep))
        .route("/admin/reward-accounts/:id", get(get_account))
        .route("/admin/reward-accounts/:id", delete(delete_account))
        .route("/admin/reward-accounts/:id/credentials", get(get_credentials))
        .route("/admin/reward-accounts/:id/deactivate", post(deactivate_account))
        .route("/admin/reward-accounts/:id/reactivate", post(reactivate_account))
}

#[derive(Debug, Deserialize)]
struct CreateAccountBody {
    service_name: String,
    account_type: String,
    credentials: String,
    subscription_duration: Option<String>,
    description: Option<String>,
    category: String,
    created_by: i64,
}

async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<CreateAccountBody>,
) -> Result<(StatusCode, Json<RewardAccount>)> {
    let account = inventory::create_account(
        &state.pool,
        &state.clock,
        &state.cipher_key,
        inventory::CreateRewardAccountRequest {
            service_name: body.service_name,
            account_type: body.account_type,
            credentials: body.credentials,
            subscription_duration: body.subscription_duration,
            description: body.description,
            category: body.category,
            created_by: body.created_by,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<RewardAccountStatus>,
    category: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_accounts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RewardAccount>>> {
    let accounts = RewardAccount::list(
        &state.pool,
        params.status,
        params.category.as_deref(),
        params.limit.unwrap_or(50).clamp(1, 200),
        params.offset.unwrap_or(0).max(0),
    )
    .await?;

    Ok(Json(accounts))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RewardAccount>> {
    let account = RewardAccount::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::error::AppError::NotFound("reward account not found".to_string()))?;

    Ok(Json(account))
}

#[derive(Debug, Serialize)]
struct CredentialsResponse {
    credentials: String,
}

/// Admin-only credential retrieval; the one place ciphertext is opened.
async fn get_credentials(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CredentialsResponse>> {
    let credentials = inventory::get_credentials(&state.pool, &state.cipher_key, id).await?;

    Ok(Json(CredentialsResponse { credentials }))
}

async fn deactivate_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RewardAccount>> {
    let account = inventory::deactivate_account(&state.pool, &state.clock, id).await?;

    Ok(Json(account))
}

async fn reactivate_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RewardAccount>> {
    let account = inventory::reactivate_account(&state.pool, &state.clock, id).await?;

    Ok(Json(account))
}

async fn delete_account(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    inventory::delete_account(&state.pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct SweepResponse {
    expired: u64,
}

async fn expire_sweep(State(state): State<AppState>) -> Result<Json<SweepResponse>> {
    let expired = inventory::expire_sweep(
        &state.pool,
        &state.clock,
        state.config.reward_retention_days,
    )
    .await?;

    Ok(Json(SweepResponse { expired }))
}
