use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::api::AppState;
use crate::error::Result;
use crate::models::Submission;
use crate::services::{assignment, redemption};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(create_submission))
        .route("/admin/submissions", get(list_submissions))
        .route("/admin/submissions/:id", get(get_submission))
        .route("/admin/submissions/:id", delete(delete_submission))
        .route("/admin/submissions/:id/reward", put(assign_reward))
        .route("/admin/submissions/:id/reward", delete(unassign_reward))
}

#[derive(Debug, Deserialize)]
struct CreateSubmissionBody {
    coupon_code: String,
    name: String,
    email: String,
    phone: String,
    address: String,
    product_experience: Option<String>,
    selected_reward_id: i64,
    additional_data: Option<JsonValue>,
}

/// Public redemption endpoint: consumes a coupon code and records the
/// submission. Free-text fields are sanitized upstream.
async fn create_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateSubmissionBody>,
) -> Result<(StatusCode, Json<Submission>)> {
    let request = redemption::CreateSubmissionRequest {
        coupon_code: body.coupon_code,
        name: body.name,
        email: body.email,
        phone: body.phone,
        address: body.address,
        product_experience: body.product_experience,
        selected_reward_id: body.selected_reward_id,
        ip_address: header_value(&headers, "x-forwarded-for"),
        user_agent: header_value(&headers, "user-agent"),
        additional_data: body.additional_data,
    };

    let submission = redemption::create_submission(&state.pool, &state.clock, request).await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Submission>>> {
    let submissions = Submission::list(
        &state.pool,
        params.limit.unwrap_or(50).clamp(1, 200),
        params.offset.unwrap_or(0).max(0),
    )
    .await?;

    Ok(Json(submissions))
}

async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Submission>> {
    let submission = Submission::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::error::AppError::NotFound("submission not found".to_string()))?;

    Ok(Json(submission))
}

async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    redemption::delete_submission(&state.pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AssignRewardBody {
    reward_account_id: i64,
    admin_id: i64,
    notes: Option<String>,
}

async fn assign_reward(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AssignRewardBody>,
) -> Result<Json<Submission>> {
    let submission = assignment::assign_reward(
        &state.pool,
        &state.clock,
        id,
        body.reward_account_id,
        body.admin_id,
        body.notes,
    )
    .await?;

    Ok(Json(submission))
}

async fn unassign_reward(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Submission>> {
    let submission = assignment::unassign_reward(&state.pool, &state.clock, id).await?;

    Ok(Json(submission))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
