use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::coupon::{Coupon, CouponStatus, CreateCouponBatchData};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/coupons", post(create_batch))
        .route("/admin/coupons", get(list_coupons))
        .route("/admin/coupons/:id", get(get_coupon))
        .route("/admin/coupons/:id/deactivate", post(deactivate_coupon))
        .route("/admin/coupons/:id/reactivate", post(reactivate_coupon))
}

#[derive(Debug, Deserialize)]
struct CreateBatchBody {
    quantity: u32,
    code_length: Option<u32>,
    expires_at: Option<DateTime<Utc>>,
    created_by: i64,
}

#[derive(Debug, Serialize)]
struct CreateBatchResponse {
    batch_id: Option<Uuid>,
    coupons: Vec<Coupon>,
}

async fn create_batch(
    State(state): State<AppState>,
    Json(body): Json<CreateBatchBody>,
) -> Result<(StatusCode, Json<CreateBatchResponse>)> {
    if body.quantity == 0 {
        return Err(AppError::Validation("quantity must be at least 1".to_string()));
    }

    let code_length = body.code_length.unwrap_or(10);
    if code_length < 4 {
        return Err(AppError::Validation(
            "code_length must be at least 4".to_string(),
        ));
    }

    let coupons = Coupon::create_batch(
        &state.pool,
        CreateCouponBatchData {
            quantity: body.quantity,
            code_length,
            expires_at: body.expires_at,
            created_by: body.created_by,
        },
        state.clock.now(),
    )
    .await?;

    tracing::info!(count = coupons.len(), "Coupon batch created");

    let response = CreateBatchResponse {
        batch_id: coupons.first().and_then(|coupon| coupon.batch_id),
        coupons,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<CouponStatus>,
    batch_id: Option<Uuid>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_coupons(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Coupon>>> {
    let coupons = Coupon::list(
        &state.pool,
        params.status,
        params.batch_id,
        params.limit.unwrap_or(50).clamp(1, 500),
        params.offset.unwrap_or(0).max(0),
    )
    .await?;

    Ok(Json(coupons))
}

async fn get_coupon(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Coupon>> {
    let coupon = find_coupon(&state, id).await?;

    Ok(Json(coupon))
}

async fn deactivate_coupon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Coupon>> {
    let rows = Coupon::deactivate(&state.pool, id).await?;
    if rows == 0 {
        let coupon = find_coupon(&state, id).await?;
        return Err(AppError::Conflict(format!(
            "coupon cannot be deactivated (status: {})",
            coupon.status
        )));
    }

    let coupon = find_coupon(&state, id).await?;
    Ok(Json(coupon))
}

async fn reactivate_coupon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Coupon>> {
    let rows = Coupon::reactivate(&state.pool, id).await?;
    if rows == 0 {
        let coupon = find_coupon(&state, id).await?;
        return Err(AppError::Conflict(format!(
            "coupon cannot be reactivated (status: {})",
            coupon.status
        )));
    }

    let coupon = find_coupon(&state, id).await?;
    Ok(Json(coupon))
}

async fn find_coupon(state: &AppState, id: i64) -> Result<Coupon> {
    Coupon::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("coupon not found".to_string()))
}
