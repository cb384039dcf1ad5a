use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::Result;
use crate::services::statistics::{
    self, CouponStats, RewardAccountStats, RewardPopularity, SubmissionStats, TrendBucket,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/statistics", get(overview))
        .route("/admin/statistics/trends", get(trends))
}

#[derive(Debug, Serialize)]
struct StatisticsOverview {
    coupons: CouponStats,
    submissions: SubmissionStats,
    reward_accounts: RewardAccountStats,
    reward_popularity: Vec<RewardPopularity>,
}

async fn overview(State(state): State<AppState>) -> Result<Json<StatisticsOverview>> {
    let coupons = statistics::coupon_stats(&state.pool).await?;
    let submissions = statistics::submission_stats(&state.pool).await?;
    let reward_accounts = statistics::reward_account_stats(&state.pool).await?;
    let reward_popularity = statistics::reward_popularity(&state.pool).await?;

    Ok(Json(StatisticsOverview {
        coupons,
        submissions,
        reward_accounts,
        reward_popularity,
    }))
}

#[derive(Debug, Deserialize)]
struct TrendParams {
    days: Option<i64>,
}

async fn trends(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Result<Json<Vec<TrendBucket>>> {
    let days = params.days.unwrap_or(30).clamp(1, 365);
    let buckets = statistics::daily_trend(&state.pool, &state.clock, days).await?;

    Ok(Json(buckets))
}
