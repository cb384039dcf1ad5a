//! Read-only aggregation across coupons, submissions, and the reward
//! inventory. No write-path invariants live here; rates are 0 when the
//! denominator is 0 and percentages carry 2 decimals.

use chrono::Duration;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{
    coupon::{Coupon, CouponStatus},
    reward_account::{CategoryCount, RewardAccount, RewardAccountStatus},
    submission::Submission,
};

#[derive(Debug, Serialize)]
pub struct CouponStats {
    pub total: i64,
    pub active: i64,
    pub redeemed: i64,
    pub expired: i64,
    pub deactivated: i64,
    pub redemption_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct SubmissionStats {
    pub total: i64,
    pub assigned: i64,
    pub unassigned: i64,
    pub assignment_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct RewardAccountStats {
    pub total: i64,
    pub available: i64,
    pub assigned: i64,
    pub expired: i64,
    pub deactivated: i64,
    pub assignment_rate: f64,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RewardPopularity {
    pub reward_id: i64,
    pub name: String,
    pub selections: i64,
    #[sqlx(default)]
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct TrendBucket {
    pub day: String, // YYYY-MM-DD
    pub count: i64,
}

pub async fn coupon_stats(pool: &PgPool) -> Result<CouponStats> {
    let total = Coupon::count_all(pool).await?;
    let active = Coupon::count_by_status(pool, CouponStatus::Active).await?;
    let redeemed = Coupon::count_by_status(pool, CouponStatus::Redeemed).await?;
    let expired = Coupon::count_by_status(pool, CouponStatus::Expired).await?;
    let deactivated = Coupon::count_by_status(pool, CouponStatus::Deactivated).await?;

    Ok(CouponStats {
        total,
        active,
        redeemed,
        expired,
        deactivated,
        redemption_rate: rate(redeemed, total),
    })
}

pub async fn submission_stats(pool: &PgPool) -> Result<SubmissionStats> {
    let total = Submission::count_all(pool).await?;
    let assigned = Submission::count_assigned(pool).await?;

    Ok(SubmissionStats {
        total,
        assigned,
        unassigned: total - assigned,
        assignment_rate: rate(assigned, total),
    })
}

pub async fn reward_account_stats(pool: &PgPool) -> Result<RewardAccountStats> {
    let total = RewardAccount::count_all(pool).await?;
    let available = RewardAccount::count_by_status(pool, RewardAccountStatus::Available).await?;
    let assigned = RewardAccount::count_by_status(pool, RewardAccountStatus::Assigned).await?;
    let expired = RewardAccount::count_by_status(pool, RewardAccountStatus::Expired).await?;
    let deactivated =
        RewardAccount::count_by_status(pool, RewardAccountStatus::Deactivated).await?;
    let by_category = RewardAccount::count_by_category(pool).await?;

    Ok(RewardAccountStats {
        total,
        available,
        assigned,
        expired,
        deactivated,
        assignment_rate: rate(assigned, total),
        by_category,
    })
}

/// How often each catalog entry was selected at submission time, as a share
/// of all submissions. Entries nobody selected still appear with 0.
pub async fn reward_popularity(pool: &PgPool) -> Result<Vec<RewardPopularity>> {
    let mut rows = sqlx::query_as::<_, RewardPopularity>(
        r#"
        SELECT r.id AS reward_id, r.name, COUNT(s.id) AS selections
        FROM rewards r
        LEFT JOIN submissions s ON s.selected_reward_id = r.id
        GROUP BY r.id, r.name
        ORDER BY selections DESC, r.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let total: i64 = rows.iter().map(|row| row.selections).sum();
    for row in &mut rows {
        row.percentage = rate(row.selections, total);
    }

    Ok(rows)
}

/// Daily submission counts over the trailing window. Buckets are sparse:
/// days without submissions are omitted.
pub async fn daily_trend(pool: &PgPool, clock: &Clock, days: i64) -> Result<Vec<TrendBucket>> {
    let since = clock.now() - Duration::days(days);

    let buckets = Submission::daily_counts(pool, since)
        .await?
        .into_iter()
        .map(|bucket| TrendBucket {
            day: bucket.day.format("%Y-%m-%d").to_string(),
            count: bucket.count,
        })
        .collect();

    Ok(buckets)
}

/// Percentage share of `part` in `whole`, rounded to 2 decimals; 0 when
/// the denominator is 0.
fn rate(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
