//! Coupon redemption: creating a submission consumes its coupon exactly
//! once, and deleting a submission hands the coupon back.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{
    coupon::{Coupon, CouponStatus},
    reward::Reward,
    submission::{CreateSubmissionData, Submission},
};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PHONE_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 500;
const MAX_EXPERIENCE_LEN: usize = 2000;

/// A redemption request. Free-text fields arrive already sanitized by the
/// transport layer; only structural constraints are checked here.
#[derive(Debug, Clone)]
pub struct CreateSubmissionRequest {
    pub coupon_code: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub product_experience: Option<String>,
    pub selected_reward_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub additional_data: Option<JsonValue>,
}

/// Redeems a coupon by creating the submission that consumes it.
///
/// Protocol:
/// 1. Validate the coupon is redeemable (lazy expiry happens here).
/// 2. Reject if a submission already references the coupon.
/// 3. Validate the selected catalog reward is active.
/// 4. In one transaction: insert the submission and mark the coupon
///    REDEEMED pointing back at it.
///
/// The unique key on submissions.coupon_id is the final arbiter when two
/// requests pass the pre-checks concurrently; the loser's constraint
/// violation is converted to the same conflict as the pre-check.
#[tracing::instrument(skip(pool, clock, request), fields(coupon_code = %request.coupon_code))]
pub async fn create_submission(
    pool: &PgPool,
    clock: &Clock,
    request: CreateSubmissionRequest,
) -> Result<Submission> {
    validate_fields(&request)?;

    let coupon = validate_coupon_for_redemption(pool, clock, &request.coupon_code).await?;

    if Submission::find_by_coupon_id(pool, coupon.id).await?.is_some() {
        return Err(AppError::Conflict("coupon already redeemed".to_string()));
    }

    let reward = Reward::find_by_id(pool, request.selected_reward_id)
        .await?
        .ok_or_else(|| AppError::NotFound("selected reward not found".to_string()))?;

    if !reward.is_active {
        return Err(AppError::InvalidState(
            "selected reward is not active".to_string(),
        ));
    }

    let now = clock.now();
    let data = CreateSubmissionData {
        coupon_id: coupon.id,
        name: request.name,
        email: request.email,
        phone: request.phone,
        address: request.address,
        product_experience: request.product_experience,
        selected_reward_id: request.selected_reward_id,
        ip_address: request.ip_address,
        user_agent: request.user_agent,
        additional_data: request.additional_data,
    };

    let mut tx = pool.begin().await?;

    let submission = match Submission::insert(&mut tx, &data, now).await {
        Ok(submission) => submission,
        Err(e) if is_unique_violation(&e) => {
            // A concurrent redemption committed between the pre-check and
            // our insert; the constraint is the arbiter.
            return Err(AppError::Conflict("coupon already redeemed".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Coupon::mark_redeemed(&mut tx, coupon.id, submission.id, now).await?;

    tx.commit().await?;

    tracing::info!(
        submission_id = submission.id,
        coupon_id = coupon.id,
        "Coupon redeemed"
    );

    Ok(submission)
}

/// Deletes a submission and compensates by resetting its coupon to ACTIVE.
/// Submissions holding an assigned reward are retained for audit and must
/// be unassigned first.
#[tracing::instrument(skip(pool))]
pub async fn delete_submission(pool: &PgPool, submission_id: i64) -> Result<()> {
    let submission = Submission::find_by_id(pool, submission_id)
        .await?
        .ok_or_else(|| AppError::NotFound("submission not found".to_string()))?;

    if submission.assigned_reward_id.is_some() {
        return Err(AppError::Conflict(
            "submission has an assigned reward; unassign it first".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    Submission::delete(&mut tx, submission.id).await?;
    Coupon::reset_to_active(&mut tx, submission.coupon_id).await?;

    tx.commit().await?;

    tracing::info!(
        submission_id = submission.id,
        coupon_id = submission.coupon_id,
        "Submission deleted, coupon returned to pool"
    );

    Ok(())
}

/// Looks up a coupon and checks it can be redeemed right now. An ACTIVE
/// coupon past its expiry is flipped to EXPIRED as a side effect; this lazy
/// check is the only place coupon expiry is enforced.
async fn validate_coupon_for_redemption(
    pool: &PgPool,
    clock: &Clock,
    code: &str,
) -> Result<Coupon> {
    let coupon = Coupon::find_by_code(pool, code)
        .await?
        .ok_or_else(|| AppError::NotFound("coupon not found".to_string()))?;

    match coupon.status {
        CouponStatus::Active => {
            if let Some(expires_at) = coupon.expires_at {
                if expires_at < clock.now() {
                    Coupon::mark_expired(pool, coupon.id).await?;
                    tracing::info!(coupon_id = coupon.id, "Coupon expired at redemption time");
                    return Err(AppError::InvalidState("coupon has expired".to_string()));
                }
            }
            Ok(coupon)
        }
        CouponStatus::Redeemed => Err(AppError::Conflict("coupon already redeemed".to_string())),
        status => Err(AppError::InvalidState(format!(
            "coupon is not redeemable (status: {status})"
        ))),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn validate_fields(request: &CreateSubmissionRequest) -> Result<()> {
    required("coupon_code", &request.coupon_code)?;
    required("name", &request.name)?;
    required("email", &request.email)?;
    required("phone", &request.phone)?;
    required("address", &request.address)?;

    max_len("name", &request.name, MAX_NAME_LEN)?;
    max_len("email", &request.email, MAX_EMAIL_LEN)?;
    max_len("phone", &request.phone, MAX_PHONE_LEN)?;
    max_len("address", &request.address, MAX_ADDRESS_LEN)?;

    if let Some(experience) = &request.product_experience {
        max_len("product_experience", experience, MAX_EXPERIENCE_LEN)?;
    }

    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "email is not a valid address".to_string(),
        ));
    }

    Ok(())
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} exceeds maximum length of {max}"
        )));
    }
    Ok(())
}
