//! Reward assignment: moving a scarce reward account onto a submission and
//! back off it, keeping both sides of the pointer pair consistent.

use sqlx::PgPool;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{reward_account::RewardAccount, submission::Submission};

/// Assigns a reward account to a submission.
///
/// The reserve is a conditional update (`WHERE status = 'AVAILABLE'`): a
/// concurrent assign that loses the race matches zero rows and surfaces as
/// a conflict naming the account's current status, never a silent
/// overwrite. The submission's assignment fields are stamped in the same
/// transaction as the account's status flip.
#[tracing::instrument(skip(pool, clock, notes))]
pub async fn assign_reward(
    pool: &PgPool,
    clock: &Clock,
    submission_id: i64,
    reward_account_id: i64,
    assigned_by: i64,
    notes: Option<String>,
) -> Result<Submission> {
    let submission = Submission::find_by_id(pool, submission_id)
        .await?
        .ok_or_else(|| AppError::NotFound("submission not found".to_string()))?;

    if let Some(existing) = submission.assigned_reward_id {
        return Err(AppError::Conflict(format!(
            "submission already has reward account {existing} assigned; unassign it first"
        )));
    }

    RewardAccount::find_by_id(pool, reward_account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("reward account not found".to_string()))?;

    let now = clock.now();
    let mut tx = pool.begin().await?;

    let reserved =
        RewardAccount::reserve(&mut tx, reward_account_id, submission.id, now).await?;
    if reserved == 0 {
        tx.rollback().await?;
        let status = current_account_status(pool, reward_account_id).await?;
        return Err(AppError::Conflict(format!(
            "reward account is not available (status: {status})"
        )));
    }

    let Some(submission) = Submission::set_assignment(
        &mut tx,
        submission.id,
        reward_account_id,
        assigned_by,
        notes.as_deref(),
        now,
    )
    .await?
    else {
        // A concurrent assign stamped the submission after our pre-check.
        tx.rollback().await?;
        return Err(AppError::Conflict(
            "submission already has a reward assigned".to_string(),
        ));
    };

    tx.commit().await?;

    tracing::info!(
        submission_id = submission.id,
        reward_account_id,
        assigned_by,
        "Reward account assigned"
    );

    Ok(submission)
}

/// Clears a submission's reward assignment and releases the account back
/// to the pool, in one transaction.
#[tracing::instrument(skip(pool, clock))]
pub async fn unassign_reward(
    pool: &PgPool,
    clock: &Clock,
    submission_id: i64,
) -> Result<Submission> {
    let submission = Submission::find_by_id(pool, submission_id)
        .await?
        .ok_or_else(|| AppError::NotFound("submission not found".to_string()))?;

    let reward_account_id = submission.assigned_reward_id.ok_or_else(|| {
        AppError::InvalidState("submission has no assigned reward".to_string())
    })?;

    let now = clock.now();
    let mut tx = pool.begin().await?;

    let Some(submission) =
        Submission::clear_assignment(&mut tx, submission.id, reward_account_id).await?
    else {
        // A concurrent unassign (or reassign) got there first.
        tx.rollback().await?;
        return Err(AppError::Conflict(
            "submission assignment changed concurrently".to_string(),
        ));
    };

    let released = RewardAccount::release(&mut tx, reward_account_id, now).await?;
    if released == 0 {
        tx.rollback().await?;
        let status = current_account_status(pool, reward_account_id).await?;
        return Err(AppError::Conflict(format!(
            "reward account is not assigned (status: {status})"
        )));
    }

    tx.commit().await?;

    tracing::info!(
        submission_id = submission.id,
        reward_account_id,
        "Reward account released"
    );

    Ok(submission)
}

async fn current_account_status(pool: &PgPool, reward_account_id: i64) -> Result<String> {
    Ok(RewardAccount::find_by_id(pool, reward_account_id)
        .await?
        .map(|account| account.status.to_string())
        .unwrap_or_else(|| "DELETED".to_string()))
}
