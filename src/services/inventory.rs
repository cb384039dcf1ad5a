//! Reward account inventory: admin-facing lifecycle around the assignment
//! protocol. Credentials are encrypted before persistence and decrypted
//! only for explicit admin retrieval.

use chrono::Duration;
use sqlx::PgPool;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::reward_account::{
    CreateRewardAccountData, RewardAccount, RewardAccountStatus,
};
use crate::services::encryption;

#[derive(Debug, Clone)]
pub struct CreateRewardAccountRequest {
    pub service_name: String,
    pub account_type: String,
    pub credentials: String, // plaintext, never persisted
    pub subscription_duration: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub created_by: i64,
}

/// Creates an inventory account, sealing its credentials first.
#[tracing::instrument(skip(pool, clock, cipher_key, request), fields(service_name = %request.service_name))]
pub async fn create_account(
    pool: &PgPool,
    clock: &Clock,
    cipher_key: &[u8],
    request: CreateRewardAccountRequest,
) -> Result<RewardAccount> {
    for (field, value) in [
        ("service_name", &request.service_name),
        ("account_type", &request.account_type),
        ("credentials", &request.credentials),
        ("category", &request.category),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }

    let encrypted_credentials = encryption::encrypt(&request.credentials, cipher_key)?;

    let account = RewardAccount::create(
        pool,
        CreateRewardAccountData {
            service_name: request.service_name,
            account_type: request.account_type,
            encrypted_credentials,
            subscription_duration: request.subscription_duration,
            description: request.description,
            category: request.category,
            created_by: request.created_by,
        },
        clock.now(),
    )
    .await?;

    tracing::info!(account_id = account.id, "Reward account created");

    Ok(account)
}

/// Decrypts an account's stored credentials for admin retrieval. A failed
/// decrypt (key rotation, corrupted ciphertext) surfaces as a cipher
/// error, never as empty credentials.
pub async fn get_credentials(pool: &PgPool, cipher_key: &[u8], id: i64) -> Result<String> {
    let account = RewardAccount::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("reward account not found".to_string()))?;

    Ok(encryption::decrypt(&account.encrypted_credentials, cipher_key)?)
}

/// Removes a non-ASSIGNED account from the candidate pool.
#[tracing::instrument(skip(pool, clock))]
pub async fn deactivate_account(pool: &PgPool, clock: &Clock, id: i64) -> Result<RewardAccount> {
    let rows = RewardAccount::deactivate(pool, id, clock.now()).await?;
    if rows == 0 {
        return Err(status_conflict(pool, id, "cannot be deactivated").await?);
    }

    refreshed(pool, id).await
}

/// Returns a non-ASSIGNED account to AVAILABLE, clearing any retained
/// assignment pointer.
#[tracing::instrument(skip(pool, clock))]
pub async fn reactivate_account(pool: &PgPool, clock: &Clock, id: i64) -> Result<RewardAccount> {
    let rows = RewardAccount::reactivate(pool, id, clock.now()).await?;
    if rows == 0 {
        return Err(status_conflict(pool, id, "cannot be reactivated").await?);
    }

    refreshed(pool, id).await
}

/// Sweeps ASSIGNED accounts older than the retention window to EXPIRED.
/// Returns the number of accounts expired.
#[tracing::instrument(skip(pool, clock))]
pub async fn expire_sweep(pool: &PgPool, clock: &Clock, retention_days: i64) -> Result<u64> {
    let now = clock.now();
    let cutoff = now - Duration::days(retention_days);

    let expired = RewardAccount::expire_assigned_before(pool, cutoff, now).await?;

    tracing::info!(expired, retention_days, "Reward account expiry sweep completed");

    Ok(expired)
}

/// Whether the account may be deleted: it must exist and not be ASSIGNED.
pub async fn can_delete(pool: &PgPool, id: i64) -> Result<bool> {
    Ok(RewardAccount::find_by_id(pool, id)
        .await?
        .map(|account| account.status != RewardAccountStatus::Assigned)
        .unwrap_or(false))
}

/// Deletes a non-ASSIGNED account.
#[tracing::instrument(skip(pool))]
pub async fn delete_account(pool: &PgPool, id: i64) -> Result<()> {
    RewardAccount::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("reward account not found".to_string()))?;

    let rows = RewardAccount::delete(pool, id).await?;
    if rows == 0 {
        return Err(status_conflict(pool, id, "cannot be deleted").await?);
    }

    tracing::info!(account_id = id, "Reward account deleted");

    Ok(())
}

/// Builds the conflict (or not-found) error after a conditional update
/// matched zero rows, naming the account's current status.
async fn status_conflict(pool: &PgPool, id: i64, action: &str) -> Result<AppError> {
    Ok(match RewardAccount::find_by_id(pool, id).await? {
        Some(account) => AppError::Conflict(format!(
            "reward account {action} (status: {})",
            account.status
        )),
        None => AppError::NotFound("reward account not found".to_string()),
    })
}

async fn refreshed(pool: &PgPool, id: i64) -> Result<RewardAccount> {
    RewardAccount::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("reward account not found".to_string()))
}
