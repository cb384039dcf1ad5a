use sqlx::PgPool;

use crate::clock::Clock;
use crate::error::Result;
use crate::services::inventory;

#[derive(Debug)]
pub struct SweepStats {
    pub expired: u64,
    pub retention_days: i64,
}

/// Scheduled wrapper around the inventory expiry sweep. Reward accounts
/// assigned longer than the retention window are moved to EXPIRED; their
/// assignment pointers are retained as history.
pub async fn run_reward_expiry_sweep(pool: &PgPool, retention_days: i64) -> Result<SweepStats> {
    tracing::info!(retention_days, "Starting reward expiry sweep");

    let expired = inventory::expire_sweep(pool, &Clock::System, retention_days).await?;

    let stats = SweepStats {
        expired,
        retention_days,
    };

    tracing::info!(?stats, "Reward expiry sweep finished");

    Ok(stats)
}
