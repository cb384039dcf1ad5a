use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RewardAccountStatus {
    Available,
    Assigned,
    Expired,
    Deactivated,
}

impl RewardAccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardAccountStatus::Available => "AVAILABLE",
            RewardAccountStatus::Assigned => "ASSIGNED",
            RewardAccountStatus::Expired => "EXPIRED",
            RewardAccountStatus::Deactivated => "DEACTIVATED",
        }
    }
}

impl std::fmt::Display for RewardAccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RewardAccount {
    pub id: i64,
    pub service_name: String,
    pub account_type: String,
    #[serde(skip_serializing)] // ciphertext never leaves the backend
    pub encrypted_credentials: Vec<u8>,
    pub subscription_duration: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub status: RewardAccountStatus,
    pub assigned_to_user_id: Option<i64>, // submission id
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRewardAccountData {
    pub service_name: String,
    pub account_type: String,
    pub encrypted_credentials: Vec<u8>,
    pub subscription_duration: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

impl RewardAccount {
    pub async fn create(
        pool: &PgPool,
        data: CreateRewardAccountData,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reward_accounts (
                service_name, account_type, encrypted_credentials,
                subscription_duration, description, category,
                created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&data.service_name)
        .bind(&data.account_type)
        .bind(&data.encrypted_credentials)
        .bind(&data.subscription_duration)
        .bind(&data.description)
        .bind(&data.category)
        .bind(data.created_by)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM reward_accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        status: Option<RewardAccountStatus>,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reward_accounts
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Reserves an AVAILABLE account for a submission. The status condition
    /// in the WHERE clause is the race guard: a losing concurrent reserve
    /// matches zero rows, which the caller must surface as a conflict.
    pub async fn reserve(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        submission_id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reward_accounts
            SET status = 'ASSIGNED',
                assigned_to_user_id = $2,
                assigned_at = $3,
                updated_at = $3
            WHERE id = $1 AND status = 'AVAILABLE'
            "#,
        )
        .bind(id)
        .bind(submission_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// Returns an ASSIGNED account to the pool, clearing its assignment.
    pub async fn release(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reward_accounts
            SET status = 'AVAILABLE',
                assigned_to_user_id = NULL,
                assigned_at = NULL,
                updated_at = $2
            WHERE id = $1 AND status = 'ASSIGNED'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// Takes a non-ASSIGNED account out of the candidate pool. Deactivating
    /// an assigned account would orphan its submission pointer, so the
    /// status condition leaves those rows untouched.
    pub async fn deactivate(pool: &PgPool, id: i64, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reward_accounts
            SET status = 'DEACTIVATED', updated_at = $2
            WHERE id = $1 AND status <> 'ASSIGNED'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Returns a non-ASSIGNED account to AVAILABLE, dropping any retained
    /// assignment pointer (an EXPIRED account keeps its history until it is
    /// explicitly reactivated into the pool).
    pub async fn reactivate(pool: &PgPool, id: i64, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reward_accounts
            SET status = 'AVAILABLE', assigned_to_user_id = NULL, updated_at = $2
            WHERE id = $1 AND status <> 'ASSIGNED'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Batch-expires accounts assigned before the cutoff. Assignment
    /// pointers are retained for history.
    pub async fn expire_assigned_before(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reward_accounts
            SET status = 'EXPIRED', updated_at = $2
            WHERE status = 'ASSIGNED' AND assigned_at < $1
            "#,
        )
        .bind(cutoff)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a non-ASSIGNED account. Conditional for the same reason as
    /// deactivate: an assigned account must be unassigned first.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM reward_accounts
            WHERE id = $1 AND status <> 'ASSIGNED'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_by_status(
        pool: &PgPool,
        status: RewardAccountStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reward_accounts WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reward_accounts")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_category(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM reward_accounts
            GROUP BY category
            ORDER BY category ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
