use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i64,
    pub coupon_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub product_experience: Option<String>,
    pub selected_reward_id: i64, // catalog entry the user asked for
    pub submitted_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub additional_data: Option<JsonValue>,
    pub assigned_reward_id: Option<i64>, // concrete reward account, if any
    pub reward_assigned_at: Option<DateTime<Utc>>,
    pub reward_assigned_by: Option<i64>,
    pub assignment_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateSubmissionData {
    pub coupon_id: i64,
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

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyCount {
    pub day: DateTime<Utc>,
    pub count: i64,
}

impl Submission {
    /// Inserts the submission row. Runs inside the redemption transaction;
    /// the unique key on coupon_id rejects a concurrent double-redeem.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        data: &CreateSubmissionData,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO submissions (
                coupon_id, name, email, phone, address, product_experience,
                selected_reward_id, submitted_at, ip_address, user_agent, additional_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(data.coupon_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.product_experience)
        .bind(data.selected_reward_id)
        .bind(now)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .bind(&data.additional_data)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_coupon_id(
        pool: &PgPool,
        coupon_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM submissions WHERE coupon_id = $1")
            .bind(coupon_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM submissions
            ORDER BY submitted_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Deletes the row. Runs inside the deletion transaction next to the
    /// coupon reset; the service layer has already rejected assigned rows.
    pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Stamps the assignment fields. Runs inside the assignment transaction
    /// together with the reward account's reserve update. Conditional on
    /// the submission being unassigned; a concurrent assign that lost the
    /// race matches no row and gets `None`.
    pub async fn set_assignment(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        reward_account_id: i64,
        assigned_by: i64,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE submissions
            SET assigned_reward_id = $2,
                reward_assigned_at = $3,
                reward_assigned_by = $4,
                assignment_notes = $5
            WHERE id = $1 AND assigned_reward_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reward_account_id)
        .bind(now)
        .bind(assigned_by)
        .bind(notes)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Clears the assignment fields. Runs inside the unassignment
    /// transaction together with the reward account's release update.
    /// Conditional on the submission still holding the expected account.
    pub async fn clear_assignment(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        reward_account_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE submissions
            SET assigned_reward_id = NULL,
                reward_assigned_at = NULL,
                reward_assigned_by = NULL,
                assignment_notes = NULL
            WHERE id = $1 AND assigned_reward_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reward_account_id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions")
            .fetch_one(pool)
            .await
    }

    pub async fn count_assigned(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE assigned_reward_id IS NOT NULL",
        )
        .fetch_one(pool)
        .await
    }

    /// Submissions per day over the trailing window, oldest bucket first.
    /// Days without submissions produce no bucket.
    pub async fn daily_counts(
        pool: &PgPool,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, sqlx::Error> {
        sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT date_trunc('day', submitted_at) AS day, COUNT(*) AS count
            FROM submissions
            WHERE submitted_at >= $1
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(since)
        .fetch_all(pool)
        .await
    }
}
