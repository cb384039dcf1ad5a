use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Characters used for generated codes. 0/O and 1/I are excluded so codes
/// survive being read aloud or retyped from print.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CouponStatus {
    Active,
    Redeemed,
    Expired,
    Deactivated,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => "ACTIVE",
            CouponStatus::Redeemed => "REDEEMED",
            CouponStatus::Expired => "EXPIRED",
            CouponStatus::Deactivated => "DEACTIVATED",
        }
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: i64,
    pub coupon_code: String,
    pub batch_id: Option<Uuid>,
    pub code_length: i32,
    pub status: CouponStatus,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub redeemed_by: Option<i64>, // submission id that redeemed this coupon
}

#[derive(Debug, Clone)]
pub struct CreateCouponBatchData {
    pub quantity: u32,
    pub code_length: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: i64,
}

impl Coupon {
    /// Generates a random code from the unambiguous alphabet.
    pub fn generate_code(length: usize) -> String {
        let rng = SystemRandom::new();
        let mut bytes = vec![0u8; length];
        rng.fill(&mut bytes).expect("system RNG unavailable");

        bytes
            .iter()
            .map(|b| CODE_ALPHABET[(*b as usize) % CODE_ALPHABET.len()] as char)
            .collect()
    }

    /// Creates a batch of coupons under one batch id. Regenerates on the
    /// rare code collision with an already-issued coupon.
    pub async fn create_batch(
        pool: &PgPool,
        data: CreateCouponBatchData,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let batch_id = Uuid::new_v4();
        let mut coupons = Vec::with_capacity(data.quantity as usize);

        for _ in 0..data.quantity {
            let coupon = loop {
                let code = Self::generate_code(data.code_length as usize);
                let inserted = sqlx::query_as::<_, Self>(
                    r#"
                    INSERT INTO coupons (coupon_code, batch_id, code_length, created_by, created_at, expires_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (coupon_code) DO NOTHING
                    RETURNING *
                    "#,
                )
                .bind(&code)
                .bind(batch_id)
                .bind(data.code_length as i32)
                .bind(data.created_by)
                .bind(now)
                .bind(data.expires_at)
                .fetch_optional(pool)
                .await?;

                if let Some(coupon) = inserted {
                    break coupon;
                }
            };
            coupons.push(coupon);
        }

        Ok(coupons)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM coupons WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM coupons WHERE coupon_code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Lists coupons, newest first, optionally filtered by status or batch.
    pub async fn list(
        pool: &PgPool,
        status: Option<CouponStatus>,
        batch_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM coupons
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR batch_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(batch_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Flips an ACTIVE coupon to EXPIRED. Conditional on the current status
    /// so a concurrent redemption or deactivation is never overwritten.
    pub async fn mark_expired(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET status = 'EXPIRED'
            WHERE id = $1 AND status = 'ACTIVE'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Marks a coupon redeemed by the given submission. Must run inside the
    /// same transaction as the submission insert; both rows commit together
    /// or neither does.
    pub async fn mark_redeemed(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        submission_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE coupons
            SET status = 'REDEEMED', redeemed_at = $2, redeemed_by = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(submission_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Compensating action for submission deletion: returns the coupon to
    /// the pool. Only valid inside the deletion transaction.
    pub async fn reset_to_active(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE coupons
            SET status = 'ACTIVE', redeemed_at = NULL, redeemed_by = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Takes an ACTIVE coupon out of circulation.
    pub async fn deactivate(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET status = 'DEACTIVATED'
            WHERE id = $1 AND status = 'ACTIVE'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Puts a DEACTIVATED coupon back into circulation.
    pub async fn reactivate(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET status = 'ACTIVE'
            WHERE id = $1 AND status = 'DEACTIVATED'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_by_status(
        pool: &PgPool,
        status: CouponStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM coupons WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM coupons")
            .fetch_one(pool)
            .await
    }
}
