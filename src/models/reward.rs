use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Admin-managed reward category a user can pick at submission time.
/// Distinct from a concrete reward account in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reward {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone)]
pub struct CreateRewardData {
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
}

impl Reward {
    pub async fn create(pool: &PgPool, data: CreateRewardData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO rewards (name, description, display_order)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.display_order)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM rewards WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active catalog entries in display order, as shown on the submission form.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM rewards
            WHERE is_active = TRUE
            ORDER BY display_order ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM rewards ORDER BY display_order ASC, id ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn set_active(pool: &PgPool, id: i64, is_active: bool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE rewards SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
