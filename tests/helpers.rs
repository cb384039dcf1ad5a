// Shared helpers for the integration tests. Tests run against a disposable
// Postgres database; set TEST_DATABASE_URL to point somewhere safe.

use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::{Mutex, MutexGuard};

use rafflebox::clock::Clock;
use rafflebox::models::{
    coupon::Coupon, reward::Reward, reward_account::RewardAccount, submission::Submission,
};
use rafflebox::services::{encryption, redemption};

static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes the tests in one binary: each test truncates the shared
/// database, so two running at once would eat each other's rows.
pub async fn db_lock() -> MutexGuard<'static, ()> {
    DB_LOCK.get_or_init(|| Mutex::new(())).lock().await
}

pub async fn setup_test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/rafflebox_test".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to test database");

    rafflebox::db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    clean_database(&pool).await;

    pool
}

pub async fn clean_database(pool: &PgPool) {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            submissions,
            coupons,
            reward_accounts,
            rewards
        RESTART IDENTITY CASCADE;
        "#,
    )
    .execute(pool)
    .await
    .expect("failed to clean test database");
}

/// Pinned clock so timestamps written by the engine are predictable.
pub fn fixed_clock() -> Clock {
    Clock::Fixed(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap())
}

pub fn test_cipher_key() -> [u8; 32] {
    encryption::derive_key("integration-test-cipher-key")
}

pub async fn seed_reward(pool: &PgPool, name: &str, is_active: bool) -> Reward {
    sqlx::query_as::<_, Reward>(
        r#"
        INSERT INTO rewards (name, is_active)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .expect("failed to seed reward")
}

pub async fn seed_coupon(
    pool: &PgPool,
    code: &str,
    status: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Coupon {
    sqlx::query_as::<_, Coupon>(
        r#"
        INSERT INTO coupons (coupon_code, code_length, status, created_by, created_at, expires_at)
        VALUES ($1, $2, $3, 1, $4, $5)
        RETURNING *
        "#,
    )
    .bind(code)
    .bind(code.len() as i32)
    .bind(status)
    .bind(fixed_clock().now())
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .expect("failed to seed coupon")
}

pub async fn seed_reward_account(
    pool: &PgPool,
    service_name: &str,
    category: &str,
    status: &str,
    assigned_to_user_id: Option<i64>,
    assigned_at: Option<DateTime<Utc>>,
) -> RewardAccount {
    let encrypted = encryption::encrypt("seed-credentials", &test_cipher_key())
        .expect("failed to encrypt seed credentials");

    sqlx::query_as::<_, RewardAccount>(
        r#"
        INSERT INTO reward_accounts (
            service_name, account_type, encrypted_credentials, category,
            status, assigned_to_user_id, assigned_at, created_by, created_at, updated_at
        )
        VALUES ($1, 'premium', $2, $3, $4, $5, $6, 1, $7, $7)
        RETURNING *
        "#,
    )
    .bind(service_name)
    .bind(encrypted)
    .bind(category)
    .bind(status)
    .bind(assigned_to_user_id)
    .bind(assigned_at)
    .bind(fixed_clock().now())
    .fetch_one(pool)
    .await
    .expect("failed to seed reward account")
}

pub fn submission_request(code: &str, selected_reward_id: i64) -> redemption::CreateSubmissionRequest {
    redemption::CreateSubmissionRequest {
        coupon_code: code.to_string(),
        name: "Alice Example".to_string(),
        email: "alice@example.com".to_string(),
        phone: "+886-900-123-456".to_string(),
        address: "1 Example Road, Taipei".to_string(),
        product_experience: Some("Bought one last spring.".to_string()),
        selected_reward_id,
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("integration-tests".to_string()),
        additional_data: None,
    }
}

/// Redeems a seeded ACTIVE coupon, panicking on failure. For tests that
/// need a submission as a fixture rather than as the thing under test.
pub async fn redeem(pool: &PgPool, code: &str, selected_reward_id: i64) -> Submission {
    redemption::create_submission(pool, &fixed_clock(), submission_request(code, selected_reward_id))
        .await
        .expect("failed to redeem seeded coupon")
}
