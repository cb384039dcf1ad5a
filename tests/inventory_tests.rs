mod helpers;

use chrono::Duration;

use rafflebox::error::AppError;
use rafflebox::models::{reward_account::RewardAccountStatus, RewardAccount};
use rafflebox::services::{encryption, inventory};

use helpers::*;

#[tokio::test]
async fn created_account_stores_ciphertext_and_roundtrips_credentials() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let key = test_cipher_key();

    let account = inventory::create_account(
        &pool,
        &fixed_clock(),
        &key,
        inventory::CreateRewardAccountRequest {
            service_name: "Streamly".to_string(),
            account_type: "premium".to_string(),
            credentials: "user: winner / pass: hunter2".to_string(),
            subscription_duration: Some("12 months".to_string()),
            description: None,
            category: "music".to_string(),
            created_by: 1,
        },
    )
    .await
    .expect("creation should succeed");

    assert_eq!(account.status, RewardAccountStatus::Available);
    assert_ne!(
        account.encrypted_credentials,
        b"user: winner / pass: hunter2".to_vec()
    );

    let plaintext = inventory::get_credentials(&pool, &key, account.id)
        .await
        .expect("retrieval should succeed");
    assert_eq!(plaintext, "user: winner / pass: hunter2");
}

#[tokio::test]
async fn credentials_fail_closed_under_wrong_key() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;

    let account = seed_reward_account(&pool, "Streamly", "music", "AVAILABLE", None, None).await;

    let wrong_key = encryption::derive_key("some-other-key");
    let err = inventory::get_credentials(&pool, &wrong_key, account.id)
        .await
        .expect_err("wrong key must not decrypt");
    assert!(matches!(err, AppError::Encryption(_)));
}

#[tokio::test]
async fn deactivate_and_reactivate_cycle_available_account() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    let account = seed_reward_account(&pool, "Streamly", "music", "AVAILABLE", None, None).await;

    let account = inventory::deactivate_account(&pool, &clock, account.id)
        .await
        .expect("deactivation should succeed");
    assert_eq!(account.status, RewardAccountStatus::Deactivated);

    let account = inventory::reactivate_account(&pool, &clock, account.id)
        .await
        .expect("reactivation should succeed");
    assert_eq!(account.status, RewardAccountStatus::Available);
}

#[tokio::test]
async fn deactivating_or_reactivating_assigned_account_conflicts() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    let reward = seed_reward(&pool, "Music subscription", true).await;
    seed_coupon(&pool, "HOLDER001", "ACTIVE", None).await;
    let submission = redeem(&pool, "HOLDER001", reward.id).await;
    let account = seed_reward_account(&pool, "Streamly", "music", "AVAILABLE", None, None).await;

    rafflebox::services::assignment::assign_reward(
        &pool,
        &clock,
        submission.id,
        account.id,
        1,
        None,
    )
    .await
    .expect("assignment should succeed");

    let err = inventory::deactivate_account(&pool, &clock, account.id)
        .await
        .expect_err("assigned account must not deactivate");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = inventory::reactivate_account(&pool, &clock, account.id)
        .await
        .expect_err("assigned account must not reactivate");
    assert!(matches!(err, AppError::Conflict(_)));

    // Assignment survived both rejections.
    let account = RewardAccount::find_by_id(&pool, account.id).await.unwrap().unwrap();
    assert_eq!(account.status, RewardAccountStatus::Assigned);
    assert_eq!(account.assigned_to_user_id, Some(submission.id));
}

#[tokio::test]
async fn reactivating_expired_account_clears_retained_pointer() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    let reward = seed_reward(&pool, "Music subscription", true).await;
    seed_coupon(&pool, "HISTORY01", "ACTIVE", None).await;
    let submission = redeem(&pool, "HISTORY01", reward.id).await;
    let account = seed_reward_account(
        &pool,
        "Streamly",
        "music",
        "EXPIRED",
        Some(submission.id),
        Some(clock.now() - Duration::days(400)),
    )
    .await;

    let account = inventory::reactivate_account(&pool, &clock, account.id)
        .await
        .expect("reactivation should succeed");

    assert_eq!(account.status, RewardAccountStatus::Available);
    assert_eq!(account.assigned_to_user_id, None);
}

#[tokio::test]
async fn expire_sweep_only_touches_accounts_past_retention() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    let reward = seed_reward(&pool, "Music subscription", true).await;
    seed_coupon(&pool, "SWEEP0001", "ACTIVE", None).await;
    seed_coupon(&pool, "SWEEP0002", "ACTIVE", None).await;
    let old_holder = redeem(&pool, "SWEEP0001", reward.id).await;
    let new_holder = redeem(&pool, "SWEEP0002", reward.id).await;

    let old_account = seed_reward_account(
        &pool,
        "Streamly",
        "music",
        "ASSIGNED",
        Some(old_holder.id),
        Some(clock.now() - Duration::days(400)),
    )
    .await;
    let new_account = seed_reward_account(
        &pool,
        "Filmhaus",
        "video",
        "ASSIGNED",
        Some(new_holder.id),
        Some(clock.now() - Duration::days(10)),
    )
    .await;

    let expired = inventory::expire_sweep(&pool, &clock, 365)
        .await
        .expect("sweep should succeed");
    assert_eq!(expired, 1);

    let old_account = RewardAccount::find_by_id(&pool, old_account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old_account.status, RewardAccountStatus::Expired);
    // Expiry keeps the assignment history.
    assert_eq!(old_account.assigned_to_user_id, Some(old_holder.id));

    let new_account = RewardAccount::find_by_id(&pool, new_account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(new_account.status, RewardAccountStatus::Assigned);
}

#[tokio::test]
async fn can_delete_requires_existing_unassigned_account() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    assert!(!inventory::can_delete(&pool, 4242).await.unwrap());

    let reward = seed_reward(&pool, "Music subscription", true).await;
    seed_coupon(&pool, "DELETE001", "ACTIVE", None).await;
    let submission = redeem(&pool, "DELETE001", reward.id).await;

    let assigned = seed_reward_account(&pool, "Streamly", "music", "AVAILABLE", None, None).await;
    rafflebox::services::assignment::assign_reward(
        &pool,
        &clock,
        submission.id,
        assigned.id,
        1,
        None,
    )
    .await
    .expect("assignment should succeed");

    let free = seed_reward_account(&pool, "Filmhaus", "video", "AVAILABLE", None, None).await;

    assert!(!inventory::can_delete(&pool, assigned.id).await.unwrap());
    assert!(inventory::can_delete(&pool, free.id).await.unwrap());

    let err = inventory::delete_account(&pool, assigned.id)
        .await
        .expect_err("assigned account must not delete");
    assert!(matches!(err, AppError::Conflict(_)));

    inventory::delete_account(&pool, free.id)
        .await
        .expect("unassigned account deletes");
    assert!(RewardAccount::find_by_id(&pool, free.id)
        .await
        .unwrap()
        .is_none());

    let err = inventory::delete_account(&pool, free.id)
        .await
        .expect_err("second delete must fail");
    assert!(matches!(err, AppError::NotFound(_)));
}
