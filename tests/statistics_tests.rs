mod helpers;

use chrono::Duration;

use rafflebox::services::statistics;

use helpers::*;

#[tokio::test]
async fn empty_database_yields_zero_rates_not_errors() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;

    let coupons = statistics::coupon_stats(&pool).await.unwrap();
    assert_eq!(coupons.total, 0);
    assert_eq!(coupons.redemption_rate, 0.0);

    let submissions = statistics::submission_stats(&pool).await.unwrap();
    assert_eq!(submissions.total, 0);
    assert_eq!(submissions.assignment_rate, 0.0);

    let accounts = statistics::reward_account_stats(&pool).await.unwrap();
    assert_eq!(accounts.total, 0);
    assert_eq!(accounts.assignment_rate, 0.0);
    assert!(accounts.by_category.is_empty());
}

#[tokio::test]
async fn coupon_stats_count_statuses_and_redemption_rate() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;

    seed_coupon(&pool, "STATACT01", "ACTIVE", None).await;
    seed_coupon(&pool, "STATACT02", "ACTIVE", None).await;
    seed_coupon(&pool, "STATRED01", "REDEEMED", None).await;
    seed_coupon(&pool, "STATEXP01", "EXPIRED", None).await;

    let stats = statistics::coupon_stats(&pool).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.redeemed, 1);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.deactivated, 0);
    assert_eq!(stats.redemption_rate, 25.0);
}

#[tokio::test]
async fn reward_popularity_shares_sum_over_selections() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;

    let music = seed_reward(&pool, "Music subscription", true).await;
    let video = seed_reward(&pool, "Video subscription", true).await;
    let unloved = seed_reward(&pool, "Magazine", true).await;

    for (code, reward_id) in [
        ("POPCODE01", music.id),
        ("POPCODE02", music.id),
        ("POPCODE03", music.id),
        ("POPCODE04", video.id),
    ] {
        seed_coupon(&pool, code, "ACTIVE", None).await;
        redeem(&pool, code, reward_id).await;
    }

    let popularity = statistics::reward_popularity(&pool).await.unwrap();
    assert_eq!(popularity.len(), 3);

    assert_eq!(popularity[0].reward_id, music.id);
    assert_eq!(popularity[0].selections, 3);
    assert_eq!(popularity[0].percentage, 75.0);

    assert_eq!(popularity[1].reward_id, video.id);
    assert_eq!(popularity[1].selections, 1);
    assert_eq!(popularity[1].percentage, 25.0);

    assert_eq!(popularity[2].reward_id, unloved.id);
    assert_eq!(popularity[2].selections, 0);
    assert_eq!(popularity[2].percentage, 0.0);
}

#[tokio::test]
async fn submission_and_account_stats_track_assignments() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    let reward = seed_reward(&pool, "Music subscription", true).await;
    seed_coupon(&pool, "RATECODE1", "ACTIVE", None).await;
    seed_coupon(&pool, "RATECODE2", "ACTIVE", None).await;
    let winner = redeem(&pool, "RATECODE1", reward.id).await;
    redeem(&pool, "RATECODE2", reward.id).await;

    let account = seed_reward_account(&pool, "Streamly", "music", "AVAILABLE", None, None).await;
    seed_reward_account(&pool, "Filmhaus", "video", "AVAILABLE", None, None).await;

    rafflebox::services::assignment::assign_reward(&pool, &clock, winner.id, account.id, 1, None)
        .await
        .expect("assignment should succeed");

    let submissions = statistics::submission_stats(&pool).await.unwrap();
    assert_eq!(submissions.total, 2);
    assert_eq!(submissions.assigned, 1);
    assert_eq!(submissions.unassigned, 1);
    assert_eq!(submissions.assignment_rate, 50.0);

    let accounts = statistics::reward_account_stats(&pool).await.unwrap();
    assert_eq!(accounts.total, 2);
    assert_eq!(accounts.available, 1);
    assert_eq!(accounts.assigned, 1);
    assert_eq!(accounts.assignment_rate, 50.0);

    let categories: Vec<(String, i64)> = accounts
        .by_category
        .iter()
        .map(|c| (c.category.clone(), c.count))
        .collect();
    assert_eq!(
        categories,
        vec![("music".to_string(), 1), ("video".to_string(), 1)]
    );
}

#[tokio::test]
async fn daily_trend_buckets_by_day_within_window() {
    let _guard = db_lock().await;
    let pool = setup_test_pool().await;
    let clock = fixed_clock();

    let reward = seed_reward(&pool, "Music subscription", true).await;

    // Two submissions today, one three days ago, one outside the window.
    for (code, age_days) in [
        ("TRENDC001", 0i64),
        ("TRENDC002", 0),
        ("TRENDC003", 3),
        ("TRENDC004", 40),
    ] {
        seed_coupon(&pool, code, "ACTIVE", None).await;
        let submission = redeem(&pool, code, reward.id).await;
        let submitted_at = clock.now() - Duration::days(age_days);
        sqlx::query("UPDATE submissions SET submitted_at = $2 WHERE id = $1")
            .bind(submission.id)
            .bind(submitted_at)
            .execute(&pool)
            .await
            .unwrap();
    }

    let buckets = statistics::daily_trend(&pool, &clock, 30).await.unwrap();
    assert_eq!(buckets.len(), 2);

    assert_eq!(buckets[0].day, "2026-01-12");
    assert_eq!(buckets[0].count, 1);
    assert_eq!(buckets[1].day, "2026-01-15");
    assert_eq!(buckets[1].count, 2);
}
