mod common;

use std::sync::Arc;
use std::time::Duration;

use actorrating::ratelimit::{ActionKind, PgCounterStore, RateLimitPolicies, RateLimiter};
use chrono::{TimeDelta, Utc};
use common::setup_db;
use serial_test::serial;

fn limiter(pool: &sqlx::PgPool) -> RateLimiter<PgCounterStore> {
    RateLimiter::new(
        Arc::new(PgCounterStore::new(pool.clone())),
        RateLimitPolicies::reference(),
        Duration::from_secs(5),
    )
}

#[tokio::test]
#[serial]
async fn pg_window_admits_quota_then_denies() {
    let Some(pool) = setup_db().await else { return };
    let limiter = limiter(&pool);
    let now = Utc::now();

    for expected in (0..10).rev() {
        let d = limiter
            .check_rate_limit_at("10.0.0.1", ActionKind::Rating, now)
            .await
            .unwrap();
        assert!(d.allowed);
        assert_eq!(d.remaining, expected);
    }

    let denied = limiter
        .check_rate_limit_at("10.0.0.1", ActionKind::Rating, now)
        .await
        .unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM rate_limit_windows WHERE client_id = $1 AND action = 'rating'",
    )
    .bind("10.0.0.1")
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1, "one row per aligned window");

    let count: i32 = sqlx::query_scalar(
        "SELECT count FROM rate_limit_windows WHERE client_id = $1 AND action = 'rating'",
    )
    .bind("10.0.0.1")
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 10);
}

#[tokio::test]
#[serial]
async fn pg_counters_are_isolated_per_client_and_action() {
    let Some(pool) = setup_db().await else { return };
    let limiter = limiter(&pool);
    let now = Utc::now();

    for _ in 0..5 {
        limiter
            .check_rate_limit_at("a", ActionKind::EmailVerification, now)
            .await
            .unwrap();
    }
    assert!(!limiter
        .check_rate_limit_at("a", ActionKind::EmailVerification, now)
        .await
        .unwrap()
        .allowed);

    assert!(limiter
        .check_rate_limit_at("b", ActionKind::EmailVerification, now)
        .await
        .unwrap()
        .allowed);
    assert!(limiter
        .check_rate_limit_at("a", ActionKind::Signup, now)
        .await
        .unwrap()
        .allowed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn pg_concurrent_callers_never_over_admit() {
    let Some(pool) = setup_db().await else { return };
    let limiter = limiter(&pool);
    let now = Utc::now();

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..40 {
        let limiter = limiter.clone();
        set.spawn(async move {
            limiter
                .check_rate_limit_at("race", ActionKind::Rating, now)
                .await
                .unwrap()
        });
    }

    let mut admitted = 0;
    while let Some(res) = set.join_next().await {
        if res.unwrap().allowed {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 10);

    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(count), 0)::BIGINT FROM rate_limit_windows WHERE client_id = 'race'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total, 10);
}

#[tokio::test]
#[serial]
async fn pg_sweep_deletes_only_expired_windows() {
    let Some(pool) = setup_db().await else { return };
    let limiter = limiter(&pool);

    sqlx::query(
        r#"
        INSERT INTO rate_limit_windows (client_id, action, window_start, count)
        VALUES ('old', 'signup', now() - interval '25 hours', 3),
               ('fresh', 'signup', now() - interval '1 hour', 2)
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let deleted = limiter.sweep(TimeDelta::hours(24)).await.unwrap();
    assert_eq!(deleted, 1);

    let left: Vec<String> =
        sqlx::query_scalar("SELECT client_id FROM rate_limit_windows ORDER BY client_id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(left, vec!["fresh".to_string()]);
}
