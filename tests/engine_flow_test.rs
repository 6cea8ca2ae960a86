// ABOUTME: End-to-end engine tests: ingest sources, refresh stats, read leaderboards
// ABOUTME: Exercises the public StatsEngine surface over an in-memory store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use chrono::{Duration, Utc};
use fitrank::leaderboard::PageParams;
use fitrank::models::{LeaderboardMetric, LeaderboardScope, Period};

// ============================================================================
// Aggregation Flow
// ============================================================================

#[tokio::test]
async fn test_ingest_to_stats_flow() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "alice").await;

    let now = Utc::now();
    common::log_meal(db, user_id, 450.0, now).await;
    common::log_meal(db, user_id, 550.0, now).await;
    common::log_run(db, user_id, 300.0, 1800, now).await;
    common::log_workout(db, user_id, 150.0, 25, now).await;

    let outcome = engine.refresh_stats(user_id).await.unwrap();
    let stats = &outcome.stats;

    assert_eq!(stats.daily.meals_logged, 2);
    assert_eq!(stats.daily.workouts_completed, 2);
    assert!((stats.daily.calories_consumed - 1000.0).abs() < f64::EPSILON);
    assert!((stats.daily.calories_burned - 450.0).abs() < f64::EPSILON);
    assert_eq!(stats.daily.activity_minutes, 55);
    assert!((stats.daily.net_calories - 550.0).abs() < f64::EPSILON);

    // Everything landed today, so every window agrees
    assert_eq!(stats.weekly.meals_logged, 2);
    assert_eq!(stats.monthly.workouts_completed, 2);
    assert_eq!(stats.all_time.total_meals_logged, 2);
    assert_eq!(stats.all_time.total_activity_minutes, 55);

    // Logging today opens a one-day streak
    assert_eq!(stats.streaks.current_logging_streak, 1);
    assert_eq!(stats.streaks.longest_logging_streak, 1);

    assert!(stats.scores.daily_score > 0);
    assert!(stats.scores.all_time_score > 0);
}

#[tokio::test]
async fn test_old_records_count_toward_all_time_only() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "bob").await;

    let now = Utc::now();
    common::log_meal(db, user_id, 500.0, now - Duration::days(8)).await;
    common::log_meal(db, user_id, 400.0, now).await;

    let stats = engine.refresh_stats(user_id).await.unwrap().stats;

    assert_eq!(stats.daily.meals_logged, 1);
    assert_eq!(stats.weekly.meals_logged, 1);
    assert_eq!(stats.all_time.total_meals_logged, 2);
    assert!((stats.all_time.total_calories_consumed - 900.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_refresh_is_deterministic_for_unchanged_sources() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "carol").await;

    let now = Utc::now();
    common::log_meal(db, user_id, 600.0, now).await;
    common::log_run(db, user_id, 250.0, 1200, now).await;

    let first = engine.refresh_stats(user_id).await.unwrap().stats;
    let second = engine.refresh_stats(user_id).await.unwrap().stats;

    assert_eq!(first.scores, second.scores);
    assert_eq!(first.daily.meals_logged, second.daily.meals_logged);
    assert_eq!(first.all_time, second.all_time);
    assert_eq!(first.streaks.current_logging_streak, second.streaks.current_logging_streak);
}

#[tokio::test]
async fn test_get_or_create_matches_refresh() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "dora").await;

    common::log_meal(db, user_id, 500.0, Utc::now()).await;

    let refreshed = engine.refresh_stats(user_id).await.unwrap().stats;
    let fetched = engine.get_or_create_stats(user_id).await.unwrap();

    assert_eq!(fetched.user_id, user_id);
    assert_eq!(fetched.scores, refreshed.scores);
    assert_eq!(fetched.daily.meals_logged, refreshed.daily.meals_logged);
}

#[tokio::test]
async fn test_goal_days_feed_period_buckets() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "goal_setter").await;

    // Today's local date per the engine's boundary policy
    let today = engine.policy().local_date(Utc::now());
    common::mark_goal_day(db, user_id, today).await;

    let stats = engine.refresh_stats(user_id).await.unwrap().stats;
    assert_eq!(stats.weekly.goal_days_achieved, 1);
    assert_eq!(stats.monthly.goal_days_achieved, 1);
    assert_eq!(stats.all_time.total_goal_days_achieved, 1);
    assert_eq!(stats.streaks.current_goal_streak, 1);
}

// ============================================================================
// Leaderboard Reads
// ============================================================================

#[tokio::test]
async fn test_global_board_ranks_by_score() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let alice = common::seed_profile(db, "alice").await;
    let bob = common::seed_profile(db, "bob").await;
    let carol = common::seed_profile(db, "carol").await;

    for (user_id, calories) in [(alice, 500.0), (bob, 300.0), (carol, 100.0)] {
        common::log_meal(db, user_id, 400.0, now).await;
        common::log_run(db, user_id, calories, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    let page = engine
        .get_leaderboard(bob, &PageParams::default())
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.entries.len(), 3);
    assert_eq!(page.entries[0].user.user_id, alice);
    assert_eq!(page.entries[1].user.user_id, bob);
    assert_eq!(page.entries[2].user.user_id, carol);
    for (i, entry) in page.entries.iter().enumerate() {
        assert_eq!(entry.rank, u32::try_from(i).unwrap() + 1);
    }
    assert!(page.entries[0].stats.score > page.entries[1].stats.score);
    assert!(page.entries[1].stats.score > page.entries[2].stats.score);

    assert!(page.entries[1].is_current_user);
    let me = page.current_user.unwrap();
    assert_eq!(me.rank, 2);
    assert_eq!(me.user.user_id, bob);
}

#[tokio::test]
async fn test_pagination_and_off_page_caller() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let alice = common::seed_profile(db, "alice").await;
    let bob = common::seed_profile(db, "bob").await;
    let carol = common::seed_profile(db, "carol").await;

    for (user_id, calories) in [(alice, 900.0), (bob, 600.0), (carol, 300.0)] {
        common::log_run(db, user_id, calories, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    let params = PageParams {
        limit: Some(2),
        ..PageParams::default()
    };
    let first = engine.get_leaderboard(carol, &params).await.unwrap();

    assert_eq!(first.entries.len(), 2);
    assert_eq!(first.pagination.total, 3);
    assert_eq!(first.pagination.total_pages, 2);
    assert!(first.entries.iter().all(|e| !e.is_current_user));

    // The caller is off-page but still gets their own ranked entry
    let me = first.current_user.unwrap();
    assert_eq!(me.user.user_id, carol);
    assert_eq!(me.rank, 3);
    assert!(me.is_current_user);

    let second = engine
        .get_leaderboard(
            carol,
            &PageParams {
                page: 2,
                limit: Some(2),
                ..PageParams::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.entries.len(), 1);
    assert_eq!(second.entries[0].rank, 3);
    assert!(second.entries[0].is_current_user);
}

#[tokio::test]
async fn test_calories_metric_reorders_the_board() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    // High burn, no minutes vs. low burn, many minutes
    let burner = common::seed_profile(db, "burner").await;
    let mover = common::seed_profile(db, "mover").await;

    common::log_run(db, burner, 800.0, 60, now).await;
    common::log_run(db, mover, 200.0, 7200, now).await;
    engine.refresh_stats(burner).await.unwrap();
    engine.refresh_stats(mover).await.unwrap();

    let by_score = engine
        .get_leaderboard(burner, &PageParams::default())
        .await
        .unwrap();
    assert_eq!(by_score.entries[0].user.user_id, mover);

    let by_calories = engine
        .get_leaderboard(
            burner,
            &PageParams {
                metric: LeaderboardMetric::CaloriesBurned,
                ..PageParams::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_calories.entries[0].user.user_id, burner);
    assert_eq!(by_calories.entries[0].rank, 1);
}

#[tokio::test]
async fn test_nearby_window_centers_on_caller() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let mut users = Vec::new();
    for (name, calories) in [
        ("first", 500.0),
        ("second", 400.0),
        ("third", 300.0),
        ("fourth", 200.0),
        ("fifth", 100.0),
    ] {
        let user_id = common::seed_profile(db, name).await;
        common::log_run(db, user_id, calories, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
        users.push(user_id);
    }

    let caller = users[2];
    let view = engine
        .get_nearby(caller, Period::Weekly, Some(1))
        .await
        .unwrap();

    assert_eq!(view.current_user_rank, 3);
    assert_eq!(view.entries.len(), 3);
    assert_eq!(
        view.entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
    assert!(view.entries[1].is_current_user);
    assert_eq!(view.entries[1].user.user_id, caller);
}

#[tokio::test]
async fn test_top_performers_per_metric() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let alice = common::seed_profile(db, "alice").await;
    let bob = common::seed_profile(db, "bob").await;
    let carol = common::seed_profile(db, "carol").await;

    for (user_id, calories) in [(alice, 700.0), (bob, 500.0), (carol, 300.0)] {
        common::log_run(db, user_id, calories, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    let top = engine
        .get_top_performers(Period::Weekly, Some(2))
        .await
        .unwrap();

    assert_eq!(top.period, Period::Weekly);
    assert_eq!(top.by_score.len(), 2);
    assert_eq!(top.by_calories_burned.len(), 2);
    assert_eq!(top.by_score[0].user.user_id, alice);
    assert_eq!(top.by_score[0].rank, 1);
    assert!((top.by_calories_burned[0].value - 700.0).abs() < f64::EPSILON);
    assert!(top.by_score[0].value >= top.by_score[1].value);
}

#[tokio::test]
async fn test_friends_scope_covers_caller_and_friends() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let alice = common::seed_profile(db, "alice").await;
    let bob = common::seed_profile(db, "bob").await;
    let carol = common::seed_profile(db, "carol").await;

    for user_id in [alice, bob, carol] {
        common::log_run(db, user_id, 300.0, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }
    engine.add_friend(alice, bob).await.unwrap();
    engine.refresh_stats(alice).await.unwrap();

    let page = engine
        .get_leaderboard(
            alice,
            &PageParams {
                scope: LeaderboardScope::Friends,
                ..PageParams::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 2);
    let ids: Vec<_> = page.entries.iter().map(|e| e.user.user_id).collect();
    assert!(ids.contains(&alice));
    assert!(ids.contains(&bob));
    assert!(!ids.contains(&carol));
}
