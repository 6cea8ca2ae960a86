// ABOUTME: Gamification refreshes through the engine: batteries, coins, idempotency
// ABOUTME: No judge key is configured, so every verdict is the baseline fallback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use chrono::Utc;
use fitrank::errors::ErrorCode;
use uuid::Uuid;

// ============================================================================
// Coin Awards
// ============================================================================

#[tokio::test]
async fn test_refresh_mints_coins_from_todays_burn() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "runner").await;

    common::log_run(db, user_id, 300.0, 1800, Utc::now()).await;

    let outcome = engine.refresh_gamification(user_id).await.unwrap();

    // 300 burned calories -> 30 coins, baseline nutrition 50 -> 25 coins
    assert_eq!(outcome.coins_awarded, 55);
    assert_eq!(outcome.today_total_coins, 55);
    assert_eq!(outcome.gamification.coins, 55);
    assert!(outcome.gamification.coins_day.is_some());
}

#[tokio::test]
async fn test_second_refresh_awards_only_the_increment() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "grinder").await;

    common::log_run(db, user_id, 300.0, 1800, Utc::now()).await;
    let first = engine.refresh_gamification(user_id).await.unwrap();
    assert_eq!(first.coins_awarded, 55);

    // A later program session the same day grants only the new burn
    common::log_workout(db, user_id, 100.0, 20, Utc::now()).await;
    let second = engine.refresh_gamification(user_id).await.unwrap();
    assert_eq!(second.coins_awarded, 10);
    assert_eq!(second.gamification.coins, 65);
    assert_eq!(second.today_total_coins, 65);

    // Nothing new, nothing granted
    let third = engine.refresh_gamification(user_id).await.unwrap();
    assert_eq!(third.coins_awarded, 0);
    assert_eq!(third.gamification.coins, 65);
}

#[tokio::test]
async fn test_meals_alone_mint_only_nutrition_coins() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "forkful").await;

    common::log_meal(db, user_id, 800.0, Utc::now()).await;

    let outcome = engine.refresh_gamification(user_id).await.unwrap();

    // Food intake feeds the judge context but never the burn-based coins
    assert_eq!(outcome.coins_awarded, 25);
    assert_eq!(outcome.gamification.batteries.total, 50);
}

#[tokio::test]
async fn test_refreshed_balance_round_trips_through_the_store() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "saver").await;

    common::log_run(db, user_id, 120.0, 900, Utc::now()).await;
    let outcome = engine.refresh_gamification(user_id).await.unwrap();

    let stored = db.get_gamification(user_id).await.unwrap().unwrap();
    assert_eq!(stored.coins, outcome.gamification.coins);
    assert_eq!(stored.batteries.total, outcome.gamification.batteries.total);
    assert_eq!(stored.coins_awarded_today, outcome.today_total_coins);
}

// ============================================================================
// Degraded Operation
// ============================================================================

#[tokio::test]
async fn test_unconfigured_judge_applies_the_baseline_verdict() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "offline").await;

    let outcome = engine.refresh_gamification(user_id).await.unwrap();

    assert_eq!(outcome.gamification.batteries.activity, 50);
    assert_eq!(outcome.gamification.batteries.nutrition, 50);
    assert_eq!(outcome.gamification.batteries.health, 50);
    assert_eq!(outcome.gamification.batteries.sleep, 50);
    assert!(outcome.reasoning.contains("unavailable"));
}

#[tokio::test]
async fn test_refresh_unknown_user_is_not_found() {
    let engine = common::create_test_engine().await;

    let err = engine
        .refresh_gamification(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
