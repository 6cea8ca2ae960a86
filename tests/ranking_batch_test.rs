// ABOUTME: Batch ranking through the engine: stored ranks, partitions, privacy
// ABOUTME: Reads assigned ranks back through the stats record after each pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use chrono::{NaiveDate, Utc};
use fitrank::models::{ActivityLevel, Gender, Period, PrivacyUpdate};

// ============================================================================
// Batch Coverage
// ============================================================================

#[tokio::test]
async fn test_full_batch_covers_every_period_and_scope() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "solo").await;

    common::log_meal(db, user_id, 500.0, Utc::now()).await;
    engine.refresh_stats(user_id).await.unwrap();

    let summary = engine.recompute_all_rankings().await;

    // 4 periods x 4 scopes, every unit ranks the one visible user
    assert_eq!(summary.outcomes.len(), 16);
    assert_eq!(summary.completed_units(), 16);
    assert_eq!(summary.failed_units(), 0);
    assert!(summary.outcomes.iter().all(|o| o.users_ranked == 1));
}

#[tokio::test]
async fn test_single_period_pass_leaves_other_periods_untouched() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "weekly_only").await;

    common::log_meal(db, user_id, 500.0, Utc::now()).await;
    engine.refresh_stats(user_id).await.unwrap();

    let outcomes = engine.recompute_rankings(Period::Weekly).await;
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.error.is_none()));

    let stats = db.get_user_stats(user_id).await.unwrap().unwrap();
    assert_eq!(stats.rankings.weekly.global_rank, Some(1));
    assert_eq!(stats.rankings.monthly.global_rank, None);
}

// ============================================================================
// Stored Rank Order
// ============================================================================

#[tokio::test]
async fn test_stored_ranks_follow_refreshed_scores() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let gold = common::seed_profile(db, "gold").await;
    let silver = common::seed_profile(db, "silver").await;
    let bronze = common::seed_profile(db, "bronze").await;
    for (user_id, burn) in [(gold, 900.0), (silver, 600.0), (bronze, 300.0)] {
        common::log_meal(db, user_id, 400.0, now).await;
        common::log_run(db, user_id, burn, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    engine.recompute_all_rankings().await;

    let gold_stats = db.get_user_stats(gold).await.unwrap().unwrap();
    let silver_stats = db.get_user_stats(silver).await.unwrap().unwrap();
    let bronze_stats = db.get_user_stats(bronze).await.unwrap().unwrap();
    assert_eq!(gold_stats.rankings.weekly.global_rank, Some(1));
    assert_eq!(silver_stats.rankings.weekly.global_rank, Some(2));
    assert_eq!(bronze_stats.rankings.weekly.global_rank, Some(3));

    // The same data ranks every period identically
    assert_eq!(gold_stats.rankings.all_time.global_rank, Some(1));
    assert_eq!(bronze_stats.rankings.all_time.global_rank, Some(3));
}

#[tokio::test]
async fn test_gender_partitions_restart_at_one() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();
    let birthdate = NaiveDate::from_ymd_opt(1994, 6, 1);

    let alice = common::seed_profile_with(
        db,
        "alice",
        Gender::Female,
        birthdate,
        ActivityLevel::ModeratelyActive,
    )
    .await;
    let beth = common::seed_profile_with(
        db,
        "beth",
        Gender::Female,
        birthdate,
        ActivityLevel::ModeratelyActive,
    )
    .await;
    let bob = common::seed_profile_with(
        db,
        "bob",
        Gender::Male,
        birthdate,
        ActivityLevel::ModeratelyActive,
    )
    .await;
    for (user_id, burn) in [(alice, 900.0), (bob, 600.0), (beth, 300.0)] {
        common::log_run(db, user_id, burn, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    engine.recompute_all_rankings().await;

    let alice_ranks = db.get_user_stats(alice).await.unwrap().unwrap().rankings;
    let bob_ranks = db.get_user_stats(bob).await.unwrap().unwrap().rankings;
    let beth_ranks = db.get_user_stats(beth).await.unwrap().unwrap().rankings;

    assert_eq!(alice_ranks.weekly.global_rank, Some(1));
    assert_eq!(bob_ranks.weekly.global_rank, Some(2));
    assert_eq!(beth_ranks.weekly.global_rank, Some(3));

    // Each gender bracket ranks independently from 1
    assert_eq!(alice_ranks.weekly.gender_rank, Some(1));
    assert_eq!(bob_ranks.weekly.gender_rank, Some(1));
    assert_eq!(beth_ranks.weekly.gender_rank, Some(2));
}

#[tokio::test]
async fn test_hidden_user_is_left_unranked() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let visible = common::seed_profile(db, "visible").await;
    let hidden = common::seed_profile(db, "hidden").await;
    for (user_id, burn) in [(visible, 300.0), (hidden, 900.0)] {
        common::log_run(db, user_id, burn, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    engine
        .update_privacy(
            hidden,
            &PrivacyUpdate {
                show_on_leaderboard: Some(false),
                show_real_name: None,
                show_to_friends_only: None,
            },
        )
        .await
        .unwrap();

    engine.recompute_all_rankings().await;

    let visible_stats = db.get_user_stats(visible).await.unwrap().unwrap();
    let hidden_stats = db.get_user_stats(hidden).await.unwrap().unwrap();
    assert_eq!(visible_stats.rankings.weekly.global_rank, Some(1));
    assert_eq!(hidden_stats.rankings.weekly.global_rank, None);
}
