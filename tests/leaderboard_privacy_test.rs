// ABOUTME: Privacy and scope filtering tests for leaderboard reads
// ABOUTME: Covers hidden users, partial privacy updates, handles, and demographic brackets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use chrono::{NaiveDate, Utc};
use fitrank::errors::ErrorCode;
use fitrank::leaderboard::PageParams;
use fitrank::models::{
    ActivityLevel, Gender, LeaderboardScope, Period, PrivacyUpdate,
};
use uuid::Uuid;

// ============================================================================
// Visibility
// ============================================================================

#[tokio::test]
async fn test_hidden_users_left_off_every_board() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();

    let alice = common::seed_profile(db, "alice").await;
    let bob = common::seed_profile(db, "bob").await;
    for user_id in [alice, bob] {
        common::log_run(db, user_id, 400.0, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    engine
        .update_privacy(
            bob,
            &PrivacyUpdate {
                show_on_leaderboard: Some(false),
                ..PrivacyUpdate::default()
            },
        )
        .await
        .unwrap();

    let page = engine
        .get_leaderboard(alice, &PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.entries[0].user.user_id, alice);

    let top = engine
        .get_top_performers(Period::Weekly, None)
        .await
        .unwrap();
    assert!(top.by_score.iter().all(|e| e.user.user_id != bob));
    assert!(top.by_calories_burned.iter().all(|e| e.user.user_id != bob));

    let nearby = engine.get_nearby(alice, Period::Weekly, None).await.unwrap();
    assert_eq!(nearby.current_user_rank, 1);
    assert!(nearby.entries.iter().all(|e| e.user.user_id != bob));
}

#[tokio::test]
async fn test_partial_privacy_update_preserves_other_flags() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "quiet_one").await;

    let settings = engine
        .update_privacy(
            user_id,
            &PrivacyUpdate {
                show_real_name: Some(true),
                ..PrivacyUpdate::default()
            },
        )
        .await
        .unwrap();

    // Defaults survive a partial update
    assert!(settings.show_on_leaderboard);
    assert!(settings.show_real_name);
    assert!(!settings.show_to_friends_only);

    let settings = engine
        .update_privacy(
            user_id,
            &PrivacyUpdate {
                show_on_leaderboard: Some(false),
                ..PrivacyUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(!settings.show_on_leaderboard);
    assert!(settings.show_real_name);
}

#[tokio::test]
async fn test_real_name_toggle_changes_board_handle() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let user_id = common::seed_profile(db, "runner42").await;

    common::log_run(db, user_id, 400.0, 1800, Utc::now()).await;
    engine.refresh_stats(user_id).await.unwrap();

    let page = engine
        .get_leaderboard(user_id, &PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].user.handle, "runner42");

    engine
        .update_privacy(
            user_id,
            &PrivacyUpdate {
                show_real_name: Some(true),
                ..PrivacyUpdate::default()
            },
        )
        .await
        .unwrap();

    let page = engine
        .get_leaderboard(user_id, &PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].user.handle, "runner42 (display)");
}

// ============================================================================
// Demographic Scopes
// ============================================================================

#[tokio::test]
async fn test_gender_scope_restricts_to_bracket() {
    let engine = common::create_test_engine().await;
    let db = engine.database();
    let now = Utc::now();
    let birthdate = NaiveDate::from_ymd_opt(1995, 4, 12);

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

    for user_id in [alice, beth, bob] {
        common::log_run(db, user_id, 300.0, 1800, now).await;
        engine.refresh_stats(user_id).await.unwrap();
    }

    let page = engine
        .get_leaderboard(
            alice,
            &PageParams {
                scope: LeaderboardScope::Gender,
                ..PageParams::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 2);
    let ids: Vec<_> = page.entries.iter().map(|e| e.user.user_id).collect();
    assert!(ids.contains(&alice));
    assert!(ids.contains(&beth));
    assert!(!ids.contains(&bob));
}

#[tokio::test]
async fn test_scoped_page_without_stats_is_not_found() {
    let engine = common::create_test_engine().await;
    let db = engine.database();

    // Registered user, but never refreshed: no stats row, so no bracket
    let user_id = common::seed_profile(db, "newcomer").await;

    let err = engine
        .get_leaderboard(
            user_id,
            &PageParams {
                scope: LeaderboardScope::AgeGroup,
                ..PageParams::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    // The global board still serves them, minus their own entry
    let page = engine
        .get_leaderboard(user_id, &PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 0);
    assert!(page.current_user.is_none());
}

#[tokio::test]
async fn test_nearby_without_stats_is_not_found() {
    let engine = common::create_test_engine().await;

    let err = engine
        .get_nearby(Uuid::new_v4(), Period::Weekly, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
