// ABOUTME: Shared fixtures for the integration suites: engine setup and source seeding
// ABOUTME: Provides profile, meal, session, and ledger helpers used across test files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(
    dead_code,
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_in_or_patterns
)]

//! Shared fixtures for `fitrank` integration tests.
//!
//! Every suite drives a real [`StatsEngine`] over an in-memory SQLite store.
//! The helpers here seed the activity sources the aggregator reads; the tests
//! themselves only go through the engine's public surface.

use std::sync::Once;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use fitrank::config::{DatabaseUrl, EngineConfig, SchedulerConfig};
use fitrank::database::{
    Database, FoodLogRecord, GeoSessionRecord, LedgerEntry, ProgramSessionRecord,
};
use fitrank::engine::StatsEngine;
use fitrank::models::{
    Achievement, AchievementCategory, AchievementCriteria, AchievementTier, ActivityLevel,
    CriterionKind, Gender, LedgerStatus, UserProfile,
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Engine config pointing at an in-memory store with a short debounce window
pub fn test_config() -> EngineConfig {
    EngineConfig {
        database_url: DatabaseUrl::Memory,
        scheduler: SchedulerConfig {
            quiet_interval_ms: 30,
            lock_timeout_secs: 5,
        },
        ..EngineConfig::default()
    }
}

/// Standard test engine over an in-memory store
pub async fn create_test_engine() -> StatsEngine {
    init_test_logging();
    StatsEngine::connect(&test_config())
        .await
        .expect("engine setup failed")
}

/// Seed a minimal profile and return the new user id
pub async fn seed_profile(db: &Database, username: &str) -> Uuid {
    seed_profile_with(
        db,
        username,
        Gender::Female,
        NaiveDate::from_ymd_opt(1995, 4, 12),
        ActivityLevel::ModeratelyActive,
    )
    .await
}

/// Seed a profile with explicit demographics
pub async fn seed_profile_with(
    db: &Database,
    username: &str,
    gender: Gender,
    birthdate: Option<NaiveDate>,
    activity_level: ActivityLevel,
) -> Uuid {
    let user_id = Uuid::new_v4();
    let profile = UserProfile {
        user_id,
        username: username.to_string(),
        display_name: Some(format!("{username} (display)")),
        avatar_url: None,
        gender: Some(gender),
        birthdate,
        activity_level: Some(activity_level),
        sleep_hours: Some(7.5),
        bmi: Some(22.4),
        health_conditions: vec![],
        created_at: Utc::now(),
    };
    db.upsert_profile(&profile).await.unwrap();
    user_id
}

/// Record one food log entry
pub async fn log_meal(db: &Database, user_id: Uuid, calories: f64, logged_at: DateTime<Utc>) {
    db.record_food_log(&FoodLogRecord {
        id: Uuid::new_v4(),
        user_id,
        name: "meal".into(),
        calories,
        protein_g: 20.0,
        carbs_g: 40.0,
        fat_g: 10.0,
        logged_at,
    })
    .await
    .unwrap();
}

/// Record one outdoor session
pub async fn log_run(
    db: &Database,
    user_id: Uuid,
    calories: f64,
    moving_time_sec: i64,
    completed_at: DateTime<Utc>,
) {
    db.record_geo_session(&GeoSessionRecord {
        id: Uuid::new_v4(),
        user_id,
        activity_type: "run".into(),
        calories_burned: calories,
        moving_time_sec,
        distance_m: 5000.0,
        completed_at,
    })
    .await
    .unwrap();
}

/// Record one guided program session
pub async fn log_workout(
    db: &Database,
    user_id: Uuid,
    calories: f64,
    minutes: i64,
    completed_at: DateTime<Utc>,
) {
    db.record_program_session(&ProgramSessionRecord {
        id: Uuid::new_v4(),
        user_id,
        program_name: Some("Core Strength".into()),
        calories_burned: calories,
        total_duration_minutes: minutes,
        completed_at,
    })
    .await
    .unwrap();
}

/// Mark a calendar day as on-target in the calorie ledger
pub async fn mark_goal_day(db: &Database, user_id: Uuid, entry_date: NaiveDate) {
    db.record_ledger_entry(&LedgerEntry {
        user_id,
        entry_date,
        consumed: 2000.0,
        burned: 400.0,
        status: LedgerStatus::OnTarget,
        target_calories: Some(2100.0),
    })
    .await
    .unwrap();
}

/// Build a count-criterion achievement for catalog tests
pub fn count_achievement(name: &str, metric: &str, target: i64, points: i64) -> Achievement {
    let now = Utc::now();
    Achievement {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("Reach {target} {metric}"),
        category: AchievementCategory::Milestone,
        icon: None,
        badge_image: None,
        criteria: AchievementCriteria {
            kind: CriterionKind::Count,
            target,
            metric: metric.to_string(),
        },
        points,
        tier: AchievementTier::Bronze,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
