// ABOUTME: Source-to-stats aggregation pass with per-user write serialization
// ABOUTME: Rebuilds every period bucket from raw activity records on each run
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Stats Aggregator
//!
//! Each pass recomputes a user's stats record from scratch: source records
//! are summed over the current daily, weekly, monthly, and all-time windows,
//! never incremented over a previously stored value. Re-running a pass with
//! no new activity therefore reproduces the same buckets, which is what makes
//! debounced and immediate refreshes safe to mix.
//!
//! A pass is all-or-nothing. Any source read failing aborts the pass before
//! the stats write, and the caller may retry. The independent source reads
//! for each window are issued concurrently and joined before reduction.
//!
//! `UserStats` is a single-writer-per-user resource: passes for the same user
//! serialize behind a per-user async lock, bounded by the configured timeout.
//! Expiry surfaces as the retryable `ConcurrencyConflict`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::{Database, FoodTotals, GeoTotals, ProgramTotals};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{AgeGroup, AllTimeBucket, DailyBucket, FitnessLevel, PeriodBucket, UserStats};
use crate::scoring;
use crate::streaks::StreakTracker;
use crate::windows::BoundaryPolicy;

/// Joined source reductions for one window
struct WindowTotals {
    food: FoodTotals,
    geo: GeoTotals,
    program: ProgramTotals,
}

impl WindowTotals {
    /// Outdoor and indoor sessions both burn calories; combine by addition
    fn calories_burned(&self) -> f64 {
        self.geo.calories_burned + self.program.calories_burned
    }

    /// Active minutes from both session sources, rounded once after summing
    fn activity_minutes(&self) -> i64 {
        let geo_minutes = self.geo.moving_time_sec as f64 / 60.0;
        let program_minutes = self.program.duration_minutes as f64;
        (geo_minutes + program_minutes).round() as i64
    }

    fn workouts(&self) -> i64 {
        self.geo.count + self.program.count
    }
}

fn period_bucket(
    window_start: DateTime<Utc>,
    totals: &WindowTotals,
    goal_days: i64,
) -> PeriodBucket {
    PeriodBucket {
        window_start,
        calories_consumed: totals.food.calories,
        calories_burned: totals.calories_burned(),
        net_calories: totals.food.calories - totals.calories_burned(),
        activity_minutes: totals.activity_minutes(),
        meals_logged: totals.food.count,
        workouts_completed: totals.workouts(),
        water_intake_ml: 0,
        steps: 0,
        goal_days_achieved: goal_days,
    }
}

/// Runs the full aggregation pipeline for one user at a time
///
/// Holds the per-user lock registry; clones share it, so every handle to the
/// same aggregator observes the same serialization guarantee.
#[derive(Clone)]
pub struct StatsAggregator {
    db: Database,
    policy: BoundaryPolicy,
    tracker: StreakTracker,
    /// Per-user aggregation locks, created on first use
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    lock_timeout: Duration,
}

impl StatsAggregator {
    /// Create an aggregator over the given store and boundary policy
    #[must_use]
    pub fn new(db: Database, policy: BoundaryPolicy, lock_timeout: Duration) -> Self {
        Self {
            db,
            policy,
            tracker: StreakTracker::new(policy),
            locks: Arc::new(DashMap::new()),
            lock_timeout,
        }
    }

    /// The boundary policy this aggregator derives windows from
    #[must_use]
    pub const fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// Run one aggregation pass and return the refreshed record
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user has no profile,
    /// `ConcurrencyConflict` when the per-user lock cannot be acquired within
    /// the configured timeout, and database errors when a source read or the
    /// stats write fails. No partial stats are written on failure.
    pub async fn aggregate(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<UserStats> {
        let lock = self.user_lock(user_id);
        let Ok(_guard) = tokio::time::timeout(self.lock_timeout, lock.lock()).await else {
            return Err(AppError::conflict(format!(
                "Aggregation pass already in flight for user {user_id}"
            )));
        };
        self.aggregate_locked(user_id, now).await
    }

    /// Refreshed stats, falling back to the stored record when the refresh
    /// fails retryably
    ///
    /// A brand-new user gets a freshly aggregated (and persisted) record.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user has no profile. Other refresh
    /// failures only propagate when no cached record exists to serve instead.
    pub async fn get_or_create(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<UserStats> {
        match self.aggregate(user_id, now).await {
            Ok(stats) => Ok(stats),
            Err(err) if err.code == ErrorCode::ResourceNotFound => Err(err),
            Err(err) => match self.db.get_user_stats(user_id).await? {
                Some(cached) => {
                    warn!(
                        user_id = %user_id,
                        error = %err,
                        "stats refresh failed, serving cached record"
                    );
                    Ok(cached)
                }
                None => Err(err),
            },
        }
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn aggregate_locked(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<UserStats> {
        let profile = self
            .db
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let starts = self.policy.window_starts(now);
        let today = self.policy.local_date(now);

        // Prior record carries streak state, privacy, friends, and rankings
        let prior = self.db.get_user_stats(user_id).await?;

        let (daily, weekly, monthly, lifetime) = tokio::try_join!(
            self.window_totals(user_id, Some(starts.daily), now),
            self.window_totals(user_id, Some(starts.weekly), now),
            self.window_totals(user_id, Some(starts.monthly), now),
            self.window_totals(user_id, None, now),
        )?;

        let (weekly_goal_days, monthly_goal_days, lifetime_goal_days, on_target_days) =
            tokio::try_join!(
                self.db.count_on_target_days(
                    user_id,
                    Some(self.policy.local_date(starts.weekly)),
                    today
                ),
                self.db.count_on_target_days(
                    user_id,
                    Some(self.policy.local_date(starts.monthly)),
                    today
                ),
                self.db.count_on_target_days(user_id, None, today),
                self.db.list_on_target_days(user_id),
            )?;

        let mut stats = prior.unwrap_or_else(|| {
            UserStats::empty(user_id, starts.daily, starts.weekly, starts.monthly, now)
        });

        stats.daily = DailyBucket {
            window_start: starts.daily,
            calories_consumed: daily.food.calories,
            calories_burned: daily.calories_burned(),
            net_calories: daily.food.calories - daily.calories_burned(),
            activity_minutes: daily.activity_minutes(),
            meals_logged: daily.food.count,
            workouts_completed: daily.workouts(),
            water_intake_ml: 0,
            steps: 0,
        };
        stats.weekly = period_bucket(starts.weekly, &weekly, weekly_goal_days);
        stats.monthly = period_bucket(starts.monthly, &monthly, monthly_goal_days);
        stats.all_time = AllTimeBucket {
            total_calories_consumed: lifetime.food.calories,
            total_calories_burned: lifetime.calories_burned(),
            total_activity_minutes: lifetime.activity_minutes(),
            total_meals_logged: lifetime.food.count,
            total_workouts_completed: lifetime.workouts(),
            total_water_intake_ml: 0,
            total_steps: 0,
            total_goal_days_achieved: lifetime_goal_days,
        };

        // Demographics come from the current profile on every pass
        stats.demographics.gender = profile.gender.unwrap_or_default();
        stats.demographics.age_group = profile
            .birthdate
            .map_or(AgeGroup::Unknown, |birthdate| {
                AgeGroup::from_birthdate(birthdate, today)
            });
        stats.demographics.fitness_level =
            FitnessLevel::derive(profile.activity_level, stats.weekly.workouts_completed);

        if stats.daily.has_qualifying_activity() {
            let outcome = self.tracker.apply_logging_event(&mut stats.streaks, now);
            debug!(user_id = %user_id, ?outcome, "logging streak event applied");
        }
        self.tracker
            .apply_goal_ledger(&mut stats.streaks, &on_target_days, now);

        scoring::apply_scores(&mut stats);
        stats.last_updated = now;

        self.db.upsert_stats(&stats).await?;
        debug!(
            user_id = %user_id,
            weekly_score = stats.scores.weekly_score,
            "aggregation pass complete"
        );
        Ok(stats)
    }

    async fn window_totals(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> AppResult<WindowTotals> {
        let (food, geo, program) = tokio::try_join!(
            self.db.sum_food_logs(user_id, start, end),
            self.db.sum_geo_sessions(user_id, start, end),
            self.db.sum_program_sessions(user_id, start, end),
        )?;
        Ok(WindowTotals { food, geo, program })
    }
}
