// ABOUTME: Composite score formula combining activity, nutrition, goals, and streak bonus
// ABOUTME: Pure functions; the aggregator applies them to every period bucket
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Composite Scoring
//!
//! The composite score is a weighted sum of period activity with a streak
//! multiplier on top:
//!
//! ```text
//! raw = burned * 1.5 / 100
//!     + minutes * 2.0
//!     + meals * 0.5 * 10
//!     + workouts * 3.0 * 50
//!     + goal_days * 5.0 * 20   (every period except daily)
//!
//! score = round(raw * (1 + min(streak * 2, 50) / 100))
//! ```
//!
//! Rounding happens exactly once, after the multiplier. Scores are
//! recomputed from scratch on every aggregation pass, so weight changes
//! take effect on the next refresh without migration.

use crate::constants::scoring::{
    ACTIVITY_MINUTES_WEIGHT, CALORIES_BURNED_DIVISOR, CALORIES_BURNED_WEIGHT, GOAL_DAYS_MULTIPLIER,
    GOAL_DAYS_WEIGHT, MEALS_LOGGED_MULTIPLIER, MEALS_LOGGED_WEIGHT, STREAK_BONUS_PCT_CAP,
    STREAK_BONUS_PCT_PER_DAY, WORKOUTS_MULTIPLIER, WORKOUTS_WEIGHT,
};
use crate::models::{Period, UserStats};

/// Inputs to the composite score for one period window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub calories_burned: f64,
    pub activity_minutes: i64,
    pub meals_logged: i64,
    pub workouts_completed: i64,
    /// Ignored for the daily period
    pub goal_days_achieved: i64,
}

impl ScoreInputs {
    /// Read the scoring inputs for one period off an aggregated record
    #[must_use]
    pub const fn from_stats(stats: &UserStats, period: Period) -> Self {
        Self {
            calories_burned: stats.calories_burned(period),
            activity_minutes: stats.activity_minutes(period),
            meals_logged: stats.meals_logged(period),
            workouts_completed: stats.workouts_completed(period),
            goal_days_achieved: stats.goal_days_achieved(period),
        }
    }
}

/// Streak bonus percentage: 2% per day of the current logging streak,
/// capped at 50%
#[must_use]
pub fn streak_bonus_percent(current_streak: u32) -> u32 {
    (current_streak.saturating_mul(STREAK_BONUS_PCT_PER_DAY)).min(STREAK_BONUS_PCT_CAP)
}

/// Composite score for one period
#[must_use]
pub fn composite_score(period: Period, inputs: &ScoreInputs, current_streak: u32) -> i64 {
    let mut raw = inputs.calories_burned * CALORIES_BURNED_WEIGHT / CALORIES_BURNED_DIVISOR
        + (inputs.activity_minutes as f64) * ACTIVITY_MINUTES_WEIGHT
        + (inputs.meals_logged as f64) * MEALS_LOGGED_WEIGHT * MEALS_LOGGED_MULTIPLIER
        + (inputs.workouts_completed as f64) * WORKOUTS_WEIGHT * WORKOUTS_MULTIPLIER;

    if period != Period::Daily {
        raw += (inputs.goal_days_achieved as f64) * GOAL_DAYS_WEIGHT * GOAL_DAYS_MULTIPLIER;
    }

    let multiplier = 1.0 + f64::from(streak_bonus_percent(current_streak)) / 100.0;
    (raw * multiplier).round() as i64
}

/// Recompute all four period scores onto a stats record
pub fn apply_scores(stats: &mut UserStats) {
    let streak = stats.streaks.current_logging_streak;
    for period in Period::ALL {
        let inputs = ScoreInputs::from_stats(stats, period);
        stats.scores.set(period, composite_score(period, &inputs, streak));
    }
}
