// ABOUTME: Engine constants grouped by domain to keep tuning values in one place
// ABOUTME: Covers scoring weights, scheduler timing, pagination bounds, and judge defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Constants Module
//!
//! Constants are grouped into logical domains rather than being scattered
//! through the modules that consume them. Scoring weights in particular must
//! stay in lockstep across the aggregator and any published description of the
//! score formula, so they live here exactly once.

/// Composite score formula weights and streak bonus bounds
pub mod scoring {
    /// Points per `CALORIES_BURNED_DIVISOR` calories burned
    pub const CALORIES_BURNED_WEIGHT: f64 = 1.5;
    /// Calories burned are scaled down by this divisor before weighting
    pub const CALORIES_BURNED_DIVISOR: f64 = 100.0;
    /// Points per active minute
    pub const ACTIVITY_MINUTES_WEIGHT: f64 = 2.0;
    /// Weight applied to each logged meal
    pub const MEALS_LOGGED_WEIGHT: f64 = 0.5;
    /// Multiplier applied on top of the meal weight
    pub const MEALS_LOGGED_MULTIPLIER: f64 = 10.0;
    /// Weight applied to each completed workout
    pub const WORKOUTS_WEIGHT: f64 = 3.0;
    /// Multiplier applied on top of the workout weight
    pub const WORKOUTS_MULTIPLIER: f64 = 50.0;
    /// Weight applied to each goal day achieved (non-daily periods only)
    pub const GOAL_DAYS_WEIGHT: f64 = 5.0;
    /// Multiplier applied on top of the goal day weight
    pub const GOAL_DAYS_MULTIPLIER: f64 = 20.0;
    /// Bonus percent added per day of the current logging streak
    pub const STREAK_BONUS_PCT_PER_DAY: u32 = 2;
    /// Ceiling on the total streak bonus percent
    pub const STREAK_BONUS_PCT_CAP: u32 = 50;
}

/// Debounce scheduler timing
pub mod scheduler {
    /// Quiet interval between the last queued event and the aggregation pass
    pub const DEFAULT_QUIET_INTERVAL_MS: u64 = 5000;
    /// How long an aggregation pass waits for the per-user lock before conceding
    pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 10;
}

/// Leaderboard pagination and window bounds
pub mod leaderboard {
    /// Page size when the caller does not provide one
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Hard ceiling on the page size a caller can request
    pub const MAX_PAGE_SIZE: u32 = 100;
    /// Neighbors shown on each side of the caller when no range is given
    pub const DEFAULT_NEARBY_RANGE: u32 = 5;
    /// Hard ceiling on the nearby window radius
    pub const MAX_NEARBY_RANGE: u32 = 25;
    /// Entries returned per metric by the top performers view
    pub const DEFAULT_TOP_LIMIT: u32 = 10;
}

/// Battery and coin rules
pub mod gamification {
    /// Calories burned per activity coin
    pub const CALORIES_PER_COIN: f64 = 10.0;
    /// Nutrition battery points per nutrition coin
    pub const NUTRITION_POINTS_PER_COIN: f64 = 2.0;
    /// Neutral battery level substituted when no judgment is available
    pub const FALLBACK_BATTERY_LEVEL: u8 = 50;
    /// Sleep hours assumed when the profile does not record them
    pub const DEFAULT_SLEEP_HOURS: f64 = 7.0;
}

/// AI judge connection defaults
pub mod judge {
    /// Model used when `FITRANK_JUDGE_MODEL` is not set
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
    /// Generative Language API base URL
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// Request timeout when `FITRANK_JUDGE_TIMEOUT_SECS` is not set
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}
