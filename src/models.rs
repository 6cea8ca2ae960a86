// ABOUTME: Core data models for stats aggregation, scoring, ranking, and achievements
// ABOUTME: Defines UserStats, period buckets, demographics, streaks, and achievement types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Data Models
//!
//! Core data structures shared by every engine module. `UserStats` is the
//! central record: one row per user holding the four period buckets, streak
//! state, cached ranks, composite scores, friends, and privacy settings.
//!
//! ## Design Principles
//!
//! - **Typed keys**: periods, scopes, and metrics are enums, never raw strings;
//!   string forms exist only at the storage and API boundaries
//! - **Serializable**: buckets and streak state persist as JSON columns, so
//!   every nested struct tolerates missing fields on read
//! - **Disjoint ownership**: rank fields are only written by the ranking
//!   assigner, privacy only by privacy updates, and everything else only by
//!   the aggregation pass

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Aggregation period for buckets, scores, and rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl Period {
    /// All periods, in aggregation order
    pub const ALL: [Period; 4] = [
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::AllTime,
    ];

    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::AllTime => "all_time",
        }
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "all_time" => Ok(Self::AllTime),
            _ => Err(AppError::invalid_input(format!("Invalid period: {s}"))),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Scope selector for leaderboard views
///
/// Demographic scopes restrict the board to users sharing the caller's
/// bracket; `Friends` restricts it to the caller and their friend edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    Global,
    AgeGroup,
    Gender,
    FitnessLevel,
    Friends,
}

impl LeaderboardScope {
    /// Convert to string for API echoes and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::AgeGroup => "age_group",
            Self::Gender => "gender",
            Self::FitnessLevel => "fitness_level",
            Self::Friends => "friends",
        }
    }
}

impl FromStr for LeaderboardScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "age_group" => Ok(Self::AgeGroup),
            "gender" => Ok(Self::Gender),
            "fitness_level" => Ok(Self::FitnessLevel),
            "friends" => Ok(Self::Friends),
            _ => Err(AppError::invalid_input(format!(
                "Invalid leaderboard scope: {s}"
            ))),
        }
    }
}

impl Display for LeaderboardScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// The four rank partitions cached per period by the batch ranking assigner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankScope {
    Global,
    AgeGroup,
    Gender,
    FitnessLevel,
}

impl RankScope {
    /// All cached rank scopes
    pub const ALL: [RankScope; 4] = [
        RankScope::Global,
        RankScope::AgeGroup,
        RankScope::Gender,
        RankScope::FitnessLevel,
    ];

    /// Convert to string for logs and outcome summaries
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::AgeGroup => "age_group",
            Self::Gender => "gender",
            Self::FitnessLevel => "fitness_level",
        }
    }
}

impl Display for RankScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Metric a leaderboard view is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    Score,
    CaloriesBurned,
    ActivityMinutes,
    Streak,
}

impl LeaderboardMetric {
    /// Convert to string for API echoes and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::CaloriesBurned => "calories_burned",
            Self::ActivityMinutes => "activity_minutes",
            Self::Streak => "streak",
        }
    }
}

impl FromStr for LeaderboardMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" => Ok(Self::Score),
            "calories_burned" => Ok(Self::CaloriesBurned),
            "activity_minutes" => Ok(Self::ActivityMinutes),
            "streak" => Ok(Self::Streak),
            _ => Err(AppError::invalid_input(format!(
                "Invalid leaderboard metric: {s}"
            ))),
        }
    }
}

impl Display for LeaderboardMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Gender bracket used for demographic partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    PreferNotToSay,
}

impl Gender {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::PreferNotToSay => "prefer_not_to_say",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "male" => Self::Male,
            "female" => Self::Female,
            "other" => Self::Other,
            _ => Self::PreferNotToSay,
        }
    }
}

/// Age bracket derived from the profile birthdate
///
/// Users under 18 or without a birthdate fall into `Unknown` and are never
/// exposed in an age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AgeGroup {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55+")]
    From55Plus,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl AgeGroup {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::From18To24 => "18-24",
            Self::From25To34 => "25-34",
            Self::From35To44 => "35-44",
            Self::From45To54 => "45-54",
            Self::From55Plus => "55+",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "18-24" => Self::From18To24,
            "25-34" => Self::From25To34,
            "35-44" => Self::From35To44,
            "45-54" => Self::From45To54,
            "55+" => Self::From55Plus,
            _ => Self::Unknown,
        }
    }

    /// Bracket for an exact age in years
    #[must_use]
    pub const fn from_age(age: i32) -> Self {
        if age < 18 {
            Self::Unknown
        } else if age <= 24 {
            Self::From18To24
        } else if age <= 34 {
            Self::From25To34
        } else if age <= 44 {
            Self::From35To44
        } else if age <= 54 {
            Self::From45To54
        } else {
            Self::From55Plus
        }
    }

    /// Bracket for a birthdate relative to the given local calendar day
    #[must_use]
    pub fn from_birthdate(birthdate: NaiveDate, today: NaiveDate) -> Self {
        let mut age = today.year() - birthdate.year();
        // Birthday later this year means the age has not incremented yet
        if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
            age -= 1;
        }
        Self::from_age(age)
    }
}

/// Self-reported activity level from the user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::LightlyActive => "lightly_active",
            Self::ModeratelyActive => "moderately_active",
            Self::VeryActive => "very_active",
            Self::ExtremelyActive => "extremely_active",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "lightly_active" => Self::LightlyActive,
            "moderately_active" => Self::ModeratelyActive,
            "very_active" => Self::VeryActive,
            "extremely_active" => Self::ExtremelyActive,
            _ => Self::Sedentary,
        }
    }
}

/// Fitness bracket derived from activity level and weekly workout volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::Beginner,
        }
    }

    /// Derive the bracket from the profile activity level and the weekly
    /// workout count in the freshly aggregated stats
    #[must_use]
    pub fn derive(activity_level: Option<ActivityLevel>, workouts_per_week: i64) -> Self {
        let level = activity_level.unwrap_or_default();
        if matches!(
            level,
            ActivityLevel::VeryActive | ActivityLevel::ExtremelyActive
        ) || workouts_per_week >= 5
        {
            Self::Advanced
        } else if level == ActivityLevel::ModeratelyActive || workouts_per_week >= 3 {
            Self::Intermediate
        } else {
            Self::Beginner
        }
    }
}

/// Demographic brackets cached on the stats row for partition filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Demographics {
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub fitness_level: FitnessLevel,
    /// Free-form region tag, reserved for future partitioning
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "global".to_string()
}

/// Stats for the current local calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyBucket {
    /// Start instant of the window this bucket was derived for
    pub window_start: DateTime<Utc>,
    pub calories_consumed: f64,
    pub calories_burned: f64,
    pub net_calories: f64,
    pub activity_minutes: i64,
    pub meals_logged: i64,
    pub workouts_completed: i64,
    pub water_intake_ml: i64,
    pub steps: i64,
}

impl Default for DailyBucket {
    fn default() -> Self {
        Self::empty(DateTime::UNIX_EPOCH)
    }
}

impl DailyBucket {
    /// Zeroed bucket anchored at the given window start
    #[must_use]
    pub fn empty(window_start: DateTime<Utc>) -> Self {
        Self {
            window_start,
            calories_consumed: 0.0,
            calories_burned: 0.0,
            net_calories: 0.0,
            activity_minutes: 0,
            meals_logged: 0,
            workouts_completed: 0,
            water_intake_ml: 0,
            steps: 0,
        }
    }

    /// Whether any qualifying activity was logged in this window
    #[must_use]
    pub fn has_qualifying_activity(&self) -> bool {
        self.meals_logged > 0 || self.workouts_completed > 0
    }
}

/// Stats for the current week or month window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodBucket {
    /// Start instant of the window this bucket was derived for
    pub window_start: DateTime<Utc>,
    pub calories_consumed: f64,
    pub calories_burned: f64,
    pub net_calories: f64,
    pub activity_minutes: i64,
    pub meals_logged: i64,
    pub workouts_completed: i64,
    pub water_intake_ml: i64,
    pub steps: i64,
    pub goal_days_achieved: i64,
}

impl Default for PeriodBucket {
    fn default() -> Self {
        Self::empty(DateTime::UNIX_EPOCH)
    }
}

impl PeriodBucket {
    /// Zeroed bucket anchored at the given window start
    #[must_use]
    pub fn empty(window_start: DateTime<Utc>) -> Self {
        Self {
            window_start,
            calories_consumed: 0.0,
            calories_burned: 0.0,
            net_calories: 0.0,
            activity_minutes: 0,
            meals_logged: 0,
            workouts_completed: 0,
            water_intake_ml: 0,
            steps: 0,
            goal_days_achieved: 0,
        }
    }
}

/// Lifetime totals; field names carry the `total_` prefix by convention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AllTimeBucket {
    pub total_calories_consumed: f64,
    pub total_calories_burned: f64,
    pub total_activity_minutes: i64,
    pub total_meals_logged: i64,
    pub total_workouts_completed: i64,
    pub total_water_intake_ml: i64,
    pub total_steps: i64,
    pub total_goal_days_achieved: i64,
}

/// Streak state
///
/// The hydration streak has no feeding source yet and stays at its defaults;
/// it is kept so stored shapes remain complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Streaks {
    pub current_logging_streak: u32,
    pub longest_logging_streak: u32,
    pub last_log_date: Option<DateTime<Utc>>,
    pub current_goal_streak: u32,
    pub longest_goal_streak: u32,
    pub current_water_streak: u32,
    pub longest_water_streak: u32,
}

/// Cached ranks for one period, one slot per scope
///
/// `None` means the batch assigner has not ranked this user yet, or the user
/// was hidden at the time of the last run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PeriodRanks {
    pub global_rank: Option<u32>,
    pub age_group_rank: Option<u32>,
    pub gender_rank: Option<u32>,
    pub fitness_level_rank: Option<u32>,
}

impl PeriodRanks {
    /// Rank for one scope
    #[must_use]
    pub const fn get(&self, scope: RankScope) -> Option<u32> {
        match scope {
            RankScope::Global => self.global_rank,
            RankScope::AgeGroup => self.age_group_rank,
            RankScope::Gender => self.gender_rank,
            RankScope::FitnessLevel => self.fitness_level_rank,
        }
    }

    /// Set the rank for one scope
    pub fn set(&mut self, scope: RankScope, rank: Option<u32>) {
        match scope {
            RankScope::Global => self.global_rank = rank,
            RankScope::AgeGroup => self.age_group_rank = rank,
            RankScope::Gender => self.gender_rank = rank,
            RankScope::FitnessLevel => self.fitness_level_rank = rank,
        }
    }
}

/// Cached ranks across all four periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Rankings {
    pub daily: PeriodRanks,
    pub weekly: PeriodRanks,
    pub monthly: PeriodRanks,
    pub all_time: PeriodRanks,
}

impl Rankings {
    /// Ranks for one period
    #[must_use]
    pub const fn for_period(&self, period: Period) -> &PeriodRanks {
        match period {
            Period::Daily => &self.daily,
            Period::Weekly => &self.weekly,
            Period::Monthly => &self.monthly,
            Period::AllTime => &self.all_time,
        }
    }

    /// Mutable ranks for one period
    pub fn for_period_mut(&mut self, period: Period) -> &mut PeriodRanks {
        match period {
            Period::Daily => &mut self.daily,
            Period::Weekly => &mut self.weekly,
            Period::Monthly => &mut self.monthly,
            Period::AllTime => &mut self.all_time,
        }
    }
}

/// Composite scores per period, recomputed on every aggregation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Scores {
    pub daily_score: i64,
    pub weekly_score: i64,
    pub monthly_score: i64,
    pub all_time_score: i64,
}

impl Scores {
    /// Score for one period
    #[must_use]
    pub const fn for_period(&self, period: Period) -> i64 {
        match period {
            Period::Daily => self.daily_score,
            Period::Weekly => self.weekly_score,
            Period::Monthly => self.monthly_score,
            Period::AllTime => self.all_time_score,
        }
    }

    /// Set the score for one period
    pub fn set(&mut self, period: Period, score: i64) {
        match period {
            Period::Daily => self.daily_score = score,
            Period::Weekly => self.weekly_score = score,
            Period::Monthly => self.monthly_score = score,
            Period::AllTime => self.all_time_score = score,
        }
    }
}

/// Leaderboard privacy settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    /// Hidden users are excluded from every board, rank count, and batch run
    pub show_on_leaderboard: bool,
    /// Show the profile display name instead of the username handle
    pub show_real_name: bool,
    /// Stored preference; enforcement is left to the embedding API layer
    pub show_to_friends_only: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_on_leaderboard: true,
            show_real_name: false,
            show_to_friends_only: false,
        }
    }
}

/// Partial privacy update; `None` fields keep their stored value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PrivacyUpdate {
    pub show_on_leaderboard: Option<bool>,
    pub show_real_name: Option<bool>,
    pub show_to_friends_only: Option<bool>,
}

/// Aggregated per-user statistics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub demographics: Demographics,
    pub daily: DailyBucket,
    pub weekly: PeriodBucket,
    pub monthly: PeriodBucket,
    pub all_time: AllTimeBucket,
    pub streaks: Streaks,
    pub rankings: Rankings,
    pub scores: Scores,
    pub friends: Vec<Uuid>,
    pub privacy: PrivacySettings,
    pub last_updated: DateTime<Utc>,
}

impl UserStats {
    /// Fresh record with zeroed buckets anchored at the given window starts
    #[must_use]
    pub fn empty(
        user_id: Uuid,
        daily_start: DateTime<Utc>,
        weekly_start: DateTime<Utc>,
        monthly_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            demographics: Demographics::default(),
            daily: DailyBucket::empty(daily_start),
            weekly: PeriodBucket::empty(weekly_start),
            monthly: PeriodBucket::empty(monthly_start),
            all_time: AllTimeBucket::default(),
            streaks: Streaks::default(),
            rankings: Rankings::default(),
            scores: Scores::default(),
            friends: Vec::new(),
            privacy: PrivacySettings::default(),
            last_updated: now,
        }
    }

    /// Composite score for one period
    #[must_use]
    pub const fn score(&self, period: Period) -> i64 {
        self.scores.for_period(period)
    }

    /// Calories burned in one period window
    #[must_use]
    pub const fn calories_burned(&self, period: Period) -> f64 {
        match period {
            Period::Daily => self.daily.calories_burned,
            Period::Weekly => self.weekly.calories_burned,
            Period::Monthly => self.monthly.calories_burned,
            Period::AllTime => self.all_time.total_calories_burned,
        }
    }

    /// Activity minutes in one period window
    #[must_use]
    pub const fn activity_minutes(&self, period: Period) -> i64 {
        match period {
            Period::Daily => self.daily.activity_minutes,
            Period::Weekly => self.weekly.activity_minutes,
            Period::Monthly => self.monthly.activity_minutes,
            Period::AllTime => self.all_time.total_activity_minutes,
        }
    }

    /// Meals logged in one period window
    #[must_use]
    pub const fn meals_logged(&self, period: Period) -> i64 {
        match period {
            Period::Daily => self.daily.meals_logged,
            Period::Weekly => self.weekly.meals_logged,
            Period::Monthly => self.monthly.meals_logged,
            Period::AllTime => self.all_time.total_meals_logged,
        }
    }

    /// Workouts completed in one period window
    #[must_use]
    pub const fn workouts_completed(&self, period: Period) -> i64 {
        match period {
            Period::Daily => self.daily.workouts_completed,
            Period::Weekly => self.weekly.workouts_completed,
            Period::Monthly => self.monthly.workouts_completed,
            Period::AllTime => self.all_time.total_workouts_completed,
        }
    }

    /// Goal days achieved in one period window; the daily bucket tracks no
    /// goal days, so it reports zero
    #[must_use]
    pub const fn goal_days_achieved(&self, period: Period) -> i64 {
        match period {
            Period::Daily => 0,
            Period::Weekly => self.weekly.goal_days_achieved,
            Period::Monthly => self.monthly.goal_days_achieved,
            Period::AllTime => self.all_time.total_goal_days_achieved,
        }
    }

    /// Value of a leaderboard metric for this user, matching the ordering
    /// expression the leaderboard queries sort by
    #[must_use]
    pub fn metric_value(&self, period: Period, metric: LeaderboardMetric) -> f64 {
        match metric {
            LeaderboardMetric::Score => self.score(period) as f64,
            LeaderboardMetric::CaloriesBurned => self.calories_burned(period),
            LeaderboardMetric::ActivityMinutes => self.activity_minutes(period) as f64,
            LeaderboardMetric::Streak => f64::from(self.streaks.current_logging_streak),
        }
    }
}

/// Read model over the external user profile store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    /// Public handle shown when the real name is withheld
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: Option<Gender>,
    pub birthdate: Option<NaiveDate>,
    pub activity_level: Option<ActivityLevel>,
    pub sleep_hours: Option<f64>,
    pub bmi: Option<f64>,
    pub health_conditions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Daily calorie-balance ledger verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    OnTarget,
    Over,
    Under,
}

impl LedgerStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnTarget => "on_target",
            Self::Over => "over",
            Self::Under => "under",
        }
    }
}

/// Achievement catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Workout,
    Nutrition,
    Health,
    Program,
    Streak,
    Milestone,
    Social,
    Leaderboard,
}

impl AchievementCategory {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Workout => "workout",
            Self::Nutrition => "nutrition",
            Self::Health => "health",
            Self::Program => "program",
            Self::Streak => "streak",
            Self::Milestone => "milestone",
            Self::Social => "social",
            Self::Leaderboard => "leaderboard",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "workout" => Self::Workout,
            "nutrition" => Self::Nutrition,
            "health" => Self::Health,
            "program" => Self::Program,
            "streak" => Self::Streak,
            "social" => Self::Social,
            "leaderboard" => Self::Leaderboard,
            _ => Self::Milestone,
        }
    }
}

/// How an achievement criterion is satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    /// Reach a cumulative event count
    Count,
    /// Cross a cumulative numeric threshold
    Threshold,
    /// Sustain a streak length
    Streak,
    /// Complete a one-off action
    Completion,
}

impl CriterionKind {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Threshold => "threshold",
            Self::Streak => "streak",
            Self::Completion => "completion",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "threshold" => Self::Threshold,
            "streak" => Self::Streak,
            "completion" => Self::Completion,
            _ => Self::Count,
        }
    }
}

/// Achievement tier, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl AchievementTier {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
            Self::Diamond => "diamond",
        }
    }

    /// Parse from string, defaulting rather than erroring on unknown values
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "silver" => Self::Silver,
            "gold" => Self::Gold,
            "platinum" => Self::Platinum,
            "diamond" => Self::Diamond,
            _ => Self::Bronze,
        }
    }
}

/// Metric keys the evaluator knows how to read off a stats record
///
/// Catalog entries may carry keys outside this set (rank movement, social
/// engagement); those entries simply never progress until an evaluator
/// version learns their key. That is deliberate forward compatibility, not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementMetricKey {
    MealsLogged,
    CaloriesBurned,
    WorkoutsCompleted,
    LoggingStreak,
    LongestStreak,
    GoalDays,
    ActivityMinutes,
    WeeklyCaloriesBurned,
    FriendsCount,
}

impl AchievementMetricKey {
    /// Convert to the catalog string form
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MealsLogged => "meals_logged",
            Self::CaloriesBurned => "calories_burned",
            Self::WorkoutsCompleted => "workouts_completed",
            Self::LoggingStreak => "logging_streak",
            Self::LongestStreak => "longest_streak",
            Self::GoalDays => "goal_days",
            Self::ActivityMinutes => "activity_minutes",
            Self::WeeklyCaloriesBurned => "weekly_calories_burned",
            Self::FriendsCount => "friends_count",
        }
    }

    /// Parse a catalog metric key; `None` marks a key this evaluator skips
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "meals_logged" => Some(Self::MealsLogged),
            "calories_burned" => Some(Self::CaloriesBurned),
            "workouts_completed" => Some(Self::WorkoutsCompleted),
            "logging_streak" => Some(Self::LoggingStreak),
            "longest_streak" => Some(Self::LongestStreak),
            "goal_days" => Some(Self::GoalDays),
            "activity_minutes" => Some(Self::ActivityMinutes),
            "weekly_calories_burned" => Some(Self::WeeklyCaloriesBurned),
            "friends_count" => Some(Self::FriendsCount),
            _ => None,
        }
    }

    /// Current progress value for this metric, floored to whole units
    #[must_use]
    pub fn progress(&self, stats: &UserStats) -> i64 {
        match self {
            Self::MealsLogged => stats.all_time.total_meals_logged,
            Self::CaloriesBurned => stats.all_time.total_calories_burned.floor() as i64,
            Self::WorkoutsCompleted => stats.all_time.total_workouts_completed,
            Self::LoggingStreak => i64::from(stats.streaks.current_logging_streak),
            Self::LongestStreak => i64::from(stats.streaks.longest_logging_streak),
            Self::GoalDays => stats.all_time.total_goal_days_achieved,
            Self::ActivityMinutes => stats.all_time.total_activity_minutes,
            Self::WeeklyCaloriesBurned => stats.weekly.calories_burned.floor() as i64,
            Self::FriendsCount => stats.friends.len() as i64,
        }
    }
}

/// Criterion attached to a catalog achievement
///
/// `metric` stays a free string so the catalog can carry keys this engine
/// version does not evaluate yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementCriteria {
    pub kind: CriterionKind,
    pub target: i64,
    pub metric: String,
}

/// Catalog achievement definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub icon: Option<String>,
    pub badge_image: Option<String>,
    pub criteria: AchievementCriteria,
    pub points: i64,
    pub tier: AchievementTier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user progress row against one catalog achievement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub progress: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary of an achievement completed during an evaluation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedAchievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub tier: AchievementTier,
    pub points: i64,
}

/// Battery levels (0-100) produced by the AI judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Batteries {
    pub activity: u8,
    pub nutrition: u8,
    pub health: u8,
    pub sleep: u8,
    /// Rounded mean of the four category levels
    pub total: u8,
}

impl Batteries {
    /// Build from category levels, deriving the total
    #[must_use]
    pub fn from_levels(activity: u8, nutrition: u8, health: u8, sleep: u8) -> Self {
        let sum = u32::from(activity) + u32::from(nutrition) + u32::from(health) + u32::from(sleep);
        let total = ((sum as f64) / 4.0).round() as u8;
        Self {
            activity,
            nutrition,
            health,
            sleep,
            total,
        }
    }
}

/// Engine-owned gamification state per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGamification {
    pub user_id: Uuid,
    /// Lifetime coin balance
    pub coins: i64,
    pub batteries: Batteries,
    /// Coins already granted for the current local day
    pub coins_awarded_today: i64,
    /// Start of the local day `coins_awarded_today` belongs to
    pub coins_day: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UserGamification {
    /// Fresh record with a zero balance
    #[must_use]
    pub fn empty(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            coins: 0,
            batteries: Batteries::default(),
            coins_awarded_today: 0,
            coins_day: None,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_round_trip() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        assert!("hourly".parse::<Period>().is_err());
    }

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(17), AgeGroup::Unknown);
        assert_eq!(AgeGroup::from_age(18), AgeGroup::From18To24);
        assert_eq!(AgeGroup::from_age(24), AgeGroup::From18To24);
        assert_eq!(AgeGroup::from_age(25), AgeGroup::From25To34);
        assert_eq!(AgeGroup::from_age(54), AgeGroup::From45To54);
        assert_eq!(AgeGroup::from_age(55), AgeGroup::From55Plus);
        assert_eq!(AgeGroup::from_age(80), AgeGroup::From55Plus);
    }

    #[test]
    fn test_age_group_respects_upcoming_birthday() {
        let birthdate = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();

        // Day before the 25th birthday the user is still 24
        let before = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        assert_eq!(
            AgeGroup::from_birthdate(birthdate, before),
            AgeGroup::From18To24
        );

        let on_birthday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(
            AgeGroup::from_birthdate(birthdate, on_birthday),
            AgeGroup::From25To34
        );
    }

    #[test]
    fn test_fitness_level_rules() {
        assert_eq!(
            FitnessLevel::derive(Some(ActivityLevel::ExtremelyActive), 0),
            FitnessLevel::Advanced
        );
        assert_eq!(
            FitnessLevel::derive(Some(ActivityLevel::Sedentary), 5),
            FitnessLevel::Advanced
        );
        assert_eq!(
            FitnessLevel::derive(Some(ActivityLevel::ModeratelyActive), 0),
            FitnessLevel::Intermediate
        );
        assert_eq!(FitnessLevel::derive(None, 3), FitnessLevel::Intermediate);
        assert_eq!(FitnessLevel::derive(None, 2), FitnessLevel::Beginner);
    }

    #[test]
    fn test_metric_key_parse_skips_unknown() {
        assert_eq!(
            AchievementMetricKey::parse("meals_logged"),
            Some(AchievementMetricKey::MealsLogged)
        );
        assert_eq!(AchievementMetricKey::parse("weekly_rank"), None);
        assert_eq!(AchievementMetricKey::parse("total_likes"), None);
    }

    #[test]
    fn test_metric_value_reads_period_bucket() {
        let now = Utc::now();
        let mut stats = UserStats::empty(Uuid::new_v4(), now, now, now, now);
        stats.weekly.calories_burned = 420.5;
        stats.scores.weekly_score = 87;
        stats.streaks.current_logging_streak = 6;

        assert!(
            (stats.metric_value(Period::Weekly, LeaderboardMetric::CaloriesBurned) - 420.5).abs()
                < f64::EPSILON
        );
        assert!(
            (stats.metric_value(Period::Weekly, LeaderboardMetric::Score) - 87.0).abs()
                < f64::EPSILON
        );
        assert!(
            (stats.metric_value(Period::Daily, LeaderboardMetric::Streak) - 6.0).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn test_batteries_total_is_rounded_mean() {
        let batteries = Batteries::from_levels(80, 70, 61, 90);
        // (80 + 70 + 61 + 90) / 4 = 75.25
        assert_eq!(batteries.total, 75);

        let uneven = Batteries::from_levels(50, 50, 50, 51);
        // 50.25 rounds down, 50.75 would round up
        assert_eq!(uneven.total, 50);
    }

    #[test]
    fn test_bucket_json_tolerates_missing_fields() {
        let json = r#"{"window_start":"2026-02-03T00:00:00Z","meals_logged":4}"#;
        let bucket: DailyBucket = serde_json::from_str(json).unwrap();
        assert_eq!(bucket.meals_logged, 4);
        assert_eq!(bucket.workouts_completed, 0);
        assert!(bucket.has_qualifying_activity());
    }
}
