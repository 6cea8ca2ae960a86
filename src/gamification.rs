// ABOUTME: Daily gamification refresh: judge batteries, award incremental coins
// ABOUTME: Coin grants are idempotent per local day and survive judge outages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Gamification Refresh
//!
//! Rebuilds a user's battery levels and coin balance from today's activity.
//! The refresh snapshots the current local day (sessions, food logs, profile
//! habits), asks the judge for battery levels, then awards coins for the gap
//! between today's coin target and what was already granted today. Re-running
//! within the same day never double-awards; a new local day starts from zero.
//!
//! Judge failures degrade rather than fail: the baseline verdict is applied
//! and the refresh completes normally.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::gamification::{
    CALORIES_PER_COIN, DEFAULT_SLEEP_HOURS, NUTRITION_POINTS_PER_COIN,
};
use crate::database::{Database, FoodLogRecord, GeoTotals, ProgramTotals};
use crate::errors::{AppError, AppResult};
use crate::judge::{
    fallback_verdict, ActivityContext, GamificationJudge, JudgeContext, JudgeVerdict,
    NutritionContext, ProfileContext, SleepContext,
};
use crate::models::{Batteries, UserGamification, UserProfile};
use crate::windows::BoundaryPolicy;

/// Result of one gamification refresh
#[derive(Debug, Clone, Serialize)]
pub struct GamificationOutcome {
    pub gamification: UserGamification,
    /// The judge's explanation for the battery levels
    pub reasoning: String,
    /// Coins granted by this refresh
    pub coins_awarded: i64,
    /// Coins granted today in total, including earlier refreshes
    pub today_total_coins: i64,
}

/// Refreshes battery levels and coin balances
#[derive(Clone)]
pub struct GamificationService {
    db: Database,
    policy: BoundaryPolicy,
    judge: Arc<dyn GamificationJudge>,
}

impl GamificationService {
    pub fn new(db: Database, policy: BoundaryPolicy, judge: Arc<dyn GamificationJudge>) -> Self {
        Self { db, policy, judge }
    }

    /// Refresh one user's gamification state as of `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or a database operation
    /// fails. Judge failures are absorbed with the baseline verdict.
    pub async fn refresh(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<GamificationOutcome> {
        let profile = self
            .db
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")).with_user_id(user_id))?;

        let day_start = self.policy.day_start(now);
        let (geo, program, food) = tokio::try_join!(
            self.db.sum_geo_sessions(user_id, Some(day_start), now),
            self.db.sum_program_sessions(user_id, Some(day_start), now),
            self.db.list_food_logs(user_id, day_start, now),
        )?;

        // Coin math uses the raw burn; the context rounds for readability
        let raw_burned = geo.calories_burned + program.calories_burned;
        let context = self.build_context(&profile, now, &geo, &program, &food);

        debug!(user_id = %user_id, "requesting battery verdict for today");
        let verdict = match self.judge.evaluate(&context).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "judge evaluation failed, applying baseline verdict");
                fallback_verdict()
            }
        };

        let batteries = Batteries::from_levels(
            verdict.activity,
            verdict.nutrition,
            verdict.health,
            verdict.sleep,
        );
        let target = coin_target(raw_burned, &verdict);

        let mut record = self
            .db
            .get_gamification(user_id)
            .await?
            .unwrap_or_else(|| UserGamification::empty(user_id, now));

        // Coins already granted for this local day; a day change resets it
        let prior = if record.coins_day == Some(day_start) {
            record.coins_awarded_today
        } else {
            0
        };
        let awarded = (target - prior).max(0);

        record.coins += awarded;
        record.batteries = batteries;
        record.coins_awarded_today = prior + awarded;
        record.coins_day = Some(day_start);
        record.updated_at = now;
        self.db.upsert_gamification(&record).await?;

        info!(
            user_id = %user_id,
            coins_awarded = awarded,
            battery_total = batteries.total,
            "gamification refreshed"
        );

        Ok(GamificationOutcome {
            today_total_coins: record.coins_awarded_today,
            gamification: record,
            reasoning: verdict.reasoning,
            coins_awarded: awarded,
        })
    }

    fn build_context(
        &self,
        profile: &UserProfile,
        now: DateTime<Utc>,
        geo: &GeoTotals,
        program: &ProgramTotals,
        food: &[FoodLogRecord],
    ) -> JudgeContext {
        let calories_burned = geo.calories_burned + program.calories_burned;
        let active_minutes = geo.moving_time_sec as f64 / 60.0 + program.duration_minutes as f64;

        let mut nutrition = NutritionContext {
            total_calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            items: Vec::with_capacity(food.len()),
        };
        for entry in food {
            nutrition.total_calories += entry.calories;
            nutrition.protein += entry.protein_g;
            nutrition.carbs += entry.carbs_g;
            nutrition.fat += entry.fat_g;
            nutrition.items.push(entry.name.clone());
        }

        let today = self.policy.local_date(now);
        JudgeContext {
            user_profile: ProfileContext {
                age: profile.birthdate.and_then(|birth| today.years_since(birth)),
                gender: profile.gender,
                bmi: profile.bmi,
                activity_level: profile.activity_level,
                health_conditions: profile.health_conditions.clone(),
            },
            activity: ActivityContext {
                calories_burned: calories_burned.round() as i64,
                active_minutes: active_minutes.round() as i64,
            },
            nutrition,
            sleep: SleepContext {
                average_hours: profile.sleep_hours.unwrap_or(DEFAULT_SLEEP_HOURS),
            },
        }
    }
}

/// Today's coin target: one coin per 10 burned calories plus one per 2
/// nutrition battery points
fn coin_target(raw_burned: f64, verdict: &JudgeVerdict) -> i64 {
    let activity_coins = (raw_burned / CALORIES_PER_COIN).floor() as i64;
    let nutrition_coins = (f64::from(verdict.nutrition) / NUTRITION_POINTS_PER_COIN).floor() as i64;
    activity_coins + nutrition_coins
}
