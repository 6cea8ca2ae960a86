// ABOUTME: Engine facade wiring aggregation, achievements, leaderboards, rankings, gamification
// ABOUTME: One handle per process; clones share the scheduler and per-user lock state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Stats Engine
//!
//! [`StatsEngine`] is the single entry point a serving layer talks to. It owns
//! the component wiring: the aggregator and achievement evaluator run as one
//! refresh pipeline (shared by direct calls and the debounce scheduler), while
//! leaderboard reads, ranking batches, and gamification refreshes hang off the
//! same store handle.
//!
//! The engine is cheap to clone; every clone shares the pending-update timers
//! and per-user aggregation locks, so the serialization guarantees hold no
//! matter how many handles a process hands out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::aggregator::StatsAggregator;
use crate::config::EngineConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::evaluator::{AchievementEvaluator, AchievementOverview};
use crate::gamification::{GamificationOutcome, GamificationService};
use crate::judge::judge_from_config;
use crate::leaderboard::{
    LeaderboardPage, LeaderboardService, NearbyView, PageParams, TopPerformers,
};
use crate::models::{EarnedAchievement, Period, PrivacySettings, PrivacyUpdate, UserStats};
use crate::ranking::{RankingAssigner, RankingSummary, ScopeOutcome};
use crate::scheduler::{UpdatePipeline, UpdateScheduler};
use crate::windows::BoundaryPolicy;

/// Stats refresh result with any achievements it completed
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub stats: UserStats,
    pub newly_earned: Vec<EarnedAchievement>,
}

/// Aggregate-then-evaluate pipeline behind every stats refresh
struct RefreshPipeline {
    aggregator: StatsAggregator,
    evaluator: AchievementEvaluator,
}

impl RefreshPipeline {
    async fn refresh(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<RefreshOutcome> {
        let stats = self.aggregator.aggregate(user_id, now).await?;
        let newly_earned = self.evaluator.evaluate(&stats).await?;
        if !newly_earned.is_empty() {
            info!(
                user_id = %user_id,
                earned = newly_earned.len(),
                "refresh completed achievements"
            );
        }
        Ok(RefreshOutcome {
            stats,
            newly_earned,
        })
    }
}

#[async_trait]
impl UpdatePipeline for RefreshPipeline {
    async fn run_update(&self, user_id: Uuid) -> AppResult<()> {
        self.refresh(user_id, Utc::now()).await?;
        Ok(())
    }
}

/// Facade over the whole engine
#[derive(Clone)]
pub struct StatsEngine {
    db: Database,
    pipeline: Arc<RefreshPipeline>,
    scheduler: UpdateScheduler,
    leaderboards: LeaderboardService,
    rankings: RankingAssigner,
    gamification: GamificationService,
}

impl StatsEngine {
    /// Connect to the configured database and wire every component
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection, a migration, or component
    /// construction fails
    pub async fn connect(config: &EngineConfig) -> AppResult<Self> {
        let db = Database::new(&config.database_url.to_connection_string()).await?;
        Self::from_parts(db, config)
    }

    /// Wire the engine over an existing database handle
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the boundary offset is unrepresentable or
    /// the judge client cannot be built
    pub fn from_parts(db: Database, config: &EngineConfig) -> AppResult<Self> {
        let policy = BoundaryPolicy::from_offset_minutes(config.boundary_offset_minutes)
            .ok_or_else(|| {
                AppError::config(format!(
                    "boundary offset {} minutes is not representable",
                    config.boundary_offset_minutes
                ))
            })?;

        let aggregator = StatsAggregator::new(
            db.clone(),
            policy,
            Duration::from_secs(config.scheduler.lock_timeout_secs),
        );
        let evaluator = AchievementEvaluator::new(db.clone());
        let pipeline = Arc::new(RefreshPipeline {
            aggregator,
            evaluator,
        });
        let scheduler = UpdateScheduler::new(
            pipeline.clone(),
            Duration::from_millis(config.scheduler.quiet_interval_ms),
        );
        let judge = judge_from_config(&config.judge)?;

        Ok(Self {
            leaderboards: LeaderboardService::new(db.clone(), config.leaderboard.clone()),
            rankings: RankingAssigner::new(db.clone()),
            gamification: GamificationService::new(db.clone(), policy, judge),
            db,
            pipeline,
            scheduler,
        })
    }

    /// Shared store handle for ingest call sites
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// The boundary policy every period window derives from
    #[must_use]
    pub fn policy(&self) -> BoundaryPolicy {
        self.pipeline.aggregator.policy()
    }

    /// The debounce scheduler, exposed for shutdown hooks
    #[must_use]
    pub const fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// Current stats, refreshed from sources; a brand-new user gets a freshly
    /// built record
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user has no profile. A failed
    /// refresh falls back to the stored record when one exists.
    pub async fn get_or_create_stats(&self, user_id: Uuid) -> AppResult<UserStats> {
        self.pipeline
            .aggregator
            .get_or_create(user_id, Utc::now())
            .await
    }

    /// Force a full refresh now: aggregate, then evaluate achievements
    ///
    /// Cancels any pending debounced refresh for the user first.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user has no profile,
    /// `ConcurrencyConflict` on lock contention, and database errors when a
    /// read or write fails
    pub async fn refresh_stats(&self, user_id: Uuid) -> AppResult<RefreshOutcome> {
        self.scheduler.cancel_pending(user_id);
        self.pipeline.refresh(user_id, Utc::now()).await
    }

    /// Debounced refresh after the configured quiet interval
    pub fn queue_refresh(&self, user_id: Uuid) {
        self.scheduler.queue_update(user_id);
    }

    /// One ranked leaderboard page for the caller
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when a non-global scope is requested and the
    /// caller has no stats row
    pub async fn get_leaderboard(
        &self,
        caller: Uuid,
        params: &PageParams,
    ) -> AppResult<LeaderboardPage> {
        self.leaderboards.page(caller, params).await
    }

    /// The caller's ranked neighborhood on the global score board
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the caller has no stats row
    pub async fn get_nearby(
        &self,
        caller: Uuid,
        period: Period,
        range: Option<u32>,
    ) -> AppResult<NearbyView> {
        self.leaderboards.nearby(caller, period, range).await
    }

    /// Top lists for every leaderboard metric over one period
    ///
    /// # Errors
    ///
    /// Returns an error when a board read fails
    pub async fn get_top_performers(
        &self,
        period: Period,
        limit: Option<u32>,
    ) -> AppResult<TopPerformers> {
        self.leaderboards.top_performers(period, limit).await
    }

    /// The active achievement catalog merged with the user's progress
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or progress rows cannot be read
    pub async fn get_achievements(&self, user_id: Uuid) -> AppResult<AchievementOverview> {
        self.pipeline.evaluator.overview(user_id).await
    }

    /// Refresh stats and return only the achievements the pass completed
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::refresh_stats`]
    pub async fn check_achievements(&self, user_id: Uuid) -> AppResult<Vec<EarnedAchievement>> {
        Ok(self.refresh_stats(user_id).await?.newly_earned)
    }

    /// Create a mutual friend link and queue refreshes for both users
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a self-link and `ResourceNotFound` when
    /// either user has no profile
    pub async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        if user_id == friend_id {
            return Err(AppError::invalid_input("Cannot friend yourself").with_user_id(user_id));
        }
        for id in [user_id, friend_id] {
            if self.db.get_user_profile(id).await?.is_none() {
                return Err(AppError::not_found(format!("User {id}")));
            }
        }
        self.db.add_friend_edges(user_id, friend_id).await?;

        // Friend counts feed social achievements on the next pass
        self.scheduler.queue_update(user_id);
        self.scheduler.queue_update(friend_id);
        Ok(())
    }

    /// Remove a friend link in both directions
    ///
    /// Removing a link that does not exist is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails
    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        self.db.remove_friend_edges(user_id, friend_id).await?;
        self.scheduler.queue_update(user_id);
        self.scheduler.queue_update(friend_id);
        Ok(())
    }

    /// Apply a partial privacy update and return the resulting settings
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails
    pub async fn update_privacy(
        &self,
        user_id: Uuid,
        update: &PrivacyUpdate,
    ) -> AppResult<PrivacySettings> {
        self.db.update_privacy(user_id, update).await
    }

    /// Refresh battery levels and award today's coin delta
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user has no profile. Judge outages
    /// are absorbed with the baseline verdict.
    pub async fn refresh_gamification(&self, user_id: Uuid) -> AppResult<GamificationOutcome> {
        self.gamification.refresh(user_id, Utc::now()).await
    }

    /// Recompute stored ranks for every period and scope
    pub async fn recompute_all_rankings(&self) -> RankingSummary {
        self.rankings.recompute_all().await
    }

    /// Recompute stored ranks for one period across all scopes
    pub async fn recompute_rankings(&self, period: Period) -> Vec<ScopeOutcome> {
        self.rankings.recompute_period(period).await
    }
}
