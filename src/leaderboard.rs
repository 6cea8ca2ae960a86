// ABOUTME: Leaderboard read paths: ranked pages, nearby windows, top performers
// ABOUTME: Rank labels come from the deterministic (metric desc, user id asc) order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Leaderboard Service
//!
//! Read-side views over the stats rows. Every view filters to visible users
//! and orders by one metric descending with ascending user id as the tie
//! break, so ranks are total and reproducible. Page ranks are positional
//! (offset plus index); the caller's own rank is counted on demand when they
//! fall outside the page, so these views never depend on the batch ranking
//! assigner having run.

use serde::Serialize;
use uuid::Uuid;

use crate::config::LeaderboardConfig;
use crate::constants::leaderboard::DEFAULT_TOP_LIMIT;
use crate::database::{BoardQuery, Database, LeaderboardRow};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Demographics, LeaderboardMetric, LeaderboardScope, Period, PrivacySettings, UserProfile,
    UserStats,
};

/// SQL expression producing one metric value for a stats row aliased `s`
///
/// The streak metric ignores the period: there is only one current logging
/// streak. Bucket fields are null-coalesced so rows that have never been
/// aggregated sort as zero.
fn metric_expr(period: Period, metric: LeaderboardMetric) -> &'static str {
    match (metric, period) {
        (LeaderboardMetric::Score, Period::Daily) => "s.daily_score",
        (LeaderboardMetric::Score, Period::Weekly) => "s.weekly_score",
        (LeaderboardMetric::Score, Period::Monthly) => "s.monthly_score",
        (LeaderboardMetric::Score, Period::AllTime) => "s.all_time_score",
        (LeaderboardMetric::CaloriesBurned, Period::Daily) => {
            "COALESCE(json_extract(s.daily_bucket, '$.calories_burned'), 0)"
        }
        (LeaderboardMetric::CaloriesBurned, Period::Weekly) => {
            "COALESCE(json_extract(s.weekly_bucket, '$.calories_burned'), 0)"
        }
        (LeaderboardMetric::CaloriesBurned, Period::Monthly) => {
            "COALESCE(json_extract(s.monthly_bucket, '$.calories_burned'), 0)"
        }
        (LeaderboardMetric::CaloriesBurned, Period::AllTime) => {
            "COALESCE(json_extract(s.all_time_bucket, '$.total_calories_burned'), 0)"
        }
        (LeaderboardMetric::ActivityMinutes, Period::Daily) => {
            "COALESCE(json_extract(s.daily_bucket, '$.activity_minutes'), 0)"
        }
        (LeaderboardMetric::ActivityMinutes, Period::Weekly) => {
            "COALESCE(json_extract(s.weekly_bucket, '$.activity_minutes'), 0)"
        }
        (LeaderboardMetric::ActivityMinutes, Period::Monthly) => {
            "COALESCE(json_extract(s.monthly_bucket, '$.activity_minutes'), 0)"
        }
        (LeaderboardMetric::ActivityMinutes, Period::AllTime) => {
            "COALESCE(json_extract(s.all_time_bucket, '$.total_activity_minutes'), 0)"
        }
        (LeaderboardMetric::Streak, _) => "s.current_logging_streak",
    }
}

fn order_expr(period: Period, metric: LeaderboardMetric) -> String {
    format!("{} DESC, s.user_id ASC", metric_expr(period, metric))
}

/// Page request parameters; `limit` falls back to the configured default
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub period: Period,
    pub scope: LeaderboardScope,
    pub metric: LeaderboardMetric,
    /// 1-based page number
    pub page: u32,
    pub limit: Option<u32>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            period: Period::Weekly,
            scope: LeaderboardScope::Global,
            metric: LeaderboardMetric::Score,
            page: 1,
            limit: None,
        }
    }
}

/// Public identity of a board entry, privacy already applied
#[derive(Debug, Clone, Serialize)]
pub struct BoardUser {
    pub user_id: Uuid,
    pub handle: String,
    pub avatar_url: Option<String>,
}

/// Headline stats shown on a page entry for the requested period
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntryStats {
    pub score: i64,
    pub calories_burned: f64,
    pub activity_minutes: i64,
    pub workouts_completed: i64,
    pub meals_logged: i64,
    pub current_streak: u32,
}

impl EntryStats {
    fn for_period(stats: &UserStats, period: Period) -> Self {
        Self {
            score: stats.score(period),
            calories_burned: stats.calories_burned(period),
            activity_minutes: stats.activity_minutes(period),
            workouts_completed: stats.workouts_completed(period),
            meals_logged: stats.meals_logged(period),
            current_streak: stats.streaks.current_logging_streak,
        }
    }
}

/// One ranked page entry
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user: BoardUser,
    pub stats: EntryStats,
    pub demographics: Demographics,
    pub is_current_user: bool,
}

/// Page position metadata
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
}

/// Echo of the filters the page was built with
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageFilters {
    pub period: Period,
    pub scope: LeaderboardScope,
    pub metric: LeaderboardMetric,
}

/// One leaderboard page plus the caller's own entry
///
/// `current_user` is the caller's page entry when they made the page, their
/// on-demand ranked entry when they did not, and `None` when the caller has
/// no stats row at all.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub current_user: Option<LeaderboardEntry>,
    pub pagination: Pagination,
    pub filters: PageFilters,
}

/// One entry in the nearby window, always ordered by the period score
#[derive(Debug, Clone, Serialize)]
pub struct NearbyEntry {
    pub rank: u32,
    pub user: BoardUser,
    pub score: i64,
    pub is_current_user: bool,
}

/// Competitors immediately around the caller
#[derive(Debug, Clone, Serialize)]
pub struct NearbyView {
    pub entries: Vec<NearbyEntry>,
    pub current_user_rank: u32,
    pub period: Period,
}

/// One entry of a single-metric top list
#[derive(Debug, Clone, Serialize)]
pub struct TopEntry {
    pub rank: u32,
    pub user: BoardUser,
    pub value: f64,
}

/// Independent top lists, one per metric
#[derive(Debug, Clone, Serialize)]
pub struct TopPerformers {
    pub by_score: Vec<TopEntry>,
    pub by_calories_burned: Vec<TopEntry>,
    pub by_activity_minutes: Vec<TopEntry>,
    pub by_streak: Vec<TopEntry>,
    pub period: Period,
}

/// Read-side leaderboard queries over the stats store
#[derive(Clone)]
pub struct LeaderboardService {
    db: Database,
    config: LeaderboardConfig,
}

impl LeaderboardService {
    /// Create a service with the given pagination bounds
    #[must_use]
    pub const fn new(db: Database, config: LeaderboardConfig) -> Self {
        Self { db, config }
    }

    /// One ranked page for the requested period, scope, and metric
    ///
    /// Page listings hide never-active users. If the caller is not on the
    /// page, their own ranked entry is computed and returned alongside.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when a caller-anchored scope is requested
    /// and the caller has no stats row, or a database error
    pub async fn page(&self, caller: Uuid, params: &PageParams) -> AppResult<LeaderboardPage> {
        let limit = params
            .limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size);
        let page = params.page.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        let caller_stats = self.db.get_user_stats(caller).await?;
        let query = self
            .scope_query(caller, params.scope, caller_stats.as_ref())?
            .require_activity();

        let expr = metric_expr(params.period, params.metric);
        let order = order_expr(params.period, params.metric);
        let (rows, total) = tokio::try_join!(
            self.db.fetch_board_rows(&query, &order, i64::from(limit), offset),
            self.db.count_board_rows(&query),
        )?;

        let entries: Vec<LeaderboardEntry> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let rank = (offset + index as i64) as u32 + 1;
                page_entry(row, params.period, rank, caller)
            })
            .collect();

        let current_user = match entries.iter().find(|entry| entry.is_current_user) {
            Some(entry) => Some(entry.clone()),
            None => {
                self.own_entry(caller, caller_stats.as_ref(), &query, params, expr)
                    .await?
            }
        };

        let total_pages = if total == 0 {
            0
        } else {
            (total as u64).div_ceil(u64::from(limit)) as u32
        };

        Ok(LeaderboardPage {
            entries,
            current_user,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
            filters: PageFilters {
                period: params.period,
                scope: params.scope,
                metric: params.metric,
            },
        })
    }

    /// Users ranked immediately above and below the caller by period score
    ///
    /// Returns up to `range` neighbors on each side plus the caller's own
    /// entry, even when the caller is hidden from public boards.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the caller has no stats row, or a
    /// database error
    pub async fn nearby(
        &self,
        caller: Uuid,
        period: Period,
        range: Option<u32>,
    ) -> AppResult<NearbyView> {
        let range = range
            .unwrap_or(self.config.default_nearby_range)
            .clamp(1, self.config.max_nearby_range);

        let stats = self
            .db
            .get_user_stats(caller)
            .await?
            .ok_or_else(|| AppError::not_found("User stats"))?;
        let own_score = stats.score(period);

        let query = BoardQuery::all();
        let expr = metric_expr(period, LeaderboardMetric::Score);
        let ahead = self
            .db
            .count_ranked_ahead(&query, expr, own_score as f64, caller)
            .await?;
        let own_rank = ahead as u32 + 1;

        // Window into the sorted board: everyone ahead of the caller sits at
        // board positions below `ahead`, so one fetch covers both sides
        let above_offset = ahead.saturating_sub(i64::from(range));
        let order = order_expr(period, LeaderboardMetric::Score);
        let fetch_limit = (ahead - above_offset) + 1 + i64::from(range);
        let rows = self
            .db
            .fetch_board_rows(&query, &order, fetch_limit, above_offset)
            .await?;

        let mut above = Vec::new();
        let mut below = Vec::new();
        for row in rows {
            if row.stats.user_id == caller {
                continue;
            }
            let row_score = row.stats.score(period);
            if row_score > own_score || (row_score == own_score && row.stats.user_id < caller) {
                above.push(row);
            } else {
                below.push(row);
            }
        }
        below.truncate(range as usize);

        let mut entries = Vec::with_capacity(above.len() + below.len() + 1);
        let first_above_rank = own_rank - above.len() as u32;
        for (index, row) in above.iter().enumerate() {
            entries.push(nearby_entry(row, period, first_above_rank + index as u32));
        }

        let profile = self.db.get_user_profile(caller).await?;
        entries.push(NearbyEntry {
            rank: own_rank,
            user: profile_user(caller, profile.as_ref(), &stats.privacy),
            score: own_score,
            is_current_user: true,
        });

        for (index, row) in below.iter().enumerate() {
            entries.push(nearby_entry(row, period, own_rank + 1 + index as u32));
        }

        Ok(NearbyView {
            entries,
            current_user_rank: own_rank,
            period,
        })
    }

    /// Top users per metric for one period, each list ranked independently
    ///
    /// # Errors
    ///
    /// Returns an error if a board query fails
    pub async fn top_performers(
        &self,
        period: Period,
        limit: Option<u32>,
    ) -> AppResult<TopPerformers> {
        let limit = limit
            .unwrap_or(DEFAULT_TOP_LIMIT)
            .clamp(1, self.config.max_page_size);
        let query = BoardQuery::all();

        let (by_score, by_calories_burned, by_activity_minutes, by_streak) = tokio::try_join!(
            self.top_list(&query, period, LeaderboardMetric::Score, limit),
            self.top_list(&query, period, LeaderboardMetric::CaloriesBurned, limit),
            self.top_list(&query, period, LeaderboardMetric::ActivityMinutes, limit),
            self.top_list(&query, period, LeaderboardMetric::Streak, limit),
        )?;

        Ok(TopPerformers {
            by_score,
            by_calories_burned,
            by_activity_minutes,
            by_streak,
            period,
        })
    }

    async fn top_list(
        &self,
        query: &BoardQuery,
        period: Period,
        metric: LeaderboardMetric,
        limit: u32,
    ) -> AppResult<Vec<TopEntry>> {
        let order = order_expr(period, metric);
        let rows = self
            .db
            .fetch_board_rows(query, &order, i64::from(limit), 0)
            .await?;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(index, row)| TopEntry {
                rank: index as u32 + 1,
                user: board_user(row),
                value: row.stats.metric_value(period, metric),
            })
            .collect())
    }

    /// Board filter for one scope; every non-global scope is anchored on the
    /// caller's own stats row
    fn scope_query(
        &self,
        caller: Uuid,
        scope: LeaderboardScope,
        caller_stats: Option<&UserStats>,
    ) -> AppResult<BoardQuery> {
        if scope == LeaderboardScope::Global {
            return Ok(BoardQuery::all());
        }

        let stats = caller_stats.ok_or_else(|| AppError::not_found("User stats"))?;
        Ok(match scope {
            LeaderboardScope::Global => BoardQuery::all(),
            LeaderboardScope::AgeGroup => BoardQuery::age_group(stats.demographics.age_group),
            LeaderboardScope::Gender => BoardQuery::gender(stats.demographics.gender),
            LeaderboardScope::FitnessLevel => {
                BoardQuery::fitness_level(stats.demographics.fitness_level)
            }
            LeaderboardScope::Friends => {
                let mut members = stats.friends.clone();
                members.push(caller);
                BoardQuery::members(members)
            }
        })
    }

    /// The caller's own ranked entry, counted on demand against the same
    /// board filter the page used
    async fn own_entry(
        &self,
        caller: Uuid,
        caller_stats: Option<&UserStats>,
        query: &BoardQuery,
        params: &PageParams,
        expr: &str,
    ) -> AppResult<Option<LeaderboardEntry>> {
        let Some(stats) = caller_stats else {
            return Ok(None);
        };

        // Comparing against the stored value keeps the count consistent with
        // the board ordering even if the in-memory copy is stale
        let metric_value = self
            .db
            .metric_value_for(expr, caller)
            .await?
            .unwrap_or_else(|| stats.metric_value(params.period, params.metric));
        let ahead = self
            .db
            .count_ranked_ahead(query, expr, metric_value, caller)
            .await?;
        let profile = self.db.get_user_profile(caller).await?;

        Ok(Some(LeaderboardEntry {
            rank: ahead as u32 + 1,
            user: profile_user(caller, profile.as_ref(), &stats.privacy),
            stats: EntryStats::for_period(stats, params.period),
            demographics: stats.demographics.clone(),
            is_current_user: true,
        }))
    }
}

fn page_entry(row: &LeaderboardRow, period: Period, rank: u32, caller: Uuid) -> LeaderboardEntry {
    LeaderboardEntry {
        rank,
        user: board_user(row),
        stats: EntryStats::for_period(&row.stats, period),
        demographics: row.stats.demographics.clone(),
        is_current_user: row.stats.user_id == caller,
    }
}

fn nearby_entry(row: &LeaderboardRow, period: Period, rank: u32) -> NearbyEntry {
    NearbyEntry {
        rank,
        user: board_user(row),
        score: row.stats.score(period),
        is_current_user: false,
    }
}

fn board_user(row: &LeaderboardRow) -> BoardUser {
    BoardUser {
        user_id: row.stats.user_id,
        handle: display_handle(
            row.stats.user_id,
            row.username.as_deref(),
            row.display_name.as_deref(),
            &row.stats.privacy,
        ),
        avatar_url: row.avatar_url.clone(),
    }
}

fn profile_user(
    user_id: Uuid,
    profile: Option<&UserProfile>,
    privacy: &PrivacySettings,
) -> BoardUser {
    BoardUser {
        user_id,
        handle: display_handle(
            user_id,
            profile.map(|p| p.username.as_str()),
            profile.and_then(|p| p.display_name.as_deref()),
            privacy,
        ),
        avatar_url: profile.and_then(|p| p.avatar_url.clone()),
    }
}

/// Display name when the user opted in to showing it, otherwise the username
/// handle, otherwise a neutral alias derived from the id
fn display_handle(
    user_id: Uuid,
    username: Option<&str>,
    display_name: Option<&str>,
    privacy: &PrivacySettings,
) -> String {
    match display_name {
        Some(name) if privacy.show_real_name => name.to_string(),
        _ => username.map_or_else(|| anonymous_handle(user_id), str::to_string),
    }
}

fn anonymous_handle(user_id: Uuid) -> String {
    let id = user_id.simple().to_string();
    format!("user-{}", &id[..8])
}
