// ABOUTME: Achievement evaluation against refreshed stats and progress overview assembly
// ABOUTME: Awards are monotone, progress rows update in place, completed rows are frozen
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Achievement Evaluator
//!
//! Evaluation maps each active achievement's metric key onto the freshly
//! aggregated stats record and upserts the per-user progress row. Completion
//! is one-way: a completed row is never revisited, so metric dips (a broken
//! streak, a shrinking friend list) cannot take an award back. Catalog
//! entries with metric keys the evaluator does not recognize are skipped
//! without error.
//!
//! The overview merge mirrors every active catalog entry with the user's
//! progress row (or zero progress when none exists), grouped by category,
//! with a completion summary on top.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{
    AchievementCategory, AchievementCriteria, AchievementMetricKey, AchievementTier,
    EarnedAchievement, UserAchievement, UserStats,
};

/// One catalog achievement merged with the caller's progress
#[derive(Debug, Clone, Serialize)]
pub struct AchievementProgress {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub icon: Option<String>,
    pub badge_image: Option<String>,
    pub tier: AchievementTier,
    pub points: i64,
    pub criteria: AchievementCriteria,
    pub progress: i64,
    pub target: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Progress toward the target, capped at 100
    pub percentage: u8,
}

/// Completion counts across the whole catalog
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AchievementSummary {
    pub total: usize,
    pub completed: usize,
    /// Share of the catalog completed, 0 when the catalog is empty
    pub progress_percentage: u8,
    /// Points from completed achievements still in the active catalog
    pub total_points: i64,
}

/// Full catalog-with-progress view for one user
#[derive(Debug, Clone, Serialize)]
pub struct AchievementOverview {
    pub achievements: Vec<AchievementProgress>,
    pub grouped: BTreeMap<String, Vec<AchievementProgress>>,
    pub summary: AchievementSummary,
}

/// Evaluates the active catalog against refreshed stats records
#[derive(Clone)]
pub struct AchievementEvaluator {
    db: Database,
}

impl AchievementEvaluator {
    /// Create an evaluator over the given store
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Evaluate every active achievement against the given stats record
    ///
    /// Returns the achievements completed by this call, in catalog order.
    /// Calling again with unchanged stats returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or progress rows cannot be read or a
    /// progress write fails.
    pub async fn evaluate(&self, stats: &UserStats) -> AppResult<Vec<EarnedAchievement>> {
        let (catalog, user_rows) = tokio::try_join!(
            self.db.list_active_achievements(),
            self.db.get_user_achievements(stats.user_id),
        )?;

        let mut rows_by_id: HashMap<Uuid, UserAchievement> = user_rows
            .into_iter()
            .map(|row| (row.achievement_id, row))
            .collect();

        let mut newly_earned = Vec::new();
        let now = Utc::now();

        for achievement in catalog {
            let existing = rows_by_id.remove(&achievement.id);
            if existing.as_ref().is_some_and(|row| row.completed) {
                continue;
            }

            let Some(metric) = AchievementMetricKey::parse(&achievement.criteria.metric) else {
                continue;
            };
            let progress = metric.progress(stats);
            let completed = progress >= achievement.criteria.target;

            let row = match existing {
                Some(mut row) => {
                    row.progress = progress;
                    if completed {
                        row.completed = true;
                        row.completed_at = Some(now);
                    }
                    row.updated_at = now;
                    row
                }
                None => UserAchievement {
                    user_id: stats.user_id,
                    achievement_id: achievement.id,
                    progress,
                    completed,
                    completed_at: completed.then_some(now),
                    created_at: now,
                    updated_at: now,
                },
            };
            self.db.upsert_user_achievement(&row).await?;

            if completed {
                debug!(
                    user_id = %stats.user_id,
                    achievement = %achievement.name,
                    "achievement completed"
                );
                newly_earned.push(EarnedAchievement {
                    id: achievement.id,
                    name: achievement.name,
                    description: achievement.description,
                    icon: achievement.icon,
                    tier: achievement.tier,
                    points: achievement.points,
                });
            }
        }

        Ok(newly_earned)
    }

    /// The active catalog merged with the user's progress rows
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or progress rows cannot be read.
    pub async fn overview(&self, user_id: Uuid) -> AppResult<AchievementOverview> {
        let (catalog, user_rows) = tokio::try_join!(
            self.db.list_active_achievements(),
            self.db.get_user_achievements(user_id),
        )?;

        let rows_by_id: HashMap<Uuid, UserAchievement> = user_rows
            .iter()
            .map(|row| (row.achievement_id, row.clone()))
            .collect();

        let achievements: Vec<AchievementProgress> = catalog
            .iter()
            .map(|achievement| {
                let row = rows_by_id.get(&achievement.id);
                let progress = row.map_or(0, |r| r.progress);
                AchievementProgress {
                    id: achievement.id,
                    name: achievement.name.clone(),
                    description: achievement.description.clone(),
                    category: achievement.category,
                    icon: achievement.icon.clone(),
                    badge_image: achievement.badge_image.clone(),
                    tier: achievement.tier,
                    points: achievement.points,
                    criteria: achievement.criteria.clone(),
                    progress,
                    target: achievement.criteria.target,
                    completed: row.is_some_and(|r| r.completed),
                    completed_at: row.and_then(|r| r.completed_at),
                    percentage: completion_percentage(progress, achievement.criteria.target),
                }
            })
            .collect();

        let mut grouped: BTreeMap<String, Vec<AchievementProgress>> = BTreeMap::new();
        for entry in &achievements {
            grouped
                .entry(entry.category.as_str().to_string())
                .or_default()
                .push(entry.clone());
        }

        let completed = user_rows.iter().filter(|row| row.completed).count();
        let total_points = user_rows
            .iter()
            .filter(|row| row.completed)
            .filter_map(|row| {
                catalog
                    .iter()
                    .find(|a| a.id == row.achievement_id)
                    .map(|a| a.points)
            })
            .sum();

        Ok(AchievementOverview {
            summary: AchievementSummary {
                total: catalog.len(),
                completed,
                progress_percentage: catalog_percentage(completed, catalog.len()),
                total_points,
            },
            grouped,
            achievements,
        })
    }
}

/// Progress toward one target as a 0-100 percentage
fn completion_percentage(progress: i64, target: i64) -> u8 {
    if target <= 0 {
        return 100;
    }
    let pct = (progress as f64 / target as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Share of the catalog completed as a 0-100 percentage
fn catalog_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::create_test_db;
    use crate::models::{Achievement, CriterionKind};
    use chrono::TimeZone;

    fn achievement(name: &str, metric: &str, target: i64, points: i64) -> Achievement {
        let now = Utc::now();
        Achievement {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: format!("{name} description"),
            category: AchievementCategory::Milestone,
            icon: Some("🏅".to_string()),
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

    fn stats_with_meals(user_id: Uuid, meals: i64) -> UserStats {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let mut stats = UserStats::empty(user_id, now, now, now, now);
        stats.all_time.total_meals_logged = meals;
        stats
    }

    #[tokio::test]
    async fn test_first_evaluation_awards_met_targets() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db.clone());
        let user_id = Uuid::new_v4();

        db.upsert_achievement_by_name(&achievement("Ten Meals", "meals_logged", 10, 25))
            .await
            .unwrap();
        db.upsert_achievement_by_name(&achievement("Hundred Meals", "meals_logged", 100, 100))
            .await
            .unwrap();

        let earned = evaluator
            .evaluate(&stats_with_meals(user_id, 12))
            .await
            .unwrap();

        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].name, "Ten Meals");
        assert_eq!(earned[0].points, 25);

        // Both rows exist; only one is completed
        let rows = db.get_user_achievements(user_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().filter(|r| r.completed).count(), 1);
        assert!(rows.iter().all(|r| r.progress == 12));
    }

    #[tokio::test]
    async fn test_second_evaluation_awards_nothing_new() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db.clone());
        let user_id = Uuid::new_v4();

        db.upsert_achievement_by_name(&achievement("Ten Meals", "meals_logged", 10, 25))
            .await
            .unwrap();

        let stats = stats_with_meals(user_id, 12);
        let first = evaluator.evaluate(&stats).await.unwrap();
        let second = evaluator.evaluate(&stats).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_completed_rows_are_never_reopened() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db.clone());
        let user_id = Uuid::new_v4();

        db.upsert_achievement_by_name(&achievement("Ten Meals", "meals_logged", 10, 25))
            .await
            .unwrap();

        evaluator
            .evaluate(&stats_with_meals(user_id, 12))
            .await
            .unwrap();
        // Metric fell back below the target
        evaluator
            .evaluate(&stats_with_meals(user_id, 0))
            .await
            .unwrap();

        let rows = db.get_user_achievements(user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].completed);
        // Completed rows are frozen, including their progress value
        assert_eq!(rows[0].progress, 12);
    }

    #[tokio::test]
    async fn test_progress_updates_before_completion() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db.clone());
        let user_id = Uuid::new_v4();

        db.upsert_achievement_by_name(&achievement("Hundred Meals", "meals_logged", 100, 100))
            .await
            .unwrap();

        evaluator
            .evaluate(&stats_with_meals(user_id, 10))
            .await
            .unwrap();
        evaluator
            .evaluate(&stats_with_meals(user_id, 50))
            .await
            .unwrap();

        let rows = db.get_user_achievements(user_id).await.unwrap();
        assert_eq!(rows[0].progress, 50);
        assert!(!rows[0].completed);
    }

    #[tokio::test]
    async fn test_unrecognized_metric_is_skipped() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db.clone());
        let user_id = Uuid::new_v4();

        db.upsert_achievement_by_name(&achievement("Podium", "weekly_rank", 3, 200))
            .await
            .unwrap();

        let earned = evaluator
            .evaluate(&stats_with_meals(user_id, 500))
            .await
            .unwrap();

        assert!(earned.is_empty());
        assert!(db.get_user_achievements(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overview_merges_catalog_and_progress() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db.clone());
        let user_id = Uuid::new_v4();

        db.upsert_achievement_by_name(&achievement("Ten Meals", "meals_logged", 10, 25))
            .await
            .unwrap();
        db.upsert_achievement_by_name(&achievement("Hundred Meals", "meals_logged", 100, 100))
            .await
            .unwrap();

        evaluator
            .evaluate(&stats_with_meals(user_id, 50))
            .await
            .unwrap();

        let overview = evaluator.overview(user_id).await.unwrap();

        assert_eq!(overview.summary.total, 2);
        assert_eq!(overview.summary.completed, 1);
        assert_eq!(overview.summary.progress_percentage, 50);
        assert_eq!(overview.summary.total_points, 25);

        let ten = overview
            .achievements
            .iter()
            .find(|a| a.name == "Ten Meals")
            .unwrap();
        // Progress past the target is capped for display
        assert_eq!(ten.percentage, 100);
        assert!(ten.completed);

        let hundred = overview
            .achievements
            .iter()
            .find(|a| a.name == "Hundred Meals")
            .unwrap();
        assert_eq!(hundred.progress, 50);
        assert_eq!(hundred.percentage, 50);

        assert!(overview.grouped.contains_key("milestone"));
        assert_eq!(overview.grouped["milestone"].len(), 2);
    }

    #[tokio::test]
    async fn test_overview_with_empty_catalog() {
        let db = create_test_db().await.unwrap();
        let evaluator = AchievementEvaluator::new(db);

        let overview = evaluator.overview(Uuid::new_v4()).await.unwrap();

        assert_eq!(overview.summary.total, 0);
        assert_eq!(overview.summary.progress_percentage, 0);
        assert!(overview.achievements.is_empty());
    }
}
