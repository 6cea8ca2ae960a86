// ABOUTME: Built-in achievement catalog definitions
// ABOUTME: Loaded idempotently by the seed-achievements binary, upserted by name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Built-in Achievement Catalog
//!
//! The default catalog: milestones, workout and calorie thresholds, logging
//! streaks, nutrition-goal counts, friend milestones, program sessions, and
//! leaderboard tiers. Seeding upserts by name, so re-running refreshes
//! definitions without duplicating rows or touching user progress.
//!
//! Some entries reference metrics (leaderboard ranks and scores, challenges,
//! post reactions) that no evaluator consumes yet; they stay in the catalog
//! for display and start progressing once an evaluator learns their key.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Achievement, AchievementCategory, AchievementCriteria, AchievementTier, CriterionKind,
};

/// Built-in catalog entry definition
struct BuiltinAchievement {
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    icon: &'static str,
    kind: CriterionKind,
    target: i64,
    metric: &'static str,
    points: i64,
    tier: AchievementTier,
}

const BUILTIN_ACHIEVEMENTS: &[BuiltinAchievement] = &[
    // Milestone achievements
    BuiltinAchievement {
        name: "First Steps",
        description: "Log your first meal",
        category: AchievementCategory::Milestone,
        icon: "🍽️",
        kind: CriterionKind::Count,
        target: 1,
        metric: "meals_logged",
        points: 10,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Getting Started",
        description: "Log 10 meals",
        category: AchievementCategory::Milestone,
        icon: "📝",
        kind: CriterionKind::Count,
        target: 10,
        metric: "meals_logged",
        points: 25,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Century Club",
        description: "Log 100 meals",
        category: AchievementCategory::Milestone,
        icon: "💯",
        kind: CriterionKind::Count,
        target: 100,
        metric: "meals_logged",
        points: 100,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Food Journal Master",
        description: "Log 500 meals",
        category: AchievementCategory::Milestone,
        icon: "📚",
        kind: CriterionKind::Count,
        target: 500,
        metric: "meals_logged",
        points: 250,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Nutrition Expert",
        description: "Log 1000 meals",
        category: AchievementCategory::Milestone,
        icon: "🎓",
        kind: CriterionKind::Count,
        target: 1000,
        metric: "meals_logged",
        points: 500,
        tier: AchievementTier::Platinum,
    },
    // Workout and calorie achievements
    BuiltinAchievement {
        name: "First Workout",
        description: "Complete your first workout",
        category: AchievementCategory::Workout,
        icon: "💪",
        kind: CriterionKind::Count,
        target: 1,
        metric: "workouts_completed",
        points: 15,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Workout Warrior",
        description: "Complete 25 workouts",
        category: AchievementCategory::Workout,
        icon: "🏋️",
        kind: CriterionKind::Count,
        target: 25,
        metric: "workouts_completed",
        points: 75,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Fitness Fanatic",
        description: "Complete 100 workouts",
        category: AchievementCategory::Workout,
        icon: "🔥",
        kind: CriterionKind::Count,
        target: 100,
        metric: "workouts_completed",
        points: 200,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Calorie Crusher",
        description: "Burn 10,000 total calories",
        category: AchievementCategory::Workout,
        icon: "🔥",
        kind: CriterionKind::Threshold,
        target: 10_000,
        metric: "calories_burned",
        points: 150,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Calorie Destroyer",
        description: "Burn 50,000 total calories",
        category: AchievementCategory::Workout,
        icon: "💥",
        kind: CriterionKind::Threshold,
        target: 50_000,
        metric: "calories_burned",
        points: 300,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Calorie Annihilator",
        description: "Burn 100,000 total calories",
        category: AchievementCategory::Workout,
        icon: "☄️",
        kind: CriterionKind::Threshold,
        target: 100_000,
        metric: "calories_burned",
        points: 500,
        tier: AchievementTier::Platinum,
    },
    BuiltinAchievement {
        name: "Marathon Milestone",
        description: "Burn 3,500 calories in a week",
        category: AchievementCategory::Workout,
        icon: "🏃",
        kind: CriterionKind::Threshold,
        target: 3500,
        metric: "weekly_calories_burned",
        points: 100,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Active Hour",
        description: "Accumulate 60 minutes of activity",
        category: AchievementCategory::Workout,
        icon: "⏱️",
        kind: CriterionKind::Threshold,
        target: 60,
        metric: "activity_minutes",
        points: 20,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Active Day",
        description: "Accumulate 500 minutes of activity",
        category: AchievementCategory::Workout,
        icon: "📆",
        kind: CriterionKind::Threshold,
        target: 500,
        metric: "activity_minutes",
        points: 75,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Active Week",
        description: "Accumulate 2000 minutes of activity",
        category: AchievementCategory::Workout,
        icon: "🗓️",
        kind: CriterionKind::Threshold,
        target: 2000,
        metric: "activity_minutes",
        points: 150,
        tier: AchievementTier::Gold,
    },
    // Streak achievements
    BuiltinAchievement {
        name: "Week Warrior",
        description: "Maintain a 7-day logging streak",
        category: AchievementCategory::Streak,
        icon: "📅",
        kind: CriterionKind::Streak,
        target: 7,
        metric: "logging_streak",
        points: 50,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Two Week Titan",
        description: "Maintain a 14-day logging streak",
        category: AchievementCategory::Streak,
        icon: "📆",
        kind: CriterionKind::Streak,
        target: 14,
        metric: "logging_streak",
        points: 100,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Consistency King",
        description: "Maintain a 30-day logging streak",
        category: AchievementCategory::Streak,
        icon: "👑",
        kind: CriterionKind::Streak,
        target: 30,
        metric: "logging_streak",
        points: 200,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Habit Master",
        description: "Maintain a 60-day logging streak",
        category: AchievementCategory::Streak,
        icon: "🏆",
        kind: CriterionKind::Streak,
        target: 60,
        metric: "logging_streak",
        points: 350,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Century Streak",
        description: "Maintain a 100-day logging streak",
        category: AchievementCategory::Streak,
        icon: "💎",
        kind: CriterionKind::Streak,
        target: 100,
        metric: "logging_streak",
        points: 500,
        tier: AchievementTier::Platinum,
    },
    BuiltinAchievement {
        name: "Year of Dedication",
        description: "Maintain a 365-day logging streak",
        category: AchievementCategory::Streak,
        icon: "🌟",
        kind: CriterionKind::Streak,
        target: 365,
        metric: "logging_streak",
        points: 1000,
        tier: AchievementTier::Diamond,
    },
    // Nutrition goal achievements
    BuiltinAchievement {
        name: "On Target",
        description: "Achieve your daily calorie goal",
        category: AchievementCategory::Nutrition,
        icon: "🎯",
        kind: CriterionKind::Count,
        target: 1,
        metric: "goal_days",
        points: 15,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Balanced Week",
        description: "Maintain calorie goal for 7 days",
        category: AchievementCategory::Nutrition,
        icon: "⚖️",
        kind: CriterionKind::Count,
        target: 7,
        metric: "goal_days",
        points: 75,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Balanced Life",
        description: "Maintain calorie goal for 30 days",
        category: AchievementCategory::Nutrition,
        icon: "🌈",
        kind: CriterionKind::Count,
        target: 30,
        metric: "goal_days",
        points: 200,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Goal Crusher",
        description: "Achieve calorie goal 100 times",
        category: AchievementCategory::Nutrition,
        icon: "💪",
        kind: CriterionKind::Count,
        target: 100,
        metric: "goal_days",
        points: 400,
        tier: AchievementTier::Platinum,
    },
    // Friend achievements
    BuiltinAchievement {
        name: "Making Friends",
        description: "Connect with 5 friends",
        category: AchievementCategory::Health,
        icon: "🤝",
        kind: CriterionKind::Count,
        target: 5,
        metric: "friends_count",
        points: 30,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Social Butterfly",
        description: "Connect with 10 friends",
        category: AchievementCategory::Health,
        icon: "🦋",
        kind: CriterionKind::Count,
        target: 10,
        metric: "friends_count",
        points: 75,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Community Leader",
        description: "Connect with 25 friends",
        category: AchievementCategory::Health,
        icon: "👥",
        kind: CriterionKind::Count,
        target: 25,
        metric: "friends_count",
        points: 150,
        tier: AchievementTier::Gold,
    },
    // Program achievements
    BuiltinAchievement {
        name: "Program Starter",
        description: "Complete your first program session",
        category: AchievementCategory::Program,
        icon: "🚀",
        kind: CriterionKind::Count,
        target: 1,
        metric: "workouts_completed",
        points: 20,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Program Pro",
        description: "Complete 50 program sessions",
        category: AchievementCategory::Program,
        icon: "⭐",
        kind: CriterionKind::Count,
        target: 50,
        metric: "workouts_completed",
        points: 150,
        tier: AchievementTier::Silver,
    },
    // Leaderboard achievements
    BuiltinAchievement {
        name: "Podium Finish",
        description: "Reach top 3 in the weekly leaderboard",
        category: AchievementCategory::Leaderboard,
        icon: "🏅",
        kind: CriterionKind::Threshold,
        target: 3,
        metric: "weekly_rank",
        points: 200,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Top Performer",
        description: "Reach top 10 in any leaderboard category",
        category: AchievementCategory::Leaderboard,
        icon: "🌟",
        kind: CriterionKind::Threshold,
        target: 10,
        metric: "best_rank",
        points: 100,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Champion",
        description: "Achieve #1 rank in any category for a week",
        category: AchievementCategory::Leaderboard,
        icon: "🏆",
        kind: CriterionKind::Threshold,
        target: 1,
        metric: "weekly_rank",
        points: 500,
        tier: AchievementTier::Platinum,
    },
    BuiltinAchievement {
        name: "Age Group Leader",
        description: "Reach #1 in your age bracket",
        category: AchievementCategory::Leaderboard,
        icon: "👑",
        kind: CriterionKind::Threshold,
        target: 1,
        metric: "age_group_rank",
        points: 150,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Rising Star",
        description: "Improve your rank by 10 positions in a week",
        category: AchievementCategory::Leaderboard,
        icon: "📈",
        kind: CriterionKind::Threshold,
        target: 10,
        metric: "rank_improvement",
        points: 75,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Score Hunter",
        description: "Accumulate 1,000 leaderboard points",
        category: AchievementCategory::Leaderboard,
        icon: "💯",
        kind: CriterionKind::Threshold,
        target: 1000,
        metric: "weekly_score",
        points: 50,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Score Master",
        description: "Accumulate 10,000 leaderboard points in a month",
        category: AchievementCategory::Leaderboard,
        icon: "🔥",
        kind: CriterionKind::Threshold,
        target: 10_000,
        metric: "monthly_score",
        points: 200,
        tier: AchievementTier::Gold,
    },
    // Social achievements
    BuiltinAchievement {
        name: "Team Player",
        description: "Join a fitness challenge with friends",
        category: AchievementCategory::Social,
        icon: "🤝",
        kind: CriterionKind::Count,
        target: 1,
        metric: "challenges_joined",
        points: 25,
        tier: AchievementTier::Bronze,
    },
    BuiltinAchievement {
        name: "Motivator",
        description: "Get 50 likes on your progress posts",
        category: AchievementCategory::Social,
        icon: "❤️",
        kind: CriterionKind::Threshold,
        target: 50,
        metric: "total_likes",
        points: 100,
        tier: AchievementTier::Silver,
    },
    BuiltinAchievement {
        name: "Influencer",
        description: "Get 200 likes on your progress posts",
        category: AchievementCategory::Social,
        icon: "🌟",
        kind: CriterionKind::Threshold,
        target: 200,
        metric: "total_likes",
        points: 250,
        tier: AchievementTier::Gold,
    },
    BuiltinAchievement {
        name: "Helpful Hand",
        description: "Leave 25 encouraging comments on others posts",
        category: AchievementCategory::Social,
        icon: "💬",
        kind: CriterionKind::Count,
        target: 25,
        metric: "comments_given",
        points: 75,
        tier: AchievementTier::Bronze,
    },
];

/// Materialize the built-in catalog as insertable records
///
/// Ids are freshly generated; the name-keyed upsert discards them for
/// entries that already exist, so stored ids stay stable across re-seeds.
#[must_use]
pub fn builtin_achievements() -> Vec<Achievement> {
    let now = Utc::now();
    BUILTIN_ACHIEVEMENTS
        .iter()
        .map(|def| Achievement {
            id: Uuid::new_v4(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            category: def.category,
            icon: Some(def.icon.to_string()),
            badge_image: None,
            criteria: AchievementCriteria {
                kind: def.kind,
                target: def.target,
                metric: def.metric.to_string(),
            },
            points: def.points,
            tier: def.tier,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .collect()
}
