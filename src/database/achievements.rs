// ABOUTME: Achievement catalog and per-user progress storage
// ABOUTME: Name-keyed catalog upserts for seeding plus evaluator progress writes

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{
    Achievement, AchievementCategory, AchievementCriteria, AchievementTier, CriterionKind,
    UserAchievement,
};

impl Database {
    /// Create achievement catalog and progress tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_achievements(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                icon TEXT,
                badge_image TEXT,
                criteria_kind TEXT NOT NULL,
                criteria_target INTEGER NOT NULL,
                criteria_metric TEXT NOT NULL,
                points INTEGER NOT NULL DEFAULT 0,
                tier TEXT NOT NULL DEFAULT 'bronze',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_achievements (
                user_id TEXT NOT NULL,
                achievement_id TEXT NOT NULL REFERENCES achievements(id) ON DELETE CASCADE,
                progress INTEGER NOT NULL DEFAULT 0,
                completed BOOLEAN NOT NULL DEFAULT 0,
                completed_at DATETIME,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, achievement_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_achievements_active ON achievements(is_active)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_achievements_user ON user_achievements(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a catalog achievement by name
    ///
    /// A name collision refreshes the definition in place; the stored id and
    /// creation time never change, so user progress rows stay attached.
    /// Returns the id actually stored under that name.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or read-back fails
    pub async fn upsert_achievement_by_name(&self, achievement: &Achievement) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO achievements (
                id, name, description, category, icon, badge_image,
                criteria_kind, criteria_target, criteria_metric,
                points, tier, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                category = excluded.category,
                icon = excluded.icon,
                badge_image = excluded.badge_image,
                criteria_kind = excluded.criteria_kind,
                criteria_target = excluded.criteria_target,
                criteria_metric = excluded.criteria_metric,
                points = excluded.points,
                tier = excluded.tier,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            ",
        )
        .bind(achievement.id.to_string())
        .bind(&achievement.name)
        .bind(&achievement.description)
        .bind(achievement.category.as_str())
        .bind(&achievement.icon)
        .bind(&achievement.badge_image)
        .bind(achievement.criteria.kind.as_str())
        .bind(achievement.criteria.target)
        .bind(&achievement.criteria.metric)
        .bind(achievement.points)
        .bind(achievement.tier.as_str())
        .bind(achievement.is_active)
        .bind(achievement.created_at)
        .bind(achievement.updated_at)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id FROM achievements WHERE name = $1")
            .bind(&achievement.name)
            .fetch_one(&self.pool)
            .await?;
        parse_uuid(row.get("id"))
    }

    /// All active catalog achievements, in stable display order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_active_achievements(&self) -> AppResult<Vec<Achievement>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, category, icon, badge_image,
                   criteria_kind, criteria_target, criteria_metric,
                   points, tier, is_active, created_at, updated_at
            FROM achievements
            WHERE is_active = 1
            ORDER BY category ASC, points ASC, name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_achievement).collect()
    }

    /// All progress rows for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user_achievements(&self, user_id: Uuid) -> AppResult<Vec<UserAchievement>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, achievement_id, progress, completed, completed_at,
                   created_at, updated_at
            FROM user_achievements
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user_achievement).collect()
    }

    /// Upsert a per-user progress row
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_user_achievement(&self, record: &UserAchievement) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_achievements (
                user_id, achievement_id, progress, completed, completed_at,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(user_id, achievement_id) DO UPDATE SET
                progress = excluded.progress,
                completed = excluded.completed,
                completed_at = excluded.completed_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(record.user_id.to_string())
        .bind(record.achievement_id.to_string())
        .bind(record.progress)
        .bind(record.completed)
        .bind(record.completed_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_achievement(row: &SqliteRow) -> AppResult<Achievement> {
    Ok(Achievement {
        id: parse_uuid(row.get("id"))?,
        name: row.get("name"),
        description: row.get("description"),
        category: AchievementCategory::from_str_lossy(row.get("category")),
        icon: row.get("icon"),
        badge_image: row.get("badge_image"),
        criteria: AchievementCriteria {
            kind: CriterionKind::from_str_lossy(row.get("criteria_kind")),
            target: row.get("criteria_target"),
            metric: row.get("criteria_metric"),
        },
        points: row.get("points"),
        tier: AchievementTier::from_str_lossy(row.get("tier")),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_user_achievement(row: &SqliteRow) -> AppResult<UserAchievement> {
    Ok(UserAchievement {
        user_id: parse_uuid(row.get("user_id"))?,
        achievement_id: parse_uuid(row.get("achievement_id"))?,
        progress: row.get("progress"),
        completed: row.get("completed"),
        completed_at: row.get("completed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use super::*;
    use chrono::Utc;

    fn sample_achievement(name: &str, target: i64) -> Achievement {
        let now = Utc::now();
        Achievement {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: "Log your first meal".to_string(),
            category: AchievementCategory::Nutrition,
            icon: Some("🍎".to_string()),
            badge_image: None,
            criteria: AchievementCriteria {
                kind: CriterionKind::Count,
                target,
                metric: "meals_logged".to_string(),
            },
            points: 10,
            tier: AchievementTier::Bronze,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_upsert_by_name_keeps_id_and_refreshes_definition() {
        let db = create_test_db().await.unwrap();

        let first = sample_achievement("First Bite", 1);
        let stored = db.upsert_achievement_by_name(&first).await.unwrap();
        assert_eq!(stored, first.id);

        // Re-seeding with a new candidate id must reuse the stored row
        let mut second = sample_achievement("First Bite", 5);
        second.points = 25;
        let kept = db.upsert_achievement_by_name(&second).await.unwrap();
        assert_eq!(kept, first.id);

        let catalog = db.list_active_achievements().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].criteria.target, 5);
        assert_eq!(catalog[0].points, 25);
    }

    #[tokio::test]
    async fn test_inactive_achievements_are_excluded() {
        let db = create_test_db().await.unwrap();

        db.upsert_achievement_by_name(&sample_achievement("Active One", 1))
            .await
            .unwrap();
        let mut retired = sample_achievement("Retired One", 1);
        retired.is_active = false;
        db.upsert_achievement_by_name(&retired).await.unwrap();

        let catalog = db.list_active_achievements().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "Active One");
    }

    #[tokio::test]
    async fn test_user_achievement_progress_round_trip() {
        let db = create_test_db().await.unwrap();
        let achievement = sample_achievement("First Bite", 1);
        let achievement_id = db.upsert_achievement_by_name(&achievement).await.unwrap();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let mut record = UserAchievement {
            user_id,
            achievement_id,
            progress: 0,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        db.upsert_user_achievement(&record).await.unwrap();

        record.progress = 3;
        record.completed = true;
        record.completed_at = Some(now);
        db.upsert_user_achievement(&record).await.unwrap();

        let rows = db.get_user_achievements(user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].progress, 3);
        assert!(rows[0].completed);
        assert!(rows[0].completed_at.is_some());
    }
}
