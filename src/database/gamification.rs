// ABOUTME: Engine-owned gamification state: coin balance and battery levels
// ABOUTME: One row per user, written only by the gamification refresh

use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{Batteries, UserGamification};

impl Database {
    /// Create the gamification table
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails
    pub(super) async fn migrate_gamification(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_gamification (
                user_id TEXT PRIMARY KEY,
                coins INTEGER NOT NULL DEFAULT 0,
                activity_battery INTEGER NOT NULL DEFAULT 0,
                nutrition_battery INTEGER NOT NULL DEFAULT 0,
                health_battery INTEGER NOT NULL DEFAULT 0,
                sleep_battery INTEGER NOT NULL DEFAULT 0,
                total_battery INTEGER NOT NULL DEFAULT 0,
                coins_awarded_today INTEGER NOT NULL DEFAULT 0,
                coins_day DATETIME,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a user's gamification record, or `None` before the first refresh
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_gamification(&self, user_id: Uuid) -> AppResult<Option<UserGamification>> {
        let row = sqlx::query(
            r"
            SELECT user_id, coins, activity_battery, nutrition_battery,
                   health_battery, sleep_battery, total_battery,
                   coins_awarded_today, coins_day, updated_at
            FROM user_gamification WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(UserGamification {
            user_id: parse_uuid(row.get("user_id"))?,
            coins: row.get("coins"),
            batteries: Batteries {
                activity: row.get("activity_battery"),
                nutrition: row.get("nutrition_battery"),
                health: row.get("health_battery"),
                sleep: row.get("sleep_battery"),
                total: row.get("total_battery"),
            },
            coins_awarded_today: row.get("coins_awarded_today"),
            coins_day: row.get("coins_day"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Upsert a user's gamification record
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_gamification(&self, record: &UserGamification) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_gamification (
                user_id, coins, activity_battery, nutrition_battery,
                health_battery, sleep_battery, total_battery,
                coins_awarded_today, coins_day, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT(user_id) DO UPDATE SET
                coins = excluded.coins,
                activity_battery = excluded.activity_battery,
                nutrition_battery = excluded.nutrition_battery,
                health_battery = excluded.health_battery,
                sleep_battery = excluded.sleep_battery,
                total_battery = excluded.total_battery,
                coins_awarded_today = excluded.coins_awarded_today,
                coins_day = excluded.coins_day,
                updated_at = excluded.updated_at
            ",
        )
        .bind(record.user_id.to_string())
        .bind(record.coins)
        .bind(record.batteries.activity)
        .bind(record.batteries.nutrition)
        .bind(record.batteries.health)
        .bind(record.batteries.sleep)
        .bind(record.batteries.total)
        .bind(record.coins_awarded_today)
        .bind(record.coins_day)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_gamification_round_trip() {
        let db = create_test_db().await.unwrap();
        let user_id = Uuid::new_v4();

        assert!(db.get_gamification(user_id).await.unwrap().is_none());

        let now = Utc::now();
        let mut record = UserGamification::empty(user_id, now);
        record.coins = 42;
        record.batteries = Batteries::from_levels(80, 60, 70, 90);
        record.coins_awarded_today = 12;
        record.coins_day = Some(now);

        db.upsert_gamification(&record).await.unwrap();

        let loaded = db.get_gamification(user_id).await.unwrap().unwrap();
        assert_eq!(loaded.coins, 42);
        assert_eq!(loaded.batteries.activity, 80);
        assert_eq!(loaded.batteries.total, 75);
        assert_eq!(loaded.coins_awarded_today, 12);
        assert!(loaded.coins_day.is_some());

        // Second upsert replaces in place
        record.coins = 50;
        db.upsert_gamification(&record).await.unwrap();
        let updated = db.get_gamification(user_id).await.unwrap().unwrap();
        assert_eq!(updated.coins, 50);
    }
}
