// ABOUTME: UserStats row storage: aggregation upserts, privacy, friends, cached ranks
// ABOUTME: Flattened sortable columns plus JSON bucket columns, one row per user

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    AgeGroup, FitnessLevel, Gender, Period, PrivacySettings, PrivacyUpdate, RankScope, Rankings,
    Streaks, UserStats,
};

/// One visible user in batch-ranking order for a period
#[derive(Debug, Clone)]
pub struct RankingCandidate {
    pub user_id: Uuid,
    pub score: i64,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub fitness_level: FitnessLevel,
}

impl Database {
    /// Create stats, rankings, and friends tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_stats(&self) -> AppResult<()> {
        // Demographics, scores, and the current streak are flattened into
        // their own columns so leaderboard queries can filter and sort
        // without touching the JSON buckets
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_stats (
                user_id TEXT PRIMARY KEY,
                gender TEXT NOT NULL DEFAULT 'prefer_not_to_say',
                age_group TEXT NOT NULL DEFAULT 'unknown',
                fitness_level TEXT NOT NULL DEFAULT 'beginner',
                region TEXT NOT NULL DEFAULT 'global',
                daily_score INTEGER NOT NULL DEFAULT 0,
                weekly_score INTEGER NOT NULL DEFAULT 0,
                monthly_score INTEGER NOT NULL DEFAULT 0,
                all_time_score INTEGER NOT NULL DEFAULT 0,
                current_logging_streak INTEGER NOT NULL DEFAULT 0,
                daily_bucket TEXT NOT NULL DEFAULT '{}',
                weekly_bucket TEXT NOT NULL DEFAULT '{}',
                monthly_bucket TEXT NOT NULL DEFAULT '{}',
                all_time_bucket TEXT NOT NULL DEFAULT '{}',
                streaks TEXT NOT NULL DEFAULT '{}',
                show_on_leaderboard BOOLEAN NOT NULL DEFAULT 1,
                show_real_name BOOLEAN NOT NULL DEFAULT 0,
                show_to_friends_only BOOLEAN NOT NULL DEFAULT 0,
                last_updated DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_rankings (
                user_id TEXT NOT NULL REFERENCES user_stats(user_id) ON DELETE CASCADE,
                period TEXT NOT NULL CHECK (period IN ('daily', 'weekly', 'monthly', 'all_time')),
                global_rank INTEGER,
                age_group_rank INTEGER,
                gender_rank INTEGER,
                fitness_level_rank INTEGER,
                computed_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, period)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Friend edges are stored in both directions; the symmetric writers
        // below keep the pair consistent
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_friends (
                user_id TEXT NOT NULL,
                friend_id TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, friend_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_stats_visible ON user_stats(show_on_leaderboard)",
        )
        .execute(&self.pool)
        .await?;

        for column in [
            "daily_score",
            "weekly_score",
            "monthly_score",
            "all_time_score",
            "current_logging_streak",
            "age_group",
            "gender",
            "fitness_level",
        ] {
            let sql =
                format!("CREATE INDEX IF NOT EXISTS idx_user_stats_{column} ON user_stats({column})");
            sqlx::query(&sql).execute(&self.pool).await?;
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_friends_user ON user_friends(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the aggregation-owned fields of a stats record
    ///
    /// Privacy columns, friend edges, and cached ranks are deliberately not
    /// written here; they belong to their own writers.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub async fn upsert_stats(&self, stats: &UserStats) -> AppResult<()> {
        let daily = serde_json::to_string(&stats.daily)?;
        let weekly = serde_json::to_string(&stats.weekly)?;
        let monthly = serde_json::to_string(&stats.monthly)?;
        let all_time = serde_json::to_string(&stats.all_time)?;
        let streaks = serde_json::to_string(&stats.streaks)?;

        sqlx::query(
            r"
            INSERT INTO user_stats (
                user_id, gender, age_group, fitness_level, region,
                daily_score, weekly_score, monthly_score, all_time_score,
                current_logging_streak,
                daily_bucket, weekly_bucket, monthly_bucket, all_time_bucket,
                streaks, last_updated
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT(user_id) DO UPDATE SET
                gender = excluded.gender,
                age_group = excluded.age_group,
                fitness_level = excluded.fitness_level,
                region = excluded.region,
                daily_score = excluded.daily_score,
                weekly_score = excluded.weekly_score,
                monthly_score = excluded.monthly_score,
                all_time_score = excluded.all_time_score,
                current_logging_streak = excluded.current_logging_streak,
                daily_bucket = excluded.daily_bucket,
                weekly_bucket = excluded.weekly_bucket,
                monthly_bucket = excluded.monthly_bucket,
                all_time_bucket = excluded.all_time_bucket,
                streaks = excluded.streaks,
                last_updated = excluded.last_updated
            ",
        )
        .bind(stats.user_id.to_string())
        .bind(stats.demographics.gender.as_str())
        .bind(stats.demographics.age_group.as_str())
        .bind(stats.demographics.fitness_level.as_str())
        .bind(&stats.demographics.region)
        .bind(stats.scores.daily_score)
        .bind(stats.scores.weekly_score)
        .bind(stats.scores.monthly_score)
        .bind(stats.scores.all_time_score)
        .bind(stats.streaks.current_logging_streak)
        .bind(daily)
        .bind(weekly)
        .bind(monthly)
        .bind(all_time)
        .bind(streaks)
        .bind(stats.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a full stats record, including friend edges and cached ranks
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored column is corrupt
    pub async fn get_user_stats(&self, user_id: Uuid) -> AppResult<Option<UserStats>> {
        let row = sqlx::query("SELECT * FROM user_stats WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut stats = row_to_stats(&row)?;
        stats.friends = self.get_friend_ids(user_id).await?;
        stats.rankings = self.load_rankings(user_id).await?;
        Ok(Some(stats))
    }

    /// Insert a default stats row if none exists yet
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn ensure_stats_row(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO user_stats (user_id) VALUES ($1)")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist streak state for a user without touching the rest of the row
    ///
    /// # Errors
    ///
    /// Returns an error if no stats row exists or the write fails
    pub async fn update_streaks(&self, user_id: Uuid, streaks: &Streaks) -> AppResult<()> {
        let payload = serde_json::to_string(streaks)?;
        let result = sqlx::query(
            r"
            UPDATE user_stats
            SET streaks = $2, current_logging_streak = $3, last_updated = $4
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .bind(payload)
        .bind(streaks.current_logging_streak)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Stats for user {user_id}")));
        }
        Ok(())
    }

    /// Apply a partial privacy update, creating the stats row if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the write or read-back fails
    pub async fn update_privacy(
        &self,
        user_id: Uuid,
        update: &PrivacyUpdate,
    ) -> AppResult<PrivacySettings> {
        self.ensure_stats_row(user_id).await?;

        sqlx::query(
            r"
            UPDATE user_stats SET
                show_on_leaderboard = COALESCE($2, show_on_leaderboard),
                show_real_name = COALESCE($3, show_real_name),
                show_to_friends_only = COALESCE($4, show_to_friends_only)
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .bind(update.show_on_leaderboard)
        .bind(update.show_real_name)
        .bind(update.show_to_friends_only)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT show_on_leaderboard, show_real_name, show_to_friends_only FROM user_stats WHERE user_id = $1",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(PrivacySettings {
            show_on_leaderboard: row.get("show_on_leaderboard"),
            show_real_name: row.get("show_real_name"),
            show_to_friends_only: row.get("show_to_friends_only"),
        })
    }

    /// Add a symmetric friend edge, creating stats rows for both sides
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn add_friend_edges(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for id in [user_id, friend_id] {
            sqlx::query("INSERT OR IGNORE INTO user_stats (user_id) VALUES ($1)")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("INSERT OR IGNORE INTO user_friends (user_id, friend_id) VALUES ($1, $2)")
            .bind(user_id.to_string())
            .bind(friend_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT OR IGNORE INTO user_friends (user_id, friend_id) VALUES ($1, $2)")
            .bind(friend_id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a symmetric friend edge
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn remove_friend_edges(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_friends WHERE user_id = $1 AND friend_id = $2")
            .bind(user_id.to_string())
            .bind(friend_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_friends WHERE user_id = $1 AND friend_id = $2")
            .bind(friend_id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Friend ids for a user, in stable order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_friend_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows =
            sqlx::query("SELECT friend_id FROM user_friends WHERE user_id = $1 ORDER BY friend_id")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| parse_uuid(row.get("friend_id")))
            .collect()
    }

    /// Visible users for one period in rank order: score descending, then
    /// user id ascending as the deterministic tiebreak
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn load_ranking_candidates(
        &self,
        period: Period,
    ) -> AppResult<Vec<RankingCandidate>> {
        let score_column = score_column(period);
        let sql = format!(
            r"
            SELECT user_id, {score_column} AS score, gender, age_group, fitness_level
            FROM user_stats
            WHERE show_on_leaderboard = 1
            ORDER BY {score_column} DESC, user_id ASC
            "
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(RankingCandidate {
                    user_id: parse_uuid(row.get("user_id"))?,
                    score: row.get("score"),
                    gender: Gender::from_str_lossy(row.get("gender")),
                    age_group: AgeGroup::from_str_lossy(row.get("age_group")),
                    fitness_level: FitnessLevel::from_str_lossy(row.get("fitness_level")),
                })
            })
            .collect()
    }

    /// Persist one scope's rank assignments for a period atomically
    ///
    /// Users absent from `assignments` (hidden, or no longer qualifying) have
    /// the scope's cached rank cleared in the same transaction, so a stale
    /// rank never outlives the run that dropped the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn write_scope_ranks(
        &self,
        period: Period,
        scope: RankScope,
        assignments: &[(Uuid, u32)],
    ) -> AppResult<()> {
        let clear_sql = match scope {
            RankScope::Global => "UPDATE user_rankings SET global_rank = NULL WHERE period = $1",
            RankScope::AgeGroup => {
                "UPDATE user_rankings SET age_group_rank = NULL WHERE period = $1"
            }
            RankScope::Gender => "UPDATE user_rankings SET gender_rank = NULL WHERE period = $1",
            RankScope::FitnessLevel => {
                "UPDATE user_rankings SET fitness_level_rank = NULL WHERE period = $1"
            }
        };
        let sql = match scope {
            RankScope::Global => {
                r"
                INSERT INTO user_rankings (user_id, period, global_rank, computed_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(user_id, period) DO UPDATE SET
                    global_rank = excluded.global_rank,
                    computed_at = excluded.computed_at
                "
            }
            RankScope::AgeGroup => {
                r"
                INSERT INTO user_rankings (user_id, period, age_group_rank, computed_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(user_id, period) DO UPDATE SET
                    age_group_rank = excluded.age_group_rank,
                    computed_at = excluded.computed_at
                "
            }
            RankScope::Gender => {
                r"
                INSERT INTO user_rankings (user_id, period, gender_rank, computed_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(user_id, period) DO UPDATE SET
                    gender_rank = excluded.gender_rank,
                    computed_at = excluded.computed_at
                "
            }
            RankScope::FitnessLevel => {
                r"
                INSERT INTO user_rankings (user_id, period, fitness_level_rank, computed_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(user_id, period) DO UPDATE SET
                    fitness_level_rank = excluded.fitness_level_rank,
                    computed_at = excluded.computed_at
                "
            }
        };

        let computed_at = Utc::now();
        let mut tx = self.pool.begin().await?;
        sqlx::query(clear_sql)
            .bind(period.as_str())
            .execute(&mut *tx)
            .await?;
        for (user_id, rank) in assignments {
            sqlx::query(sql)
                .bind(user_id.to_string())
                .bind(period.as_str())
                .bind(*rank)
                .bind(computed_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Cached ranks for a user across all periods
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored period is corrupt
    pub async fn load_rankings(&self, user_id: Uuid) -> AppResult<Rankings> {
        let rows = sqlx::query(
            r"
            SELECT period, global_rank, age_group_rank, gender_rank, fitness_level_rank
            FROM user_rankings
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut rankings = Rankings::default();
        for row in &rows {
            let period: Period = row
                .get::<String, _>("period")
                .parse()
                .map_err(|_| AppError::database("Invalid period in user_rankings"))?;
            let ranks = rankings.for_period_mut(period);
            ranks.global_rank = row.get("global_rank");
            ranks.age_group_rank = row.get("age_group_rank");
            ranks.gender_rank = row.get("gender_rank");
            ranks.fitness_level_rank = row.get("fitness_level_rank");
        }
        Ok(rankings)
    }
}

/// Score column for a period
pub(super) const fn score_column(period: Period) -> &'static str {
    match period {
        Period::Daily => "daily_score",
        Period::Weekly => "weekly_score",
        Period::Monthly => "monthly_score",
        Period::AllTime => "all_time_score",
    }
}

/// Convert a user_stats row to a `UserStats` record
///
/// Friend edges and cached ranks live in their own tables and are left at
/// their defaults here; `get_user_stats` fills them in.
pub(super) fn row_to_stats(row: &SqliteRow) -> AppResult<UserStats> {
    let user_id = parse_uuid(row.get("user_id"))?;

    let daily = serde_json::from_str(row.get("daily_bucket"))?;
    let weekly = serde_json::from_str(row.get("weekly_bucket"))?;
    let monthly = serde_json::from_str(row.get("monthly_bucket"))?;
    let all_time = serde_json::from_str(row.get("all_time_bucket"))?;
    let streaks = serde_json::from_str(row.get("streaks"))?;

    Ok(UserStats {
        user_id,
        demographics: crate::models::Demographics {
            gender: Gender::from_str_lossy(row.get("gender")),
            age_group: AgeGroup::from_str_lossy(row.get("age_group")),
            fitness_level: FitnessLevel::from_str_lossy(row.get("fitness_level")),
            region: row.get("region"),
        },
        daily,
        weekly,
        monthly,
        all_time,
        streaks,
        rankings: Rankings::default(),
        scores: crate::models::Scores {
            daily_score: row.get("daily_score"),
            weekly_score: row.get("weekly_score"),
            monthly_score: row.get("monthly_score"),
            all_time_score: row.get("all_time_score"),
        },
        friends: Vec::new(),
        privacy: PrivacySettings {
            show_on_leaderboard: row.get("show_on_leaderboard"),
            show_real_name: row.get("show_real_name"),
            show_to_friends_only: row.get("show_to_friends_only"),
        },
        last_updated: row.get::<DateTime<Utc>, _>("last_updated"),
    })
}
