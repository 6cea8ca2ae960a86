// ABOUTME: Leaderboard read queries: visibility, scope, and activity filtering in SQL
// ABOUTME: Returns stats rows joined with profile display fields

use sqlx::Row;
use uuid::Uuid;

use super::stats::row_to_stats;
use super::Database;
use crate::errors::AppResult;
use crate::models::{AgeGroup, FitnessLevel, Gender, UserStats};

/// Board row scope restriction
#[derive(Debug, Clone)]
enum BoardScope {
    All,
    AgeGroup(AgeGroup),
    Gender(Gender),
    FitnessLevel(FitnessLevel),
    Members(Vec<Uuid>),
}

/// Filter set shared by the page, count, and own-rank queries
///
/// Every variant includes the visibility filter; the activity filter is
/// opt-in because only full page listings hide never-active users.
#[derive(Debug, Clone)]
pub struct BoardQuery {
    scope: BoardScope,
    require_activity: bool,
}

impl BoardQuery {
    /// All visible users
    #[must_use]
    pub const fn all() -> Self {
        Self {
            scope: BoardScope::All,
            require_activity: false,
        }
    }

    /// Visible users in one age bracket
    #[must_use]
    pub const fn age_group(group: AgeGroup) -> Self {
        Self {
            scope: BoardScope::AgeGroup(group),
            require_activity: false,
        }
    }

    /// Visible users of one gender
    #[must_use]
    pub const fn gender(gender: Gender) -> Self {
        Self {
            scope: BoardScope::Gender(gender),
            require_activity: false,
        }
    }

    /// Visible users in one fitness bracket
    #[must_use]
    pub const fn fitness_level(level: FitnessLevel) -> Self {
        Self {
            scope: BoardScope::FitnessLevel(level),
            require_activity: false,
        }
    }

    /// Visible users restricted to an explicit member set
    #[must_use]
    pub fn members(ids: Vec<Uuid>) -> Self {
        Self {
            scope: BoardScope::Members(ids),
            require_activity: false,
        }
    }

    /// Additionally exclude users with no recorded activity at all
    #[must_use]
    pub const fn require_activity(mut self) -> Self {
        self.require_activity = true;
        self
    }

    /// WHERE fragment after the visibility filter, plus its binds
    fn clause(&self) -> (String, Vec<String>) {
        let mut sql = String::new();
        let mut binds = Vec::new();

        if self.require_activity {
            sql.push_str(
                r"
                AND (s.daily_score > 0 OR s.weekly_score > 0
                     OR s.monthly_score > 0 OR s.all_time_score > 0
                     OR json_extract(s.all_time_bucket, '$.total_meals_logged') > 0
                     OR json_extract(s.all_time_bucket, '$.total_workouts_completed') > 0
                     OR json_extract(s.all_time_bucket, '$.total_activity_minutes') > 0)
                ",
            );
        }

        match &self.scope {
            BoardScope::All => {}
            BoardScope::AgeGroup(group) => {
                sql.push_str(" AND s.age_group = ?");
                binds.push(group.as_str().to_string());
            }
            BoardScope::Gender(gender) => {
                sql.push_str(" AND s.gender = ?");
                binds.push(gender.as_str().to_string());
            }
            BoardScope::FitnessLevel(level) => {
                sql.push_str(" AND s.fitness_level = ?");
                binds.push(level.as_str().to_string());
            }
            BoardScope::Members(ids) => {
                if ids.is_empty() {
                    sql.push_str(" AND 1 = 0");
                } else {
                    let placeholders = vec!["?"; ids.len()].join(", ");
                    sql.push_str(&format!(" AND s.user_id IN ({placeholders})"));
                    binds.extend(ids.iter().map(Uuid::to_string));
                }
            }
        }

        (sql, binds)
    }
}

/// One board row: the stats record plus the joined profile display fields
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub stats: UserStats,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Database {
    /// Fetch one page of board rows in the given order
    ///
    /// `order_expr` must come from the engine's metric table, never from
    /// caller input.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored column is corrupt
    pub async fn fetch_board_rows(
        &self,
        query: &BoardQuery,
        order_expr: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<LeaderboardRow>> {
        let (clause, binds) = query.clause();
        let sql = format!(
            r"
            SELECT s.*, u.username, u.display_name, u.avatar_url
            FROM user_stats s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.show_on_leaderboard = 1 {clause}
            ORDER BY {order_expr}
            LIMIT ? OFFSET ?
            "
        );

        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let rows = q.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(LeaderboardRow {
                    stats: row_to_stats(row)?,
                    username: row.get("username"),
                    display_name: row.get("display_name"),
                    avatar_url: row.get("avatar_url"),
                })
            })
            .collect()
    }

    /// Count all rows matching a board query
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_board_rows(&self, query: &BoardQuery) -> AppResult<i64> {
        let (clause, binds) = query.clause();
        let sql = format!(
            r"
            SELECT COUNT(*) AS count
            FROM user_stats s
            WHERE s.show_on_leaderboard = 1 {clause}
            "
        );

        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.get("count"))
    }

    /// A user's current metric value, evaluated by the same SQL expression
    /// the board queries order by
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn metric_value_for(
        &self,
        metric_expr: &str,
        user_id: Uuid,
    ) -> AppResult<Option<f64>> {
        let sql = format!(
            "SELECT CAST({metric_expr} AS REAL) AS value FROM user_stats s WHERE s.user_id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Count users ordered strictly ahead of the given user: a greater
    /// metric value, or an equal value with a smaller user id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_ranked_ahead(
        &self,
        query: &BoardQuery,
        metric_expr: &str,
        metric_value: f64,
        user_id: Uuid,
    ) -> AppResult<i64> {
        let (clause, binds) = query.clause();
        let sql = format!(
            r"
            SELECT COUNT(*) AS count
            FROM user_stats s
            WHERE s.show_on_leaderboard = 1 {clause}
              AND ({metric_expr} > ? OR ({metric_expr} = ? AND s.user_id < ?))
            "
        );

        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let row = q
            .bind(metric_value)
            .bind(metric_value)
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}
