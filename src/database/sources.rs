// ABOUTME: Activity source stores: profiles, food logs, sessions, calorie ledger
// ABOUTME: Windowed read accessors for aggregation plus ingest writers for the CRUD layer

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{ActivityLevel, Gender, LedgerStatus, UserProfile};

/// One food log entry
#[derive(Debug, Clone)]
pub struct FoodLogRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub logged_at: DateTime<Utc>,
}

/// One completed outdoor session with GPS-derived moving time
#[derive(Debug, Clone)]
pub struct GeoSessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub calories_burned: f64,
    pub moving_time_sec: i64,
    pub distance_m: f64,
    pub completed_at: DateTime<Utc>,
}

/// One completed guided program session
#[derive(Debug, Clone)]
pub struct ProgramSessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub program_name: Option<String>,
    pub calories_burned: f64,
    pub total_duration_minutes: i64,
    pub completed_at: DateTime<Utc>,
}

/// One daily calorie-balance ledger entry, keyed by local day
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub consumed: f64,
    pub burned: f64,
    pub status: LedgerStatus,
    pub target_calories: Option<f64>,
}

/// Food log reductions over one window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FoodTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub count: i64,
}

/// Outdoor session reductions over one window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoTotals {
    pub calories_burned: f64,
    pub moving_time_sec: i64,
    pub count: i64,
}

/// Program session reductions over one window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgramTotals {
    pub calories_burned: f64,
    pub duration_minutes: i64,
    pub count: i64,
}

impl Database {
    /// Create the activity source tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_sources(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                display_name TEXT,
                avatar_url TEXT,
                gender TEXT,
                birthdate DATE,
                activity_level TEXT,
                sleep_hours REAL,
                bmi REAL,
                health_conditions TEXT NOT NULL DEFAULT '[]',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS food_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                calories REAL NOT NULL DEFAULT 0,
                protein_g REAL NOT NULL DEFAULT 0,
                carbs_g REAL NOT NULL DEFAULT 0,
                fat_g REAL NOT NULL DEFAULT 0,
                logged_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS geo_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                activity_type TEXT NOT NULL DEFAULT 'run',
                calories_burned REAL NOT NULL DEFAULT 0,
                moving_time_sec INTEGER NOT NULL DEFAULT 0,
                distance_m REAL NOT NULL DEFAULT 0,
                completed_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS program_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                program_name TEXT,
                calories_burned REAL NOT NULL DEFAULT 0,
                total_duration_minutes INTEGER NOT NULL DEFAULT 0,
                completed_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS calorie_ledger (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                entry_date DATE NOT NULL,
                consumed REAL NOT NULL DEFAULT 0,
                burned REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL CHECK (status IN ('on_target', 'over', 'under')),
                target_calories REAL,
                PRIMARY KEY (user_id, entry_date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        for (name, table, columns) in [
            ("idx_food_logs_user_time", "food_logs", "user_id, logged_at"),
            ("idx_geo_sessions_user_time", "geo_sessions", "user_id, completed_at"),
            ("idx_program_sessions_user_time", "program_sessions", "user_id, completed_at"),
            ("idx_calorie_ledger_status", "calorie_ledger", "user_id, status"),
        ] {
            let sql = format!("CREATE INDEX IF NOT EXISTS {name} ON {table}({columns})");
            sqlx::query(&sql).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Get a user's profile, or `None` for an unknown user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT id, username, display_name, avatar_url, gender, birthdate,
                   activity_level, sleep_hours, bmi, health_conditions, created_at
            FROM users WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let health_conditions: Vec<String> =
            serde_json::from_str(row.get("health_conditions")).unwrap_or_default();

        Ok(Some(UserProfile {
            user_id: parse_uuid(row.get("id"))?,
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            gender: row
                .get::<Option<String>, _>("gender")
                .map(|g| Gender::from_str_lossy(&g)),
            birthdate: row.get("birthdate"),
            activity_level: row
                .get::<Option<String>, _>("activity_level")
                .map(|a| ActivityLevel::from_str_lossy(&a)),
            sleep_hours: row.get("sleep_hours"),
            bmi: row.get("bmi"),
            health_conditions,
            created_at: row.get("created_at"),
        }))
    }

    /// Create or update a user profile
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        let health_conditions = serde_json::to_string(&profile.health_conditions)?;

        sqlx::query(
            r"
            INSERT INTO users (
                id, username, display_name, avatar_url, gender, birthdate,
                activity_level, sleep_hours, bmi, health_conditions, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                gender = excluded.gender,
                birthdate = excluded.birthdate,
                activity_level = excluded.activity_level,
                sleep_hours = excluded.sleep_hours,
                bmi = excluded.bmi,
                health_conditions = excluded.health_conditions
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(profile.birthdate)
        .bind(profile.activity_level.map(|a| a.as_str()))
        .bind(profile.sleep_hours)
        .bind(profile.bmi)
        .bind(health_conditions)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All registered user ids, ordered for deterministic batch iteration
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_user_ids(&self) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| parse_uuid(row.get("id"))).collect()
    }

    /// Sum food logs over `[start, end]`; `None` start means no lower bound
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn sum_food_logs(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> AppResult<FoodTotals> {
        let row = if let Some(start) = start {
            sqlx::query(
                r"
                SELECT COALESCE(SUM(calories), 0.0) AS calories,
                       COALESCE(SUM(protein_g), 0.0) AS protein_g,
                       COALESCE(SUM(carbs_g), 0.0) AS carbs_g,
                       COALESCE(SUM(fat_g), 0.0) AS fat_g,
                       COUNT(*) AS count
                FROM food_logs
                WHERE user_id = $1 AND logged_at >= $2 AND logged_at <= $3
                ",
            )
            .bind(user_id.to_string())
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                SELECT COALESCE(SUM(calories), 0.0) AS calories,
                       COALESCE(SUM(protein_g), 0.0) AS protein_g,
                       COALESCE(SUM(carbs_g), 0.0) AS carbs_g,
                       COALESCE(SUM(fat_g), 0.0) AS fat_g,
                       COUNT(*) AS count
                FROM food_logs
                WHERE user_id = $1 AND logged_at <= $2
                ",
            )
            .bind(user_id.to_string())
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(FoodTotals {
            calories: row.get("calories"),
            protein_g: row.get("protein_g"),
            carbs_g: row.get("carbs_g"),
            fat_g: row.get("fat_g"),
            count: row.get("count"),
        })
    }

    /// Food log entries over `[start, end]`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_food_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<FoodLogRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, calories, protein_g, carbs_g, fat_g, logged_at
            FROM food_logs
            WHERE user_id = $1 AND logged_at >= $2 AND logged_at <= $3
            ORDER BY logged_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FoodLogRecord {
                    id: parse_uuid(row.get("id"))?,
                    user_id: parse_uuid(row.get("user_id"))?,
                    name: row.get("name"),
                    calories: row.get("calories"),
                    protein_g: row.get("protein_g"),
                    carbs_g: row.get("carbs_g"),
                    fat_g: row.get("fat_g"),
                    logged_at: row.get("logged_at"),
                })
            })
            .collect()
    }

    /// Record a food log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn record_food_log(&self, record: &FoodLogRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO food_logs (id, user_id, name, calories, protein_g, carbs_g, fat_g, logged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.name)
        .bind(record.calories)
        .bind(record.protein_g)
        .bind(record.carbs_g)
        .bind(record.fat_g)
        .bind(record.logged_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sum outdoor sessions over `[start, end]`; `None` start means no lower bound
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn sum_geo_sessions(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> AppResult<GeoTotals> {
        let row = if let Some(start) = start {
            sqlx::query(
                r"
                SELECT COALESCE(SUM(calories_burned), 0.0) AS calories_burned,
                       COALESCE(SUM(moving_time_sec), 0) AS moving_time_sec,
                       COUNT(*) AS count
                FROM geo_sessions
                WHERE user_id = $1 AND completed_at >= $2 AND completed_at <= $3
                ",
            )
            .bind(user_id.to_string())
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                SELECT COALESCE(SUM(calories_burned), 0.0) AS calories_burned,
                       COALESCE(SUM(moving_time_sec), 0) AS moving_time_sec,
                       COUNT(*) AS count
                FROM geo_sessions
                WHERE user_id = $1 AND completed_at <= $2
                ",
            )
            .bind(user_id.to_string())
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(GeoTotals {
            calories_burned: row.get("calories_burned"),
            moving_time_sec: row.get("moving_time_sec"),
            count: row.get("count"),
        })
    }

    /// Record a completed outdoor session
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn record_geo_session(&self, record: &GeoSessionRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO geo_sessions (id, user_id, activity_type, calories_burned, moving_time_sec, distance_m, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.activity_type)
        .bind(record.calories_burned)
        .bind(record.moving_time_sec)
        .bind(record.distance_m)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sum program sessions over `[start, end]`; `None` start means no lower bound
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn sum_program_sessions(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> AppResult<ProgramTotals> {
        let row = if let Some(start) = start {
            sqlx::query(
                r"
                SELECT COALESCE(SUM(calories_burned), 0.0) AS calories_burned,
                       COALESCE(SUM(total_duration_minutes), 0) AS duration_minutes,
                       COUNT(*) AS count
                FROM program_sessions
                WHERE user_id = $1 AND completed_at >= $2 AND completed_at <= $3
                ",
            )
            .bind(user_id.to_string())
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                SELECT COALESCE(SUM(calories_burned), 0.0) AS calories_burned,
                       COALESCE(SUM(total_duration_minutes), 0) AS duration_minutes,
                       COUNT(*) AS count
                FROM program_sessions
                WHERE user_id = $1 AND completed_at <= $2
                ",
            )
            .bind(user_id.to_string())
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(ProgramTotals {
            calories_burned: row.get("calories_burned"),
            duration_minutes: row.get("duration_minutes"),
            count: row.get("count"),
        })
    }

    /// Record a completed program session
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn record_program_session(&self, record: &ProgramSessionRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO program_sessions (id, user_id, program_name, calories_burned, total_duration_minutes, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.program_name)
        .bind(record.calories_burned)
        .bind(record.total_duration_minutes)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Count on-target ledger days in `[start, end]`; `None` start means no
    /// lower bound
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_on_target_days(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> AppResult<i64> {
        let row = if let Some(start) = start {
            sqlx::query(
                r"
                SELECT COUNT(*) AS count FROM calorie_ledger
                WHERE user_id = $1 AND status = 'on_target'
                  AND entry_date >= $2 AND entry_date <= $3
                ",
            )
            .bind(user_id.to_string())
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                SELECT COUNT(*) AS count FROM calorie_ledger
                WHERE user_id = $1 AND status = 'on_target' AND entry_date <= $2
                ",
            )
            .bind(user_id.to_string())
            .bind(end)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(row.get("count"))
    }

    /// All on-target ledger days for a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_on_target_days(&self, user_id: Uuid) -> AppResult<Vec<NaiveDate>> {
        let rows = sqlx::query(
            r"
            SELECT entry_date FROM calorie_ledger
            WHERE user_id = $1 AND status = 'on_target'
            ORDER BY entry_date ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("entry_date")).collect())
    }

    /// Create or update a daily ledger entry
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn record_ledger_entry(&self, entry: &LedgerEntry) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO calorie_ledger (user_id, entry_date, consumed, burned, status, target_calories)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(user_id, entry_date) DO UPDATE SET
                consumed = excluded.consumed,
                burned = excluded.burned,
                status = excluded.status,
                target_calories = excluded.target_calories
            ",
        )
        .bind(entry.user_id.to_string())
        .bind(entry.entry_date)
        .bind(entry.consumed)
        .bind(entry.burned)
        .bind(entry.status.as_str())
        .bind(entry.target_calories)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
