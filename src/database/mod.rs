// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite-backed storage for the stats engine. One [`Database`] wraps the
//! connection pool; operations are grouped by concern across the submodules
//! (stats rows, activity sources, achievement catalog, gamification,
//! leaderboard reads). Migrations run inline on startup and are idempotent.

mod achievements;
mod gamification;
mod leaderboard;
mod sources;
mod stats;

pub use leaderboard::{BoardQuery, LeaderboardRow};
pub use sources::{
    FoodLogRecord, FoodTotals, GeoSessionRecord, GeoTotals, LedgerEntry, ProgramSessionRecord,
    ProgramTotals,
};
pub use stats::RankingCandidate;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Database manager for stats, source, and catalog storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or a
    /// migration statement fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let is_memory = database_url.contains("memory");

        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !is_memory {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        // Each pooled connection opens its own private in-memory database,
        // so the memory case must pin the pool to one long-lived connection
        // or the schema vanishes under concurrent acquires.
        let pool = if is_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(&connection_options)
                .await?
        } else {
            SqlitePool::connect(&connection_options).await?
        };

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_sources().await?;
        self.migrate_stats().await?;
        self.migrate_achievements().await?;
        self.migrate_gamification().await?;
        Ok(())
    }
}

/// Parse a stored uuid column, surfacing corruption as a database error
pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("Invalid uuid in database: {value}: {e}")))
}
