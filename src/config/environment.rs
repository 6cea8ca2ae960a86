// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, boundary policy, and runtime configuration parsing
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management for production deployment

use crate::constants::{judge, leaderboard, scheduler};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Largest accepted period-boundary offset from UTC, in minutes.
/// Real-world offsets span UTC-12:00 to UTC+14:00.
const MAX_BOUNDARY_OFFSET_MINUTES: i32 = 14 * 60;
const MIN_BOUNDARY_OFFSET_MINUTES: i32 = -12 * 60;

/// Type-safe database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// SQLite database with file path
    SQLite { path: PathBuf },
    /// In-memory SQLite (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    pub fn parse_url(s: &str) -> Self {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                DatabaseUrl::Memory
            } else {
                DatabaseUrl::SQLite {
                    path: PathBuf::from(path_str),
                }
            }
        } else {
            // Fallback: treat as SQLite file path
            DatabaseUrl::SQLite {
                path: PathBuf::from(s),
            }
        }
    }

    /// Convert to connection string
    pub fn to_connection_string(&self) -> String {
        match self {
            DatabaseUrl::SQLite { path } => format!("sqlite:{}", path.display()),
            DatabaseUrl::Memory => "sqlite::memory:".to_string(),
        }
    }

    /// Check if this is an in-memory database
    pub fn is_memory(&self) -> bool {
        matches!(self, DatabaseUrl::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        DatabaseUrl::SQLite {
            path: PathBuf::from("./data/fitrank.db"),
        }
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Debounce scheduler and per-user lock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Quiet interval between the last queued event and the aggregation pass
    pub quiet_interval_ms: u64,
    /// How long an aggregation pass waits for the per-user lock before conceding
    pub lock_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quiet_interval_ms: scheduler::DEFAULT_QUIET_INTERVAL_MS,
            lock_timeout_secs: scheduler::DEFAULT_LOCK_TIMEOUT_SECS,
        }
    }
}

/// Leaderboard pagination bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Page size when the caller does not provide one
    pub default_page_size: u32,
    /// Hard ceiling on the page size a caller can request
    pub max_page_size: u32,
    /// Neighbors shown on each side of the caller when no range is given
    pub default_nearby_range: u32,
    /// Hard ceiling on the nearby window radius
    pub max_nearby_range: u32,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_page_size: leaderboard::DEFAULT_PAGE_SIZE,
            max_page_size: leaderboard::MAX_PAGE_SIZE,
            default_nearby_range: leaderboard::DEFAULT_NEARBY_RANGE,
            max_nearby_range: leaderboard::MAX_NEARBY_RANGE,
        }
    }
}

/// AI judge connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// API key; the judge is disabled (neutral fallback verdicts) when unset
    pub api_key: Option<String>,
    /// Model identifier sent to the Generative Language API
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: judge::DEFAULT_MODEL.to_string(),
            base_url: judge::DEFAULT_BASE_URL.to_string(),
            timeout_secs: judge::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Database URL (SQLite path or in-memory)
    pub database_url: DatabaseUrl,
    /// Fixed offset from UTC, in minutes, used for every period boundary
    /// and calendar-day identity
    pub boundary_offset_minutes: i32,
    /// Debounce scheduler settings
    pub scheduler: SchedulerConfig,
    /// Leaderboard pagination bounds
    pub leaderboard: LeaderboardConfig,
    /// AI judge settings
    pub judge: JudgeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DatabaseUrl::default(),
            boundary_offset_minutes: 0,
            scheduler: SchedulerConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            judge: JudgeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when `FITRANK_UTC_OFFSET_MINUTES` is outside the
    /// range of real-world UTC offsets. Every other malformed value logs a
    /// warning and falls back to its default.
    pub fn from_env() -> AppResult<Self> {
        let boundary_offset_minutes = parse_env_or("FITRANK_UTC_OFFSET_MINUTES", 0_i32);
        if !(MIN_BOUNDARY_OFFSET_MINUTES..=MAX_BOUNDARY_OFFSET_MINUTES)
            .contains(&boundary_offset_minutes)
        {
            return Err(AppError::config(format!(
                "FITRANK_UTC_OFFSET_MINUTES must be between {MIN_BOUNDARY_OFFSET_MINUTES} and {MAX_BOUNDARY_OFFSET_MINUTES}, got {boundary_offset_minutes}"
            )));
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_or_else(|_| DatabaseUrl::default(), |s| DatabaseUrl::parse_url(&s)),
            boundary_offset_minutes,
            scheduler: SchedulerConfig {
                quiet_interval_ms: parse_env_or(
                    "FITRANK_QUIET_INTERVAL_MS",
                    scheduler::DEFAULT_QUIET_INTERVAL_MS,
                ),
                lock_timeout_secs: parse_env_or(
                    "FITRANK_LOCK_TIMEOUT_SECS",
                    scheduler::DEFAULT_LOCK_TIMEOUT_SECS,
                ),
            },
            leaderboard: LeaderboardConfig {
                default_page_size: parse_env_or(
                    "FITRANK_DEFAULT_PAGE_SIZE",
                    leaderboard::DEFAULT_PAGE_SIZE,
                ),
                max_page_size: parse_env_or("FITRANK_MAX_PAGE_SIZE", leaderboard::MAX_PAGE_SIZE),
                default_nearby_range: parse_env_or(
                    "FITRANK_DEFAULT_NEARBY_RANGE",
                    leaderboard::DEFAULT_NEARBY_RANGE,
                ),
                max_nearby_range: parse_env_or(
                    "FITRANK_MAX_NEARBY_RANGE",
                    leaderboard::MAX_NEARBY_RANGE,
                ),
            },
            judge: JudgeConfig {
                api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env::var("FITRANK_JUDGE_MODEL")
                    .unwrap_or_else(|_| judge::DEFAULT_MODEL.to_string()),
                base_url: env::var("FITRANK_JUDGE_BASE_URL")
                    .unwrap_or_else(|_| judge::DEFAULT_BASE_URL.to_string()),
                timeout_secs: parse_env_or(
                    "FITRANK_JUDGE_TIMEOUT_SECS",
                    judge::DEFAULT_TIMEOUT_SECS,
                ),
            },
        })
    }
}

/// Parse an environment variable, warning and falling back on bad values
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {key} value {raw:?}, using default {default}");
            default
        }),
        Err(_) => default,
    }
}
