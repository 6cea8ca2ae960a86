// ABOUTME: Batch maintenance pass: refresh every user's stats, then recompute stored ranks
// ABOUTME: Runs once by default; --interval turns it into a long-lived maintenance loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! Leaderboard maintenance batch.
//!
//! Walks every registered user through a stats refresh (which also evaluates
//! achievements), then recomputes the stored rank columns for every period
//! and scope. Per-user failures are counted and logged, never fatal: one bad
//! profile must not stall the rest of the batch.
//!
//! Usage:
//! ```bash
//! # One maintenance pass (uses DATABASE_URL / FITRANK_* from environment)
//! cargo run --bin update-leaderboards
//!
//! # Re-run every hour until ctrl-c
//! cargo run --bin update-leaderboards -- --interval 3600
//!
//! # Override database URL
//! cargo run --bin update-leaderboards -- --database-url sqlite:./data/fitrank.db
//! ```

use anyhow::Result;
use clap::Parser;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use fitrank::config::{DatabaseUrl, EngineConfig};
use fitrank::engine::StatsEngine;
use fitrank::logging::LoggingConfig;

#[derive(Parser)]
#[command(
    name = "update-leaderboards",
    about = "Refresh user stats and recompute leaderboard ranks",
    long_about = "Refreshes stats and achievements for every registered user, then \
                  recomputes the stored ranks for every period and scope. Runs once \
                  by default; pass --interval to keep it running on a fixed cadence."
)]
struct BatchArgs {
    /// Database URL (defaults to DATABASE_URL env var or sqlite:./data/fitrank.db)
    #[arg(long)]
    database_url: Option<String>,

    /// Re-run the batch every N seconds instead of exiting after one pass
    #[arg(long)]
    interval: Option<u64>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = BatchArgs::parse();

    let mut logging = LoggingConfig::from_env();
    if args.verbose {
        logging.level = "debug".into();
    }
    logging.init()?;

    info!("=== Fitrank Leaderboard Maintenance ===");

    let mut config = EngineConfig::from_env()?;
    if let Some(url) = args.database_url {
        config.database_url = DatabaseUrl::parse_url(&url);
    }

    info!(
        "Connecting to database: {}",
        config.database_url.to_connection_string()
    );
    let engine = StatsEngine::connect(&config).await?;

    match args.interval {
        None => run_batch(&engine).await?,
        Some(seconds) => {
            let cadence = Duration::from_secs(seconds.max(1));
            info!("Running every {}s until ctrl-c", cadence.as_secs());
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => run_batch(&engine).await?,
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received, stopping");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// One full maintenance pass over every registered user
async fn run_batch(engine: &StatsEngine) -> Result<()> {
    let started = Instant::now();
    let user_ids = engine.database().list_user_ids().await?;
    info!("Refreshing stats for {} users...", user_ids.len());

    let mut refreshed = 0usize;
    let mut failed = 0usize;
    for user_id in user_ids {
        match engine.refresh_stats(user_id).await {
            Ok(outcome) => {
                refreshed += 1;
                if !outcome.newly_earned.is_empty() {
                    info!(
                        "  ✓ {user_id}: {} new achievements",
                        outcome.newly_earned.len()
                    );
                }
            }
            Err(e) => {
                failed += 1;
                warn!("  ✗ {user_id}: {e}");
            }
        }
    }

    let summary = engine.recompute_all_rankings().await;
    for outcome in &summary.outcomes {
        if let Some(error) = &outcome.error {
            warn!("  ✗ {}/{}: {error}", outcome.period, outcome.scope);
        }
    }

    info!("=== Maintenance Pass Complete ===");
    info!(
        "{refreshed} users refreshed, {failed} failed, {}/{} ranking units ok, took {:?}",
        summary.completed_units(),
        summary.outcomes.len(),
        started.elapsed()
    );
    Ok(())
}
