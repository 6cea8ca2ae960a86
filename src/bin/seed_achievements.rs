// ABOUTME: Seeds the built-in achievement catalog into the engine database
// ABOUTME: Upserts by name so re-running refreshes definitions without duplicates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! Achievement catalog seeder.
//!
//! Loads the built-in achievement definitions into the database so the
//! evaluator has a catalog to score against. Definitions are upserted by
//! name: re-running after a catalog change updates descriptions, targets,
//! and points in place, and per-user progress rows are never touched.
//!
//! Usage:
//! ```bash
//! # Seed achievements (uses DATABASE_URL from environment)
//! cargo run --bin seed-achievements
//!
//! # Override database URL
//! cargo run --bin seed-achievements -- --database-url sqlite:./data/fitrank.db
//!
//! # Verbose output
//! cargo run --bin seed-achievements -- -v
//! ```

use anyhow::Result;
use clap::Parser;
use std::env;
use tracing::{info, warn};

use fitrank::catalog::builtin_achievements;
use fitrank::config::DatabaseUrl;
use fitrank::database::Database;

#[derive(Parser)]
#[command(
    name = "seed-achievements",
    about = "Seed the built-in achievement catalog",
    long_about = "Upserts the built-in achievement definitions into the engine database. \
                  Safe to re-run: definitions are matched by name and updated in place."
)]
struct SeedArgs {
    /// Database URL (defaults to DATABASE_URL env var or sqlite:./data/fitrank.db)
    #[arg(long)]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("=== Fitrank Achievement Catalog Seeder ===");

    let raw_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:./data/fitrank.db".into());
    let database_url = DatabaseUrl::parse_url(&raw_url).to_connection_string();

    info!("Connecting to database: {}", database_url);
    let db = Database::new(&database_url).await?;

    let catalog = builtin_achievements();
    info!("Seeding {} achievement definitions...", catalog.len());

    let mut seeded = 0usize;
    let mut failed = 0usize;
    for achievement in &catalog {
        match db.upsert_achievement_by_name(achievement).await {
            Ok(_) => {
                seeded += 1;
                info!(
                    "  ✓ {} ({}, {} tier, {} pts)",
                    achievement.name,
                    achievement.category.as_str(),
                    achievement.tier.as_str(),
                    achievement.points
                );
            }
            Err(e) => {
                failed += 1;
                warn!("  ✗ {} - {}", achievement.name, e);
            }
        }
    }

    info!("=== Seeding Complete ===");
    info!("Upserted {seeded} of {} achievements", catalog.len());
    if failed > 0 {
        warn!("{failed} achievements failed to seed");
    }

    Ok(())
}
