// ABOUTME: Main library entry point for the fitrank stats engine
// ABOUTME: Aggregates activity sources into scores, ranks, achievements, and gamification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

#![deny(unsafe_code)]

//! # Fitrank
//!
//! A stats aggregation, scoring, ranking, and achievement engine for fitness
//! platforms. The engine reads raw activity sources (food logs, outdoor and
//! indoor sessions, the daily calorie-balance ledger), reduces them into
//! period-windowed stats records, scores them, assigns leaderboard ranks, and
//! evaluates achievement progress.
//!
//! ## Features
//!
//! - **Windowed aggregation**: daily, weekly, monthly, and all-time buckets
//!   recomputed from source records on every pass
//! - **Composite scoring**: one deterministic formula across periods with a
//!   capped streak bonus
//! - **Leaderboards**: paged, scoped (global, demographic, friends), and
//!   metric-selectable views with privacy filtering
//! - **Batch ranking**: per-(period, scope) rank assignment with isolated
//!   failure units
//! - **Achievements**: a monotone award model over a seedable catalog
//! - **Gamification**: AI-judged battery levels and idempotent daily coin
//!   awards, degrading gracefully when the judge is unreachable
//!
//! ## Quick Start
//!
//! 1. Seed the achievement catalog with the `seed-achievements` binary
//! 2. Run `update-leaderboards` (optionally with `--interval`) to refresh
//!    stats and ranks in batch
//! 3. Embed [`engine::StatsEngine`] in a serving layer for per-request reads
//!
//! ## Architecture
//!
//! The engine follows a modular architecture:
//! - **Windows**: period boundary math under a fixed local-time offset
//! - **Aggregator**: source reads joined and reduced into one stats record,
//!   serialized per user
//! - **Scoring/Streaks**: pure reductions over the aggregated buckets
//! - **Ranking/Leaderboard**: stored batch ranks and on-demand board reads
//! - **Evaluator/Catalog**: achievement progress against the active catalog
//! - **Scheduler**: per-user debounce in front of the refresh pipeline
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fitrank::config::EngineConfig;
//! use fitrank::engine::StatsEngine;
//! use fitrank::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = EngineConfig::from_env()?;
//!     let engine = StatsEngine::connect(&config).await?;
//!
//!     let summary = engine.recompute_all_rankings().await;
//!     println!(
//!         "ranked {} of {} period/scope units",
//!         summary.completed_units(),
//!         summary.outcomes.len()
//!     );
//!     Ok(())
//! }
//! ```

/// Source-to-stats aggregation with per-user write serialization
pub mod aggregator;

/// Built-in achievement catalog definitions
pub mod catalog;

/// Configuration management and environment parsing
pub mod config;

/// Application constants and tuning defaults
pub mod constants;

/// SQLite-backed storage for stats, sources, catalog, and rankings
pub mod database;

/// Engine facade wiring every component behind one handle
pub mod engine;

/// Unified error handling with standard error codes
pub mod errors;

/// Achievement evaluation and progress overviews
pub mod evaluator;

/// Battery levels and daily coin awards
pub mod gamification;

/// AI judgment client for gamification batteries
pub mod judge;

/// Paged, scoped, metric-selectable leaderboard reads
pub mod leaderboard;

/// Production logging and structured output
pub mod logging;

/// Common data models for stats, rankings, and achievements
pub mod models;

/// Batch rank assignment per period and scope
pub mod ranking;

/// Debounced per-user update scheduling
pub mod scheduler;

/// The composite score formula
pub mod scoring;

/// Logging and goal streak state transitions
pub mod streaks;

/// Period window computation under a boundary offset
pub mod windows;
