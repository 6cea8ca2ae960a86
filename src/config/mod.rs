// ABOUTME: Configuration module root re-exporting the environment-driven engine config
// ABOUTME: All runtime tuning enters the engine through these types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! Engine configuration
//!
//! Configuration is environment-only: there is no config file layer. Every
//! knob has a default that works for local development against SQLite.

pub mod environment;

pub use environment::{
    DatabaseUrl, EngineConfig, JudgeConfig, LeaderboardConfig, SchedulerConfig,
};
