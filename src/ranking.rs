// ABOUTME: Batch rank assignment across periods and demographic scopes
// ABOUTME: One failed (period, scope) unit never blocks the others
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Ranking Assigner
//!
//! Ranks are assigned in batch, not per request: visible users are sorted by
//! the period score (ties broken by ascending user id), globally ranked, and
//! then re-ranked within each demographic partition starting at 1. Every
//! (period, scope) unit writes in its own transaction, so a failure there is
//! logged and skipped while the remaining units still complete.
//!
//! The batch only writes the cached `rankings` subtree and may run
//! concurrently with per-user aggregation passes; the on-demand rank count
//! in the leaderboard module exists so callers never depend on this batch
//! having run recently.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::{Database, RankingCandidate};
use crate::errors::AppError;
use crate::models::{Period, RankScope};

/// Outcome of one (period, scope) ranking unit
#[derive(Debug, Clone, Serialize)]
pub struct ScopeOutcome {
    pub period: Period,
    pub scope: RankScope,
    /// Users assigned a rank by this unit
    pub users_ranked: usize,
    /// Failure message when the unit did not complete
    pub error: Option<String>,
}

impl ScopeOutcome {
    fn completed(period: Period, scope: RankScope, users_ranked: usize) -> Self {
        Self {
            period,
            scope,
            users_ranked,
            error: None,
        }
    }

    fn failed(period: Period, scope: RankScope, err: &AppError) -> Self {
        Self {
            period,
            scope,
            users_ranked: 0,
            error: Some(err.to_string()),
        }
    }
}

/// Result of a full ranking batch across all periods and scopes
#[derive(Debug, Clone, Serialize)]
pub struct RankingSummary {
    pub outcomes: Vec<ScopeOutcome>,
}

impl RankingSummary {
    /// Units that completed
    #[must_use]
    pub fn completed_units(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    /// Units that failed and were skipped
    #[must_use]
    pub fn failed_units(&self) -> usize {
        self.outcomes.len() - self.completed_units()
    }
}

/// Assigns cached ranks from the visible, score-sorted user set
#[derive(Clone)]
pub struct RankingAssigner {
    db: Database,
}

impl RankingAssigner {
    /// Create an assigner over the given store
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Recompute all four scope rankings for one period
    ///
    /// Never fails as a whole: each scope's outcome reports its own result,
    /// and a candidate-load failure marks all four scopes failed.
    pub async fn recompute_period(&self, period: Period) -> Vec<ScopeOutcome> {
        let candidates = match self.db.load_ranking_candidates(period).await {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(
                    period = period.as_str(),
                    error = %err,
                    "loading ranking candidates failed"
                );
                return RankScope::ALL
                    .iter()
                    .map(|&scope| ScopeOutcome::failed(period, scope, &err))
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(RankScope::ALL.len());
        for scope in RankScope::ALL {
            let assignments = scope_assignments(scope, &candidates);
            match self.db.write_scope_ranks(period, scope, &assignments).await {
                Ok(()) => {
                    outcomes.push(ScopeOutcome::completed(period, scope, assignments.len()));
                }
                Err(err) => {
                    error!(
                        period = period.as_str(),
                        scope = scope.as_str(),
                        error = %err,
                        "rank write failed, continuing with remaining scopes"
                    );
                    outcomes.push(ScopeOutcome::failed(period, scope, &err));
                }
            }
        }
        outcomes
    }

    /// Recompute every period and scope, collecting per-unit outcomes
    pub async fn recompute_all(&self) -> RankingSummary {
        let mut outcomes = Vec::with_capacity(Period::ALL.len() * RankScope::ALL.len());
        for period in Period::ALL {
            outcomes.extend(self.recompute_period(period).await);
        }

        let summary = RankingSummary { outcomes };
        info!(
            completed = summary.completed_units(),
            failed = summary.failed_units(),
            "ranking batch finished"
        );
        summary
    }
}

/// Rank assignments for one scope over the already-sorted candidate list
///
/// Demographic scopes rank within each partition value independently; the
/// running counter per value preserves the sorted order inside every
/// partition, including the unknown buckets.
fn scope_assignments(scope: RankScope, candidates: &[RankingCandidate]) -> Vec<(Uuid, u32)> {
    if scope == RankScope::Global {
        return candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| (candidate.user_id, index as u32 + 1))
            .collect();
    }

    let mut next_rank: HashMap<&str, u32> = HashMap::new();
    candidates
        .iter()
        .map(|candidate| {
            let key = partition_key(scope, candidate);
            let rank = next_rank.entry(key).or_insert(0);
            *rank += 1;
            (candidate.user_id, *rank)
        })
        .collect()
}

fn partition_key(scope: RankScope, candidate: &RankingCandidate) -> &'static str {
    match scope {
        RankScope::AgeGroup => candidate.age_group.as_str(),
        RankScope::Gender => candidate.gender.as_str(),
        // Global is handled before partitioning
        RankScope::Global | RankScope::FitnessLevel => candidate.fitness_level.as_str(),
    }
}
