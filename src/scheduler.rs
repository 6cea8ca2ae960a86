// ABOUTME: Per-user debounce scheduler for stats update passes
// ABOUTME: Rapid triggers coalesce into one delayed run per user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Update Scheduler
//!
//! Activity writes arrive in bursts (a meal logged, a session synced), so
//! update triggers are debounced per user: each trigger replaces the user's
//! pending timer, and the update runs once after a quiet interval. An
//! explicit immediate run cancels the pending timer and executes inline.
//!
//! Pending timers live only in process memory. A restart drops them, so the
//! guarantee is at-most-once per quiet window, with the next trigger or the
//! batch maintenance run catching anything lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppResult;

/// The work a debounced trigger eventually runs
///
/// Implemented by the engine as a full aggregation pass plus achievement
/// evaluation. Failures are the pipeline's to report; the scheduler logs
/// them and moves on.
#[async_trait]
pub trait UpdatePipeline: Send + Sync {
    /// Run one full update pass for the user
    async fn run_update(&self, user_id: Uuid) -> AppResult<()>;
}

struct PendingUpdate {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Debounces update triggers per user
///
/// Clones share the pending-timer map, so any handle can queue, cancel, or
/// flush the same user's timer.
#[derive(Clone)]
pub struct UpdateScheduler {
    pipeline: Arc<dyn UpdatePipeline>,
    pending: Arc<DashMap<Uuid, PendingUpdate>>,
    quiet_interval: Duration,
    generation: Arc<AtomicU64>,
}

impl UpdateScheduler {
    /// Create a scheduler running `pipeline` after each quiet interval
    #[must_use]
    pub fn new(pipeline: Arc<dyn UpdatePipeline>, quiet_interval: Duration) -> Self {
        Self {
            pipeline,
            pending: Arc::new(DashMap::new()),
            quiet_interval,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a debounced update, replacing any pending timer for the user
    ///
    /// If an update for this user is already executing, the fresh timer
    /// stays pending and the runs serialize behind the per-user aggregation
    /// lock.
    pub fn queue_update(&self, user_id: Uuid) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let pipeline = Arc::clone(&self.pipeline);
        let pending = Arc::clone(&self.pending);
        let quiet_interval = self.quiet_interval;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_interval).await;

            // Claim the slot before running. Losing the claim means a newer
            // trigger displaced this timer between wake-up and now.
            let still_current = pending
                .remove_if(&user_id, |_, entry| entry.generation == generation)
                .is_some();
            if !still_current {
                return;
            }

            if let Err(err) = pipeline.run_update(user_id).await {
                warn!(user_id = %user_id, error = %err, "debounced update failed");
            }
        });

        if let Some(displaced) = self
            .pending
            .insert(user_id, PendingUpdate { generation, handle })
        {
            displaced.handle.abort();
            debug!(user_id = %user_id, "pending update replaced");
        }
    }

    /// Cancel any pending timer and run the update inline
    ///
    /// # Errors
    ///
    /// Returns whatever the pipeline returns; nothing is retried here
    pub async fn immediate_update(&self, user_id: Uuid) -> AppResult<()> {
        self.cancel_pending(user_id);
        self.pipeline.run_update(user_id).await
    }

    /// Cancel the user's pending timer, if any
    pub fn cancel_pending(&self, user_id: Uuid) -> bool {
        self.pending.remove(&user_id).is_some_and(|(_, entry)| {
            entry.handle.abort();
            true
        })
    }

    /// Cancel every pending timer, returning how many were dropped
    pub fn cancel_all(&self) -> usize {
        let mut dropped = 0;
        self.pending.retain(|_, entry| {
            entry.handle.abort();
            dropped += 1;
            false
        });
        dropped
    }

    /// Number of users with a pending timer
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::Mutex;

    struct RecordingPipeline {
        runs: Mutex<Vec<Uuid>>,
        fail: bool,
    }

    impl RecordingPipeline {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                runs: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                runs: Mutex::new(Vec::new()),
                fail: true,
            })
        }

        fn run_count(&self) -> usize {
            self.runs.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UpdatePipeline for RecordingPipeline {
        async fn run_update(&self, user_id: Uuid) -> AppResult<()> {
            self.runs.lock().unwrap().push(user_id);
            if self.fail {
                return Err(AppError::database("simulated failure"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rapid_queues_coalesce_into_one_run() {
        let pipeline = RecordingPipeline::new();
        let scheduler = UpdateScheduler::new(pipeline.clone(), Duration::from_millis(30));
        let user = Uuid::new_v4();

        for _ in 0..5 {
            scheduler.queue_update(user);
        }
        assert_eq!(scheduler.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(pipeline.run_count(), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_retrigger_within_quiet_window_restarts_timer() {
        let pipeline = RecordingPipeline::new();
        let scheduler = UpdateScheduler::new(pipeline.clone(), Duration::from_millis(200));
        let user = Uuid::new_v4();

        scheduler.queue_update(user);
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.queue_update(user);

        // The first timer would have fired by now; the replacement must not
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(pipeline.run_count(), 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(pipeline.run_count(), 1);
    }

    #[tokio::test]
    async fn test_users_debounce_independently() {
        let pipeline = RecordingPipeline::new();
        let scheduler = UpdateScheduler::new(pipeline.clone(), Duration::from_millis(20));
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        scheduler.queue_update(first);
        scheduler.queue_update(second);
        assert_eq!(scheduler.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let runs = pipeline.runs.lock().unwrap().clone();
        assert_eq!(runs.len(), 2);
        assert!(runs.contains(&first));
        assert!(runs.contains(&second));
    }

    #[tokio::test]
    async fn test_immediate_update_cancels_pending_timer() {
        let pipeline = RecordingPipeline::new();
        let scheduler = UpdateScheduler::new(pipeline.clone(), Duration::from_millis(40));
        let user = Uuid::new_v4();

        scheduler.queue_update(user);
        scheduler.immediate_update(user).await.unwrap();
        assert_eq!(pipeline.run_count(), 1);

        // The canceled timer must not fire a second run
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(pipeline.run_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_debounced_run_is_absorbed() {
        let pipeline = RecordingPipeline::failing();
        let scheduler = UpdateScheduler::new(pipeline.clone(), Duration::from_millis(20));

        scheduler.queue_update(Uuid::new_v4());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(pipeline.run_count(), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_drops_every_timer() {
        let pipeline = RecordingPipeline::new();
        let scheduler = UpdateScheduler::new(pipeline.clone(), Duration::from_millis(40));

        scheduler.queue_update(Uuid::new_v4());
        scheduler.queue_update(Uuid::new_v4());
        assert_eq!(scheduler.cancel_all(), 2);
        assert_eq!(scheduler.pending_count(), 0);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(pipeline.run_count(), 0);
    }
}
