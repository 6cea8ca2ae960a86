// ABOUTME: Logging and goal-adherence streak tracking over local calendar days
// ABOUTME: Event-driven logging streaks plus ledger-derived goal streaks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Streak Tracking
//!
//! Logging streaks advance on explicit events (a meal or workout logged):
//! one step per local calendar day, a reset after any gap. Goal-adherence
//! streaks are recomputed from the calorie ledger instead, so late ledger
//! writes and corrections are absorbed on the next refresh.
//!
//! Day identity comes from the engine [`BoundaryPolicy`], never from raw
//! UTC dates.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::models::Streaks;
use crate::windows::BoundaryPolicy;

/// How a logging event changed the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// First tracked event ever
    Started,
    /// Event on the day after the previous one
    Extended,
    /// Gap of more than one day; back to a one-day streak
    Reset,
    /// Another event on an already-counted day
    Unchanged,
}

/// Applies streak transitions under one boundary policy
#[derive(Debug, Clone, Copy)]
pub struct StreakTracker {
    policy: BoundaryPolicy,
}

impl StreakTracker {
    #[must_use]
    pub const fn new(policy: BoundaryPolicy) -> Self {
        Self { policy }
    }

    /// Advance the logging streak for an event at `at`
    ///
    /// Same-day repeats are no-ops and leave the stored last-log instant
    /// untouched. The longest streak is raised to the current value in
    /// every branch.
    pub fn apply_logging_event(&self, streaks: &mut Streaks, at: DateTime<Utc>) -> StreakOutcome {
        let outcome = match streaks.last_log_date {
            None => {
                streaks.current_logging_streak = 1;
                streaks.last_log_date = Some(at);
                StreakOutcome::Started
            }
            Some(last) => match self.policy.days_between(last, at) {
                0 => StreakOutcome::Unchanged,
                1 => {
                    streaks.current_logging_streak += 1;
                    streaks.last_log_date = Some(at);
                    StreakOutcome::Extended
                }
                _ => {
                    streaks.current_logging_streak = 1;
                    streaks.last_log_date = Some(at);
                    StreakOutcome::Reset
                }
            },
        };

        streaks.longest_logging_streak = streaks
            .longest_logging_streak
            .max(streaks.current_logging_streak);
        outcome
    }

    /// Recompute goal-adherence streaks from the set of on-target local days
    ///
    /// The current streak is the consecutive run ending today or yesterday;
    /// a run that ended earlier has already lapsed. The longest streak is
    /// the longest run anywhere in the ledger, merged with the stored value
    /// so ledger pruning never shrinks it.
    pub fn apply_goal_ledger(
        &self,
        streaks: &mut Streaks,
        on_target_days: &[NaiveDate],
        now: DateTime<Utc>,
    ) {
        let mut days: Vec<NaiveDate> = on_target_days.to_vec();
        days.sort_unstable();
        days.dedup();

        let mut longest_run: u32 = 0;
        let mut run: u32 = 0;
        let mut prev: Option<NaiveDate> = None;
        for &day in &days {
            run = match prev {
                Some(p) if (day - p).num_days() == 1 => run + 1,
                _ => 1,
            };
            longest_run = longest_run.max(run);
            prev = Some(day);
        }

        let today = self.policy.local_date(now);
        let day_set: HashSet<NaiveDate> = days.into_iter().collect();
        let anchor = if day_set.contains(&today) {
            Some(today)
        } else {
            today
                .checked_sub_days(Days::new(1))
                .filter(|yesterday| day_set.contains(yesterday))
        };

        let mut current: u32 = 0;
        if let Some(mut cursor) = anchor {
            while day_set.contains(&cursor) {
                current += 1;
                match cursor.checked_sub_days(Days::new(1)) {
                    Some(earlier) => cursor = earlier,
                    None => break,
                }
            }
        }

        streaks.current_goal_streak = current;
        streaks.longest_goal_streak = streaks.longest_goal_streak.max(longest_run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    fn tracker() -> StreakTracker {
        StreakTracker::new(BoundaryPolicy::utc())
    }

    #[test]
    fn test_first_event_starts_streak() {
        let mut streaks = Streaks::default();
        let at = utc(2026, 2, 3, 9);

        let outcome = tracker().apply_logging_event(&mut streaks, at);

        assert_eq!(outcome, StreakOutcome::Started);
        assert_eq!(streaks.current_logging_streak, 1);
        assert_eq!(streaks.longest_logging_streak, 1);
        assert_eq!(streaks.last_log_date, Some(at));
    }

    #[test]
    fn test_same_day_repeat_is_noop() {
        let mut streaks = Streaks::default();
        let morning = utc(2026, 2, 3, 9);
        let evening = utc(2026, 2, 3, 21);

        tracker().apply_logging_event(&mut streaks, morning);
        let outcome = tracker().apply_logging_event(&mut streaks, evening);

        assert_eq!(outcome, StreakOutcome::Unchanged);
        assert_eq!(streaks.current_logging_streak, 1);
        // The stored instant keeps the first event of the day
        assert_eq!(streaks.last_log_date, Some(morning));
    }

    #[test]
    fn test_next_day_extends() {
        let mut streaks = Streaks::default();
        let t = tracker();

        t.apply_logging_event(&mut streaks, utc(2026, 2, 3, 9));
        let outcome = t.apply_logging_event(&mut streaks, utc(2026, 2, 4, 7));

        assert_eq!(outcome, StreakOutcome::Extended);
        assert_eq!(streaks.current_logging_streak, 2);
        assert_eq!(streaks.longest_logging_streak, 2);
    }

    #[test]
    fn test_gap_resets_but_longest_survives() {
        let mut streaks = Streaks::default();
        let t = tracker();

        t.apply_logging_event(&mut streaks, utc(2026, 2, 1, 9));
        t.apply_logging_event(&mut streaks, utc(2026, 2, 2, 9));
        t.apply_logging_event(&mut streaks, utc(2026, 2, 3, 9));
        let outcome = t.apply_logging_event(&mut streaks, utc(2026, 2, 6, 9));

        assert_eq!(outcome, StreakOutcome::Reset);
        assert_eq!(streaks.current_logging_streak, 1);
        assert_eq!(streaks.longest_logging_streak, 3);
    }

    #[test]
    fn test_boundary_offset_decides_day_identity() {
        // UTC+09:00: 23:00 UTC Feb 3 and 01:00 UTC Feb 4 are the same
        // local day (Feb 4), so the second event is a same-day repeat
        let policy = BoundaryPolicy::from_offset_minutes(540).unwrap();
        let t = StreakTracker::new(policy);
        let mut streaks = Streaks::default();

        t.apply_logging_event(&mut streaks, utc(2026, 2, 3, 23));
        let outcome = t.apply_logging_event(&mut streaks, utc(2026, 2, 4, 1));

        assert_eq!(outcome, StreakOutcome::Unchanged);
        assert_eq!(streaks.current_logging_streak, 1);
    }

    #[test]
    fn test_goal_streak_run_ending_today() {
        let mut streaks = Streaks::default();
        let days = vec![date(2026, 2, 1), date(2026, 2, 2), date(2026, 2, 3)];

        tracker().apply_goal_ledger(&mut streaks, &days, utc(2026, 2, 3, 12));

        assert_eq!(streaks.current_goal_streak, 3);
        assert_eq!(streaks.longest_goal_streak, 3);
    }

    #[test]
    fn test_goal_streak_run_ending_yesterday_still_counts() {
        let mut streaks = Streaks::default();
        let days = vec![date(2026, 2, 1), date(2026, 2, 2)];

        tracker().apply_goal_ledger(&mut streaks, &days, utc(2026, 2, 3, 12));

        assert_eq!(streaks.current_goal_streak, 2);
    }

    #[test]
    fn test_goal_streak_lapsed_run_is_zero() {
        let mut streaks = Streaks::default();
        let days = vec![date(2026, 1, 28), date(2026, 1, 29), date(2026, 1, 30)];

        tracker().apply_goal_ledger(&mut streaks, &days, utc(2026, 2, 3, 12));

        assert_eq!(streaks.current_goal_streak, 0);
        // The historical run still informs the longest streak
        assert_eq!(streaks.longest_goal_streak, 3);
    }

    #[test]
    fn test_goal_streak_longest_merges_with_stored() {
        let mut streaks = Streaks {
            longest_goal_streak: 10,
            ..Streaks::default()
        };
        let days = vec![date(2026, 2, 2), date(2026, 2, 3)];

        tracker().apply_goal_ledger(&mut streaks, &days, utc(2026, 2, 3, 12));

        assert_eq!(streaks.current_goal_streak, 2);
        assert_eq!(streaks.longest_goal_streak, 10);
    }

    #[test]
    fn test_goal_streak_ignores_duplicates_and_order() {
        let mut streaks = Streaks::default();
        let days = vec![
            date(2026, 2, 3),
            date(2026, 2, 1),
            date(2026, 2, 2),
            date(2026, 2, 2),
        ];

        tracker().apply_goal_ledger(&mut streaks, &days, utc(2026, 2, 3, 12));

        assert_eq!(streaks.current_goal_streak, 3);
    }
}
