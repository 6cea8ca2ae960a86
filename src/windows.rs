// ABOUTME: Period window computation with a configurable local-time boundary offset
// ABOUTME: Maps instants to daily/weekly/monthly window starts and local calendar days
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitrank Contributors

//! # Period Windows
//!
//! Every aggregation pass derives its windows from one `BoundaryPolicy`
//! holding the engine-wide boundary offset. Days roll over at local
//! midnight, weeks start Monday, months on the 1st; all window starts are
//! returned as UTC instants so source queries can compare timestamps
//! directly.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
};

/// Derives period windows for a fixed UTC offset
///
/// The offset is applied with plain arithmetic rather than a timezone
/// database, so boundaries are stable year-round. Daylight-saving regions
/// get the documented fixed-offset approximation.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryPolicy {
    offset: FixedOffset,
}

/// Start instants of the three bounded windows containing one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStarts {
    pub daily: DateTime<Utc>,
    pub weekly: DateTime<Utc>,
    pub monthly: DateTime<Utc>,
}

impl BoundaryPolicy {
    /// Policy for a boundary offset in minutes east of UTC
    ///
    /// Returns `None` when the offset is outside the representable range
    /// (the config layer validates against engine limits before this).
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }

    /// Policy with boundaries at UTC midnight
    #[must_use]
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// The configured offset in minutes east of UTC
    #[must_use]
    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Local calendar day containing an instant
    ///
    /// This is the day identity used for streak comparisons and coin grant
    /// deduplication.
    #[must_use]
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        (at.naive_utc() + Duration::seconds(i64::from(self.offset.local_minus_utc()))).date()
    }

    /// Start of the local day containing an instant, as a UTC instant
    #[must_use]
    pub fn day_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.to_utc_instant(self.local_date(at))
    }

    /// Start of the Monday-based local week containing an instant
    #[must_use]
    pub fn week_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(at);
        let days_from_monday = i64::from(date.weekday().num_days_from_monday());
        self.to_utc_instant(date - Duration::days(days_from_monday))
    }

    /// Start of the local month containing an instant
    #[must_use]
    pub fn month_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(at);
        let first = date.with_day(1).unwrap_or(date);
        self.to_utc_instant(first)
    }

    /// All three bounded window starts for one instant
    #[must_use]
    pub fn window_starts(&self, at: DateTime<Utc>) -> WindowStarts {
        WindowStarts {
            daily: self.day_start(at),
            weekly: self.week_start(at),
            monthly: self.month_start(at),
        }
    }

    /// Whole local days separating two instants, negative when `a` is later
    #[must_use]
    pub fn days_between(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
        (self.local_date(b) - self.local_date(a)).num_days()
    }

    /// UTC instant of local midnight on a local calendar day
    fn to_utc_instant(&self, local_day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = NaiveDateTime::new(local_day, NaiveTime::MIN);
        DateTime::from_naive_utc_and_offset(
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc())),
            Utc,
        )
    }
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::utc()
    }
}
