// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Day Boundary Policy
//!
//! Maps an instant to the quota period it belongs to. A period is one
//! calendar day in a single reference timezone expressed as a fixed UTC
//! offset, so the mapping is total and does not move under tz-database
//! updates or DST transitions. Period keys are `YYYY-MM-DD` strings and
//! sort lexicographically in day order.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Format of a period key.
pub const PERIOD_KEY_FORMAT: &str = "%Y-%m-%d";

/// Deterministic instant -> period mapping for daily quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundaryPolicy {
    offset: FixedOffset,
}

impl Default for DayBoundaryPolicy {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayBoundaryPolicy {
    /// Policy with days bounded at midnight UTC.
    pub fn utc() -> Self {
        Self {
            offset: FixedOffset::east_opt(0).expect("zero offset is always valid"),
        }
    }

    /// Policy with days bounded at midnight in the given reference offset.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parse a reference offset from configuration.
    ///
    /// Accepts `UTC`, `Z`, or `[+-]HH:MM`.
    pub fn parse_offset(value: &str) -> Result<FixedOffset, String> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("utc") || value == "Z" {
            return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
        }

        let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
            (1i32, rest)
        } else if let Some(rest) = value.strip_prefix('-') {
            (-1i32, rest)
        } else {
            return Err(format!(
                "invalid UTC offset '{}'; expected UTC, Z or [+-]HH:MM",
                value
            ));
        };

        let (hours, minutes) = rest
            .split_once(':')
            .ok_or_else(|| format!("invalid UTC offset '{}'; expected [+-]HH:MM", value))?;
        let hours: i32 = hours
            .parse()
            .map_err(|_| format!("invalid offset hours in '{}'", value))?;
        let minutes: i32 = minutes
            .parse()
            .map_err(|_| format!("invalid offset minutes in '{}'", value))?;

        if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
            return Err(format!("UTC offset '{}' out of range", value));
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .ok_or_else(|| format!("UTC offset '{}' out of range", value))
    }

    /// The reference offset this policy bounds days in.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Period key for the given instant: the calendar date in the
    /// reference offset, formatted `YYYY-MM-DD`.
    pub fn current_period_key(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset)
            .format(PERIOD_KEY_FORMAT)
            .to_string()
    }

    /// Whether two period keys name the same period.
    pub fn is_same_period(a: &str, b: &str) -> bool {
        a == b
    }

    /// The instant at which the period containing `now` ends and the next
    /// one begins: midnight of the next reference-offset day.
    pub fn next_reset(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_day = now.with_timezone(&self.offset).date_naive();
        let next_day = local_day.succ_opt().unwrap_or(NaiveDate::MAX);
        let naive_utc = next_day.and_time(NaiveTime::MIN) - self.offset;
        DateTime::from_naive_utc_and_offset(naive_utc, Utc)
    }

    /// Validity window `[start, end)` of a period key, in UTC.
    ///
    /// Returns `None` for keys that do not parse as `YYYY-MM-DD`.
    pub fn period_bounds(&self, period_key: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let day = NaiveDate::parse_from_str(period_key, PERIOD_KEY_FORMAT).ok()?;
        let start_naive = day.and_time(NaiveTime::MIN) - self.offset;
        let end_naive = day.succ_opt()?.and_time(NaiveTime::MIN) - self.offset;
        Some((
            DateTime::from_naive_utc_and_offset(start_naive, Utc),
            DateTime::from_naive_utc_and_offset(end_naive, Utc),
        ))
    }
}
