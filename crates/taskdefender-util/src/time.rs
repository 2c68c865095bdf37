//! Time utilities for taskdefender
//!
//! Provides wall-clock time (for timestamps stored in state), monotonic time
//! (for countdowns and idle detection) and `HH:MM` wall-clock parsing (for
//! quiet hours).
//!
//! # Mock Time for Development
//!
//! In debug builds, the `TASKDEFENDER_MOCK_TIME` environment variable can be
//! set to override the system time. The mock clock keeps advancing at the real
//! rate from the given local time.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "TASKDEFENDER_MOCK_TIME";

/// Timestamp type used for every date-valued field in the state tree
pub type Timestamp = DateTime<Utc>;

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

/// Interpret a mock time string as a local time
fn parse_mock_time(text: &str) -> Option<Timestamp> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), MOCK_TIME_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn mock_offset_from_env() -> Option<chrono::Duration> {
    let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
    let Some(mock) = parse_mock_time(&raw) else {
        tracing::warn!(
            value = %raw,
            expected = MOCK_TIME_FORMAT,
            "Ignoring unparseable mock time"
        );
        return None;
    };

    let offset = mock.signed_duration_since(Utc::now());
    tracing::info!(mock_time = %raw, offset_secs = offset.num_seconds(), "Mock clock active");
    Some(offset)
}

fn mock_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        if cfg!(debug_assertions) {
            mock_offset_from_env()
        } else {
            None
        }
    })
}

pub fn is_mock_time_active() -> bool {
    mock_offset().is_some()
}

/// Current wall-clock time, shifted by the mock offset if one is set
pub fn now() -> Timestamp {
    let real = Utc::now();
    mock_offset().map_or(real, |offset| real + offset)
}

/// Whole seconds elapsed from `start` to `end`, clamped at zero.
pub fn whole_seconds_between(start: Timestamp, end: Timestamp) -> u64 {
    end.signed_duration_since(start).num_seconds().max(0) as u64
}

/// Format a timestamp in the user's local timezone for display.
pub fn format_local(ts: &Timestamp) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Format a number of seconds as `MM:SS` (countdown display).
pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Represents a point in monotonic time for countdowns and idle tracking.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Duration since `earlier`, or zero if `earlier` is in the future
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }

    pub fn checked_add(&self, duration: Duration) -> Option<MonotonicInstant> {
        self.0.checked_add(duration).map(MonotonicInstant)
    }

    /// Returns duration until `self`, or zero if `self` is in the past
    pub fn saturating_duration_until(&self, from: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(from.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Time of day, minute resolution (`HH:MM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Returns seconds since midnight
    pub fn as_seconds_from_midnight(&self) -> u32 {
        (self.hour as u32) * 3600 + (self.minute as u32) * 60
    }

    /// Whether `at` falls in the half-open window `[start, end)`.
    /// A window whose end is not after its start wraps past midnight.
    pub fn window_contains(start: WallClock, end: WallClock, at: WallClock) -> bool {
        if start < end {
            start <= at && at < end
        } else {
            at >= start || at < end
        }
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_seconds_from_midnight()
            .cmp(&other.as_seconds_from_midnight())
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Error parsing an `HH:MM` string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day '{0}', expected HH:MM")]
pub struct WallClockParseError(pub String);

impl FromStr for WallClock {
    type Err = WallClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || WallClockParseError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hour: u8 = h.parse().map_err(|_| err())?;
        let minute: u8 = m.parse().map_err(|_| err())?;
        WallClock::new(hour, minute).ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wall_clock() {
        assert_eq!("08:30".parse::<WallClock>(), Ok(WallClock { hour: 8, minute: 30 }));
        assert_eq!("22:00".parse::<WallClock>().unwrap().to_string(), "22:00");
        assert!("24:00".parse::<WallClock>().is_err());
        assert!("7".parse::<WallClock>().is_err());
        assert!("ab:cd".parse::<WallClock>().is_err());

        let err = "25:99".parse::<WallClock>().unwrap_err();
        assert_eq!(err.to_string(), "invalid time of day '25:99', expected HH:MM");
    }

    #[test]
    fn window_wraps_past_midnight() {
        let start = WallClock::new(22, 0).unwrap();
        let end = WallClock::new(8, 0).unwrap();

        assert!(WallClock::window_contains(start, end, WallClock::new(23, 15).unwrap()));
        assert!(WallClock::window_contains(start, end, WallClock::new(3, 0).unwrap()));
        assert!(!WallClock::window_contains(start, end, WallClock::new(8, 0).unwrap()));
        assert!(!WallClock::window_contains(start, end, WallClock::new(12, 0).unwrap()));
    }

    #[test]
    fn window_same_day() {
        let start = WallClock::new(9, 0).unwrap();
        let end = WallClock::new(17, 0).unwrap();

        assert!(WallClock::window_contains(start, end, WallClock::new(9, 0).unwrap()));
        assert!(!WallClock::window_contains(start, end, WallClock::new(17, 0).unwrap()));
    }

    #[test]
    fn mock_time_parses_local_datetime() {
        let parsed = parse_mock_time("2025-12-25 14:30:00").unwrap();
        let local = parsed.with_timezone(&Local);
        assert_eq!((local.hour(), local.minute()), (14, 30));

        assert!(parse_mock_time("2025-12-25T14:30").is_none());
        assert!(parse_mock_time("").is_none());
    }

    #[test]
    fn whole_seconds_truncates_and_clamps() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let end = start + chrono::Duration::milliseconds(90_900);

        assert_eq!(whole_seconds_between(start, end), 90);
        assert_eq!(whole_seconds_between(end, start), 0);
    }

    #[test]
    fn monotonic_add_and_until() {
        let start = MonotonicInstant::now();
        let later = start + Duration::from_secs(5);

        assert_eq!(later.duration_since(start), Duration::from_secs(5));
        assert_eq!(start.duration_since(later), Duration::ZERO);
        assert_eq!(later.saturating_duration_until(start), Duration::from_secs(5));
    }

    #[test]
    fn countdown_format() {
        assert_eq!(format_countdown(25 * 60), "25:00");
        assert_eq!(format_countdown(61), "01:01");
    }
}
