//! Time handling for meetings.
//!
//! Clients send either a `date` plus `HH:mm` clock strings or full RFC 3339
//! timestamps. Both are normalized into [`TimeRange`] (UTC instants) before
//! any comparison happens; the clock form survives only for display.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use shared::error::{AppError, AppResult};
use std::str::FromStr;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::ValidationError(
                "Start time must be before end time".into(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    // 端点が接するだけなら重ならない
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn shifted(&self, by: Duration) -> Self {
        Self {
            start: self.start + by,
            end: self.end + by,
        }
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &TimeRange) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A time value as written by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInput {
    Clock(NaiveTime),
    Instant(DateTime<Utc>),
}

impl TimeInput {
    /// Anchors clock times on `date`; instants pass through.
    pub fn resolve(self, date: Option<NaiveDate>, field: &str) -> AppResult<DateTime<Utc>> {
        match self {
            TimeInput::Instant(at) => Ok(at),
            TimeInput::Clock(clock) => date
                .map(|d| d.and_time(clock).and_utc())
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "Date is required when {field} is given as a time of day"
                    ))
                }),
        }
    }
}

impl FromStr for TimeInput {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
            return Ok(TimeInput::Clock(t));
        }
        if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
            return Ok(TimeInput::Clock(t));
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(s) {
            return Ok(TimeInput::Instant(at.with_timezone(&Utc)));
        }
        // タイムゾーンなしの日時は UTC とみなす
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(at) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(TimeInput::Instant(at.and_utc()));
            }
        }
        Err(AppError::ValidationError(format!("Invalid time: {s}")))
    }
}

pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date: {s}")))
}

pub fn clock_string(at: DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 25, h, m, 0).unwrap()
    }

    fn range(a: (u32, u32), b: (u32, u32)) -> TimeRange {
        TimeRange::new(at(a.0, a.1), at(b.0, b.1)).unwrap()
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (range((10, 0), (11, 0)), range((10, 30), (11, 30)), true),
            (range((10, 0), (11, 0)), range((11, 0), (12, 0)), false),
            (range((9, 0), (12, 0)), range((10, 0), (10, 15)), true),
            (range((8, 0), (9, 0)), range((13, 0), (14, 0)), false),
        ];
        for (a, b, expected) in cases {
            assert_eq!(a.overlaps(&b), expected, "{a:?} vs {b:?}");
            assert_eq!(b.overlaps(&a), expected, "{b:?} vs {a:?}");
        }
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let first = range((10, 0), (11, 0));
        let second = range((11, 0), (12, 0));
        assert!(!first.overlaps(&second));
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(TimeRange::new(at(10, 0), at(10, 0)).is_err());
        assert!(TimeRange::new(at(11, 0), at(10, 0)).is_err());
    }

    #[test]
    fn clock_and_timestamp_encodings_agree() {
        let date = parse_date("2025-12-25").unwrap();
        let clock: TimeInput = "10:30".parse().unwrap();
        let stamp: TimeInput = "2025-12-25T10:30:00Z".parse().unwrap();
        assert_eq!(
            clock.resolve(Some(date), "start").unwrap(),
            stamp.resolve(None, "start").unwrap()
        );
    }

    #[test]
    fn clock_without_date_is_rejected() {
        let clock: TimeInput = "09:00".parse().unwrap();
        let err = clock.resolve(None, "start").unwrap_err();
        assert!(err.to_string().contains("Date is required"));
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let stamp: TimeInput = "2025-12-25T19:00:00+09:00".parse().unwrap();
        assert_eq!(stamp, TimeInput::Instant(at(10, 0)));
    }

    #[test]
    fn garbage_fails_to_parse() {
        assert!("25:99".parse::<TimeInput>().is_err());
        assert!("tomorrow".parse::<TimeInput>().is_err());
        assert!(parse_date("2025/12/25").is_err());
    }
}
