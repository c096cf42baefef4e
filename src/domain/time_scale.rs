// Fixed set of chart time scales and their lookup tables
use crate::error::TimelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Samples younger than this are always retained, whatever the scale
pub const MIN_RETENTION_MS: i64 = 7 * DAY;
const RETENTION_MULTIPLIER: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeScale {
    #[serde(rename = "30s")]
    ThirtySeconds,
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "1mo")]
    OneMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleTiming {
    /// Window width
    pub duration_ms: i64,
    /// Axis tick spacing
    pub tick_interval_ms: i64,
    /// Refresh cadence while anchored at now
    pub live_update_interval_ms: i64,
}

impl TimeScale {
    pub const ALL: [TimeScale; 10] = [
        TimeScale::ThirtySeconds,
        TimeScale::OneMinute,
        TimeScale::FiveMinutes,
        TimeScale::ThirtyMinutes,
        TimeScale::OneHour,
        TimeScale::SixHours,
        TimeScale::TwelveHours,
        TimeScale::OneDay,
        TimeScale::SevenDays,
        TimeScale::OneMonth,
    ];

    pub fn timing(self) -> ScaleTiming {
        let (duration_ms, tick_interval_ms, live_update_interval_ms) = match self {
            TimeScale::ThirtySeconds => (30 * SECOND, 5 * SECOND, SECOND),
            TimeScale::OneMinute => (MINUTE, 10 * SECOND, SECOND),
            TimeScale::FiveMinutes => (5 * MINUTE, MINUTE, SECOND),
            TimeScale::ThirtyMinutes => (30 * MINUTE, 5 * MINUTE, 2 * SECOND),
            TimeScale::OneHour => (HOUR, 10 * MINUTE, 5 * SECOND),
            TimeScale::SixHours => (6 * HOUR, HOUR, 15 * SECOND),
            TimeScale::TwelveHours => (12 * HOUR, 2 * HOUR, 30 * SECOND),
            TimeScale::OneDay => (DAY, 2 * HOUR, 30 * SECOND),
            TimeScale::SevenDays => (7 * DAY, DAY, MINUTE),
            TimeScale::OneMonth => (30 * DAY, 5 * DAY, 5 * MINUTE),
        };
        ScaleTiming {
            duration_ms,
            tick_interval_ms,
            live_update_interval_ms,
        }
    }

    pub fn duration_ms(self) -> i64 {
        self.timing().duration_ms
    }

    /// Width of the downsampling bucket, if this scale is bucketed at all
    pub fn bucket_width_ms(self) -> Option<i64> {
        match self {
            TimeScale::ThirtySeconds | TimeScale::OneMinute => None,
            TimeScale::FiveMinutes => Some(5 * SECOND),
            TimeScale::ThirtyMinutes => Some(10 * SECOND),
            TimeScale::OneHour => Some(15 * SECOND),
            TimeScale::SixHours => Some(MINUTE),
            TimeScale::TwelveHours => Some(2 * MINUTE),
            TimeScale::OneDay => Some(5 * MINUTE),
            TimeScale::SevenDays => Some(30 * MINUTE),
            TimeScale::OneMonth => Some(3 * HOUR),
        }
    }

    /// How far back the buffer keeps samples while this scale is shown
    pub fn retention_ms(self) -> i64 {
        (self.duration_ms() * RETENTION_MULTIPLIER).max(MIN_RETENTION_MS)
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeScale::ThirtySeconds => "30s",
            TimeScale::OneMinute => "1m",
            TimeScale::FiveMinutes => "5m",
            TimeScale::ThirtyMinutes => "30m",
            TimeScale::OneHour => "1h",
            TimeScale::SixHours => "6h",
            TimeScale::TwelveHours => "12h",
            TimeScale::OneDay => "1d",
            TimeScale::SevenDays => "7d",
            TimeScale::OneMonth => "1mo",
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeScale {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeScale::ALL
            .into_iter()
            .find(|scale| scale.label() == s.trim())
            .ok_or_else(|| TimelineError::UnknownTimeScale(s.to_string()))
    }
}
