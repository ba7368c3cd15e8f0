use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub type TeamId = i64;
pub type PlayerId = i64;

pub const DEFAULT_FROM_MIN: f64 = 0.0;
pub const DEFAULT_TO_MIN: f64 = 200.0;
pub const DEFAULT_TOP_PASSERS_LIMIT: i64 = 10;

/// A team observed while scanning raw events: identifier plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
}

/// One normalized pass extracted from the raw event stream.
///
/// Every field the source data may omit is optional; absence is data, not an
/// error. `successful` is derived at extraction time: true iff the raw
/// event carried no outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassEvent {
    pub event_id: Option<String>,
    pub team_id: Option<TeamId>,
    pub from_id: PlayerId,
    pub from_name: String,
    pub to_id: PlayerId,
    pub to_name: String,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub timestamp: Option<String>,
    pub start_x: Option<f64>,
    pub start_y: Option<f64>,
    pub end_x: Option<f64>,
    pub end_y: Option<f64>,
    pub length: Option<f64>,
    pub under_pressure: bool,
    pub successful: bool,
}

/// Half-open minute interval `[from_min, to_min)` shared by the time-filtered
/// aggregation queries.
///
/// Bounds are floats so that any finite numeric input is accepted verbatim;
/// a raw value that is absent or not a finite number falls back to the
/// default bound instead of erroring (parse-or-default policy).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteWindow {
    pub from_min: f64,
    pub to_min: f64,
}

impl Default for MinuteWindow {
    fn default() -> Self {
        Self {
            from_min: DEFAULT_FROM_MIN,
            to_min: DEFAULT_TO_MIN,
        }
    }
}

impl MinuteWindow {
    pub fn new(from_min: f64, to_min: f64) -> Self {
        Self { from_min, to_min }
    }

    /// Lenient boundary parsing for raw query parameters.
    pub fn from_raw(from_min: Option<&str>, to_min: Option<&str>) -> Self {
        Self {
            from_min: parse_finite(from_min).unwrap_or(DEFAULT_FROM_MIN),
            to_min: parse_finite(to_min).unwrap_or(DEFAULT_TO_MIN),
        }
    }
}

/// Edge predicate shared by the pass-level aggregation queries: minute
/// window, optional team restriction, optional successful-only restriction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PassFilter {
    pub window: MinuteWindow,
    pub team_id: Option<TeamId>,
    pub successful_only: bool,
}

/// Lenient limit parsing for raw query parameters: anything that is not a
/// non-negative integer is treated as absent. Zero is a valid limit.
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value >= 0)
}

fn parse_finite(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub fn current_unix_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}
