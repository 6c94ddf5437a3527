use std::fmt;

use chrono::{DateTime, Utc};

/// A restriction period. All variants except [`Period::Concurrent`] denote a
/// fixed, non-sliding time window: every invocation whose timestamp truncates
/// to the same bucket shares one counter. `Concurrent` is a capacity-style
/// limit with no window, held from admission until explicit release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    PerMinute,
    PerHour,
    PerDay,
    PerWeek,
    PerMonth,
    PerYear,
    PerSeconds(u64),
    Concurrent,
}

impl Period {
    /// Window length in seconds, used both for bucketing and as the counter's
    /// expiry. Month and year counters are bucketed by calendar token and use
    /// a fixed upper-bound length (31 days / 366 days) for expiry only.
    /// `None` for `Concurrent`, which has no window.
    pub fn window_seconds(&self) -> Option<u64> {
        let secs = match self {
            Period::PerMinute => 60,
            Period::PerHour => 60 * 60,
            Period::PerDay => 24 * 60 * 60,
            Period::PerWeek => 7 * 24 * 60 * 60,
            Period::PerMonth => 31 * 24 * 60 * 60,
            Period::PerYear => 366 * 24 * 60 * 60,
            // A zero-length custom window would divide by zero; clamp to 1s.
            Period::PerSeconds(n) => (*n).max(1),
            Period::Concurrent => return None,
        };
        Some(secs)
    }

    /// The token identifying the current bucket: epoch seconds divided by the
    /// window length (calendar strings for month/year, `*` for `Concurrent`).
    pub fn bucket_token(&self, now: DateTime<Utc>) -> String {
        match self {
            Period::Concurrent => "*".to_string(),
            Period::PerMonth => now.format("%Y-%m").to_string(),
            Period::PerYear => now.format("%Y").to_string(),
            _ => {
                let secs = self.window_seconds().unwrap_or(1) as i64;
                now.timestamp().div_euclid(secs).to_string()
            }
        }
    }

    pub fn is_concurrent(&self) -> bool {
        matches!(self, Period::Concurrent)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::PerMinute => write!(f, "per_minute"),
            Period::PerHour => write!(f, "per_hour"),
            Period::PerDay => write!(f, "per_day"),
            Period::PerWeek => write!(f, "per_week"),
            Period::PerMonth => write!(f, "per_month"),
            Period::PerYear => write!(f, "per_year"),
            Period::PerSeconds(n) => write!(f, "per_{}_seconds", n),
            Period::Concurrent => write!(f, "concurrent"),
        }
    }
}
