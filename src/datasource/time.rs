//! Time range rendering for `$timeFilter`

use super::error::{DataSourceError, DataSourceResult};
use chrono::{DateTime, Duration, Months, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RELATIVE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^now-(\d+)([smhdwMy])$").expect("relative time pattern is valid"));

/// Raw time range bounds as entered by the user (`now-6h`, `now`, RFC 3339, epoch ms)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeRaw {
    pub from: String,
    pub to: String,
}

impl TimeRangeRaw {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeRangeRaw {
    fn default() -> Self {
        Self::new("now-6h", "now")
    }
}

/// Render one time bound as an InfluxQL time expression
///
/// Second to day offsets stay relative to `now()`; week, month and year
/// offsets are resolved against `now` into absolute epoch milliseconds.
pub fn time_transform(raw: &str, now: DateTime<Utc>) -> DataSourceResult<String> {
    let raw = raw.trim();
    if raw == "now" {
        return Ok("now()".to_string());
    }

    if let Some(caps) = RELATIVE_TIME.captures(raw) {
        let amount: u32 = caps[1]
            .parse()
            .map_err(|_| DataSourceError::InvalidTime(raw.to_string()))?;
        let unit = &caps[2];

        let instant = match unit {
            "s" | "m" | "h" | "d" => return Ok(format!("now() - {}{}", amount, unit)),
            "w" => now.checked_sub_signed(Duration::weeks(i64::from(amount))),
            "M" => now.checked_sub_months(Months::new(amount)),
            _ => amount
                .checked_mul(12)
                .and_then(|months| now.checked_sub_months(Months::new(months))),
        };
        let instant = instant.ok_or_else(|| DataSourceError::InvalidTime(raw.to_string()))?;
        return Ok(format!("{}ms", instant.timestamp_millis()));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(format!("{}ms", instant.timestamp_millis()));
    }
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(format!("{}ms", ms));
    }

    Err(DataSourceError::InvalidTime(raw.to_string()))
}

/// Predicate substituted for `$timeFilter`
pub fn time_filter(range: &TimeRangeRaw, now: DateTime<Utc>) -> DataSourceResult<String> {
    let from = time_transform(&range.from, now)?;
    let to = time_transform(&range.to, now)?;
    Ok(format!("time >= {} and time <= {}", from, to))
}
