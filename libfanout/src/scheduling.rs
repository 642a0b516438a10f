//! Schedule string parsing
//!
//! Accepted forms, tried in order:
//! - RFC 3339 timestamps: `"2025-11-20T15:00:00Z"`
//! - Unix timestamps in seconds: `"1763650800"`
//! - Relative durations: `"30m"`, `"2h"`, `"1day 6h"`
//! - Natural language: `"tomorrow 3pm"`, `"next monday 10am"`

use chrono::{DateTime, Duration, Utc};

use crate::{FanoutError, Result};

/// Parse a schedule string relative to the current time
pub fn parse_schedule(input: &str) -> Result<DateTime<Utc>> {
    parse_schedule_at(input, Utc::now())
}

/// Parse a schedule string relative to `now`
pub fn parse_schedule_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FanoutError::Validation(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        if let Some(dt) = input
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        {
            return Ok(dt);
        }
    }

    if let Some(duration) = parse_duration(input) {
        return now.checked_add_signed(duration).ok_or_else(|| {
            FanoutError::Validation("Schedule is too far in the future".to_string())
        });
    }

    chrono_english::parse_date_string(input, now, chrono_english::Dialect::Us).map_err(|_| {
        FanoutError::Validation(format!("Could not parse schedule: {}", input))
    })
}

fn parse_duration(input: &str) -> Option<Duration> {
    let std_duration = humantime::parse_duration(input).ok()?;
    Duration::try_seconds(i64::try_from(std_duration.as_secs()).ok()?)
}
