//! Utility functions for Crocodile services.

use std::time::Duration;

use crate::error::{Error, Result};

/// Parse a duration string like "30s", "15m", "24h" or "2d".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::InvalidInput("empty duration string".into()));
    }

    let split = s.len() - s.chars().last().map_or(0, char::len_utf8);
    let (num_str, unit) = s.split_at(split);
    let num: u64 = num_str
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid number in duration: {s}")))?;

    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return Err(Error::InvalidInput(format!("unknown duration unit: {unit}"))),
    };
    let secs = num
        .checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidInput(format!("duration too large: {s}")))?;

    Ok(Duration::from_secs(secs))
}

/// Format a duration for humans: `850ms`, `12.5s`, `3m 20s`, `5h 02m`, `2d 03h`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        return format!("{:.0}ms", secs * 1000.0);
    }
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }

    let total = d.as_secs();
    let (days, hours, mins) = (total / 86400, (total % 86400) / 3600, (total % 3600) / 60);
    if days > 0 {
        format!("{days}d {hours:02}h")
    } else if hours > 0 {
        format!("{hours}h {mins:02}m")
    } else {
        format!("{mins}m {}s", total % 60)
    }
}
