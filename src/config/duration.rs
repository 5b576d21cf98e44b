//! Human duration strings for the timeline lookback (`90s`, `30m`, `6h`, `2d`).

use crate::error::HandoffError;
use std::time::Duration;

const UNITS: &[(&str, u64)] = &[("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)];

/// Parse a sequence of `<number><unit>` terms, e.g. `1h30m`.
pub fn parse_duration(raw: &str) -> Result<Duration, HandoffError> {
    let input = raw.trim();
    let invalid = || {
        HandoffError::ConfigError(format!(
            "Invalid duration {:?} (expected e.g. 90s, 30m, 6h, 2d)",
            raw
        ))
    };
    if input.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(invalid)?;
        total = value
            .checked_mul(scale)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
        rest = &rest[unit_len..];
    }
    Ok(Duration::from_secs(total))
}

/// Largest whole unit that divides `duration` exactly.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    for (name, scale) in UNITS {
        if secs % scale == 0 {
            return format!("{}{}", secs / scale, name);
        }
    }
    format!("{}s", secs)
}
