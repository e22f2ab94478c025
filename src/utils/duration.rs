use regex::Regex;
use std::sync::OnceLock;

/// Lifetime used whenever a duration string cannot be understood.
pub const DEFAULT_DURATION_SECS: u64 = 3600;

static DURATION_RE: OnceLock<Regex> = OnceLock::new();

fn duration_re() -> &'static Regex {
    DURATION_RE.get_or_init(|| Regex::new(r"(\d+)([smhd])").expect("duration regex is valid"))
}

/// Parses compact durations such as `"30s"`, `"15m"`, `"1h"` or `"2d"` into seconds.
///
/// The first `<digits><unit>` match anywhere in the input is used. Input with
/// no match, or a number too large to represent, falls back to one hour.
pub fn parse_duration_to_seconds(duration: &str) -> u64 {
    let Some(caps) = duration_re().captures(duration) else {
        tracing::debug!(duration, "Unrecognized duration, using default");
        return DEFAULT_DURATION_SECS;
    };

    let Ok(value) = caps[1].parse::<u64>() else {
        tracing::debug!(duration, "Duration value out of range, using default");
        return DEFAULT_DURATION_SECS;
    };

    let multiplier = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => return DEFAULT_DURATION_SECS,
    };

    value
        .checked_mul(multiplier)
        .unwrap_or(DEFAULT_DURATION_SECS)
}
