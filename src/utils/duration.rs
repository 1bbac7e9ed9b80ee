//! Duration parsing utilities.
//!
//! This module parses simulated-time strings (e.g., "200s", "3m") into
//! seconds as used throughout the scenario configuration.

/// Parse duration string (e.g., "200", "200s", "3m", "1.5h") to seconds
///
/// Supports various duration formats:
/// - Raw seconds: "200", "42.5"
/// - Milliseconds: "500ms"
/// - Seconds: "200s", "200sec", "200secs", "200second", "200seconds"
/// - Minutes: "3m", "3min", "3mins", "3minute", "3minutes"
/// - Hours: "1h", "1hr", "1hrs", "1hour", "1hours"
///
/// # Examples
/// ```
/// use manetsim::utils::duration::parse_duration_to_seconds;
///
/// assert_eq!(parse_duration_to_seconds("200"), Ok(200.0));
/// assert_eq!(parse_duration_to_seconds("3m"), Ok(180.0));
/// assert_eq!(parse_duration_to_seconds("1.5h"), Ok(5400.0));
/// assert!(parse_duration_to_seconds("invalid").is_err());
/// ```
pub fn parse_duration_to_seconds(duration: &str) -> Result<f64, String> {
    let duration = duration.trim();
    let (number, unit) = split_number_part(duration);

    if number.is_empty() {
        return Err(format!("Invalid duration format: {}", duration));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid duration format: {}", duration))?;

    let multiplier = match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "ms" => 0.001,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
        _ => return Err(format!("Invalid duration format: {}", duration)),
    };

    Ok(value * multiplier)
}

/// Split at the first character that cannot be part of a decimal number
fn split_number_part(duration: &str) -> (&str, &str) {
    let end = duration
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(duration.len());
    (&duration[..end], duration[end..].trim())
}
