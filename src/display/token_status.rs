//! Token status display for time claims.
//!
//! Renders human-readable status information for the `exp`, `iat` and
//! `nbf` claims, including expiry status with color coding.

use chrono::{DateTime, Utc};
use serde_json::Value;

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Print the temporal status of a token's claims as evaluated at `now`.
pub fn display_token_status(payload: &Value, now: DateTime<Utc>, use_color: bool) {
    super::print_section("Token Status");
    for line in status_lines(payload, now, use_color) {
        println!("{line}");
    }
}

/// One line per time claim present, plus an overall status line.
///
/// - Expired tokens: red "EXPIRED (X ago)"
/// - Not-yet-valid tokens: yellow "NOT YET VALID (valid in X)"
/// - Valid tokens: green "VALID (expires in X)", or "VALID (no expiry)"
pub fn status_lines(payload: &Value, now: DateTime<Utc>, use_color: bool) -> Vec<String> {
    let iat = claim_seconds(payload, "iat");
    let nbf = claim_seconds(payload, "nbf");
    let exp = claim_seconds(payload, "exp");
    let now_secs = now.timestamp();

    let mut lines = Vec::new();
    for (label, value) in [("Issued at", iat), ("Not before", nbf), ("Expires at", exp)] {
        if let Some(seconds) = value {
            lines.push(format!("{label}: {}", format_instant(seconds)));
        }
    }

    let (status, code) = match (exp, nbf) {
        (Some(exp), _) if now_secs >= exp => (
            format!("EXPIRED ({} ago)", humanize(now_secs.saturating_sub(exp))),
            RED,
        ),
        (_, Some(nbf)) if now_secs < nbf => (
            format!("NOT YET VALID (valid in {})", humanize(nbf.saturating_sub(now_secs))),
            YELLOW,
        ),
        (Some(exp), _) => (
            format!("VALID (expires in {})", humanize(exp.saturating_sub(now_secs))),
            GREEN,
        ),
        (None, _) => ("VALID (no expiry)".to_string(), GREEN),
    };

    lines.push(if use_color {
        format!("Status: {code}{status}{RESET}")
    } else {
        format!("Status: {status}")
    });
    lines
}

fn claim_seconds(payload: &Value, name: &str) -> Option<i64> {
    let value = payload.get(name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

fn format_instant(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0).map_or_else(
        || format!("{seconds} (out of range)"),
        |dt| format!("{} ({seconds})", dt.to_rfc3339()),
    )
}

/// Render a span of seconds as its two largest units, e.g. `2d 3h`.
fn humanize(seconds: i64) -> String {
    const UNITS: [(i64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let mut remaining = seconds.max(0);
    let mut parts = Vec::new();
    for (size, suffix) in UNITS {
        if remaining >= size {
            parts.push(format!("{}{suffix}", remaining / size));
            remaining %= size;
        }
        if parts.len() == 2 {
            break;
        }
    }
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn lines(payload: Value) -> Vec<String> {
        status_lines(&payload, DateTime::from_timestamp(NOW, 0).unwrap(), false)
    }

    #[test]
    fn test_expired() {
        let out = lines(json!({"exp": NOW - 90}));
        assert_eq!(out.last().unwrap(), "Status: EXPIRED (1m 30s ago)");
    }

    #[test]
    fn test_valid_with_expiry() {
        let out = lines(json!({"iat": NOW - 10, "exp": NOW + 2 * 86_400 + 3_600 + 5}));
        assert!(out[0].starts_with("Issued at: 2023-11-14T22:13:10+00:00"));
        assert_eq!(out.last().unwrap(), "Status: VALID (expires in 2d 1h)");
    }

    #[test]
    fn test_not_yet_valid() {
        let out = lines(json!({"nbf": NOW + 60, "exp": NOW + 600}));
        assert_eq!(out.last().unwrap(), "Status: NOT YET VALID (valid in 1m)");
    }

    #[test]
    fn test_no_time_claims() {
        assert_eq!(lines(json!({"sub": "x"})), vec!["Status: VALID (no expiry)"]);
    }

    #[test]
    fn test_non_numeric_claims_are_ignored() {
        assert_eq!(lines(json!({"exp": "soon"})), vec!["Status: VALID (no expiry)"]);
    }

    #[test]
    fn test_color_wraps_status() {
        let out = status_lines(
            &json!({"exp": NOW - 1}),
            DateTime::from_timestamp(NOW, 0).unwrap(),
            true,
        );
        assert!(out.last().unwrap().contains(RED));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(0), "0s");
        assert_eq!(humanize(59), "59s");
        assert_eq!(humanize(3_600), "1h");
        assert_eq!(humanize(86_400 + 61), "1d 1m");
    }
}
