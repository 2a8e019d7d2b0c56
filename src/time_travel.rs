//! Time-travel debugging for token time claims.
//!
//! Parses time expressions (relative like "+7d" or absolute like RFC 3339)
//! so `exp`, `nbf` and `iat` can be evaluated at a simulated instant.

use chrono::{DateTime, Duration, Utc};

use crate::input::InputError;

/// A parsed time target for time-travel evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeTarget {
    /// The resolved absolute timestamp.
    pub timestamp: DateTime<Utc>,
    /// The original expression provided by the user.
    pub expression: String,
}

/// Parse a time-travel expression relative to `now`.
///
/// Supports the following formats:
/// - Relative: `+7d`, `-1h`, `+30m`, `+1y`, `-5s`, `+2w`
/// - Absolute RFC 3339: `2024-01-15T14:30:00Z`
/// - Absolute Unix epoch: `1705312200`
///
/// A year is 365 days.
pub fn parse_time_expression(
    expression: &str,
    now: DateTime<Utc>,
) -> Result<TimeTarget, InputError> {
    let expr = expression.trim();
    let invalid = |reason: &str| InputError::InvalidTimeExpression {
        expression: expression.escape_default().to_string(),
        reason: reason.to_string(),
    };

    let timestamp = if let Some(rest) = expr.strip_prefix('+') {
        now.checked_add_signed(parse_offset(rest).ok_or_else(|| invalid("bad offset"))?)
            .ok_or_else(|| invalid("out of range"))?
    } else if let Some(rest) = expr.strip_prefix('-') {
        now.checked_sub_signed(parse_offset(rest).ok_or_else(|| invalid("bad offset"))?)
            .ok_or_else(|| invalid("out of range"))?
    } else if !expr.is_empty() && expr.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: i64 = expr.parse().map_err(|_| invalid("out of range"))?;
        DateTime::from_timestamp(seconds, 0).ok_or_else(|| invalid("out of range"))?
    } else {
        DateTime::parse_from_rfc3339(expr)
            .map_err(|_| invalid("expected +/-N[s|m|h|d|w|y], RFC 3339, or Unix seconds"))?
            .with_timezone(&Utc)
    };

    Ok(TimeTarget {
        timestamp,
        expression: expression.to_string(),
    })
}

fn parse_offset(offset: &str) -> Option<Duration> {
    let (unit_at, _) = offset.char_indices().last()?;
    let (amount, unit) = offset.split_at(unit_at);
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: i64 = amount.parse().ok()?;
    let seconds_per_unit = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 7 * 86_400,
        "y" => 365 * 86_400,
        _ => return None,
    };
    Duration::try_seconds(amount.checked_mul(seconds_per_unit)?)
}
