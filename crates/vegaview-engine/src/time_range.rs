use chrono::{DateTime, Utc};
use serde_json::Value;
use vegaview_types::{Error, Result, TimeBound, TimeMode, TimeRange};

use crate::datemath::{self, parse_absolute, raw_text};

/// Normalize two date-like inputs into a canonical range using the current time.
pub fn normalize_time_range(start: &Value, end: &Value) -> Result<TimeRange> {
    normalize_time_range_at(start, end, Utc::now())
}

/// Normalize two date-like inputs into a canonical range.
///
/// - Both absolute: absolute range over the two instants.
/// - Otherwise both sides are read as date math. If at least one side is
///   absolute the range is absolute over the resolved instants; if both are
///   relative the raw expressions are kept so the host re-evaluates them.
/// - A reversed pair is swapped so `from` is never after `to`. The swap moves
///   each side's raw expression together with its resolved instant.
/// - Rounding (`/d` and friends) is down on the output `from` and up on the
///   output `to`, whichever input ends up there.
pub fn normalize_time_range_at(
    start: &Value,
    end: &Value,
    now: DateTime<Utc>,
) -> Result<TimeRange> {
    let abs_start = parse_absolute(start);
    let abs_end = parse_absolute(end);

    if let (Some(from), Some(to)) = (abs_start, abs_end) {
        return Ok(ordered(
            TimeBound::Absolute(from),
            TimeBound::Absolute(to),
            TimeMode::Absolute,
            from > to,
        ));
    }

    let raw_start = raw_text(start);
    let raw_end = raw_text(end);

    let resolved = (
        resolve(abs_start, &raw_start, now, false),
        resolve(abs_end, &raw_end, now, true),
    );
    let (Some(start_at), Some(end_at)) = resolved else {
        return Err(malformed(raw_start, raw_end));
    };

    let reversed = start_at > end_at;

    let range = if abs_start.is_none() && abs_end.is_none() {
        ordered(
            TimeBound::Relative(raw_start),
            TimeBound::Relative(raw_end),
            TimeMode::Relative,
            reversed,
        )
    } else if reversed {
        // Rounding follows the side each input lands on after the swap
        let resolved = (
            resolve(abs_end, &raw_end, now, false),
            resolve(abs_start, &raw_start, now, true),
        );
        let (Some(from), Some(to)) = resolved else {
            return Err(malformed(raw_start, raw_end));
        };
        TimeRange {
            from: TimeBound::Absolute(from),
            to: TimeBound::Absolute(to),
            mode: TimeMode::Absolute,
        }
    } else {
        TimeRange {
            from: TimeBound::Absolute(start_at),
            to: TimeBound::Absolute(end_at),
            mode: TimeMode::Absolute,
        }
    };

    tracing::debug!(mode = ?range.mode, reversed, "normalized time range");
    Ok(range)
}

fn resolve(
    absolute: Option<DateTime<Utc>>,
    raw: &str,
    now: DateTime<Utc>,
    round_up: bool,
) -> Option<DateTime<Utc>> {
    absolute.or_else(|| datemath::parse(raw, now, round_up))
}

fn malformed(start: String, end: String) -> Error {
    Error::MalformedTimeRange { start, end }
}

fn ordered(from: TimeBound, to: TimeBound, mode: TimeMode, reversed: bool) -> TimeRange {
    let (from, to) = if reversed { (to, from) } else { (from, to) };
    TimeRange { from, to, mode }
}
