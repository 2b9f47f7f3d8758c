//! Date parsing for time filters.
//!
//! Two grammars are understood:
//! - absolute timestamps: epoch millis (JSON numbers), RFC 3339, naive
//!   ISO date-times and plain dates, all read as UTC
//! - date math: `now` or `<absolute>||` followed by any number of
//!   `+N<unit>`, `-N<unit>` and `/<unit>` operations

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static MATH_OP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([/+-])(\d*)([a-zA-Z]+)").expect("date math pattern is valid"));

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl Unit {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "y" => Some(Unit::Year),
            "M" => Some(Unit::Month),
            "w" => Some(Unit::Week),
            "d" => Some(Unit::Day),
            "h" | "H" => Some(Unit::Hour),
            "m" => Some(Unit::Minute),
            "s" => Some(Unit::Second),
            "ms" => Some(Unit::Millisecond),
            _ => None,
        }
    }
}

/// Read a loosely-typed value as an absolute instant.
///
/// Returns `None` for relative expressions and for anything unparseable.
pub fn parse_absolute(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        Value::String(s) => parse_absolute_str(s),
        _ => None,
    }
}

pub fn parse_absolute_str(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Resolve an absolute or relative date expression against `now`.
///
/// `round_up` makes `/unit` snap to the end of the unit instead of its
/// start, which is what the upper bound of a range wants.
pub fn parse(text: &str, now: DateTime<Utc>, round_up: bool) -> Option<DateTime<Utc>> {
    let text = text.trim();

    let (anchor, math) = if let Some(rest) = text.strip_prefix("now") {
        (now, rest)
    } else if let Some((head, rest)) = text.split_once("||") {
        (parse_absolute_str(head)?, rest)
    } else {
        (parse_absolute_str(text)?, "")
    };

    apply_math(anchor, math, round_up)
}

/// String form of a loosely-typed input, used for relative bounds and error text
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn apply_math(mut time: DateTime<Utc>, mut math: &str, round_up: bool) -> Option<DateTime<Utc>> {
    while !math.is_empty() {
        let caps = MATH_OP.captures(math)?;
        let whole = caps.get(0)?;
        let op = caps.get(1)?.as_str();
        let digits = caps.get(2)?.as_str();
        let unit = Unit::parse(caps.get(3)?.as_str())?;

        let amount: u32 = if digits.is_empty() {
            1
        } else {
            digits.parse().ok()?
        };

        time = match op {
            "/" => {
                // Rounding takes no amount other than an implicit one
                if !digits.is_empty() && amount != 1 {
                    return None;
                }
                if round_up {
                    end_of(time, unit)?
                } else {
                    start_of(time, unit)?
                }
            }
            "+" => shift(time, i64::from(amount), unit)?,
            "-" => shift(time, -i64::from(amount), unit)?,
            _ => return None,
        };

        math = &math[whole.end()..];
    }

    Some(time)
}

fn shift(time: DateTime<Utc>, amount: i64, unit: Unit) -> Option<DateTime<Utc>> {
    match unit {
        Unit::Year => shift_months(time, amount.checked_mul(12)?),
        Unit::Month => shift_months(time, amount),
        Unit::Week => time.checked_add_signed(Duration::try_weeks(amount)?),
        Unit::Day => time.checked_add_signed(Duration::try_days(amount)?),
        Unit::Hour => time.checked_add_signed(Duration::try_hours(amount)?),
        Unit::Minute => time.checked_add_signed(Duration::try_minutes(amount)?),
        Unit::Second => time.checked_add_signed(Duration::try_seconds(amount)?),
        Unit::Millisecond => time.checked_add_signed(Duration::try_milliseconds(amount)?),
    }
}

fn shift_months(time: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        time.checked_add_months(magnitude)
    } else {
        time.checked_sub_months(magnitude)
    }
}

fn start_of(time: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let date = time.date_naive();
    let naive = match unit {
        Unit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
        Unit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)?,
        Unit::Week => {
            let back = i64::from(date.weekday().num_days_from_monday());
            date.checked_sub_signed(Duration::try_days(back)?)?
                .and_hms_opt(0, 0, 0)?
        }
        Unit::Day => date.and_hms_opt(0, 0, 0)?,
        Unit::Hour => date.and_hms_opt(time.hour(), 0, 0)?,
        Unit::Minute => date.and_hms_opt(time.hour(), time.minute(), 0)?,
        Unit::Second => date.and_hms_opt(time.hour(), time.minute(), time.second())?,
        Unit::Millisecond => date.and_hms_milli_opt(
            time.hour(),
            time.minute(),
            time.second(),
            time.timestamp_subsec_millis().min(999),
        )?,
    };
    Some(Utc.from_utc_datetime(&naive))
}

fn end_of(time: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let next = shift(start_of(time, unit)?, 1, unit)?;
    next.checked_sub_signed(Duration::try_milliseconds(1)?)
}
