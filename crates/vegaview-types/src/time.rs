use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    Absolute,
    Relative,
}

/// One side of a time range.
///
/// Relative bounds keep the raw expression (e.g. `now-1h`) so the host
/// re-evaluates them at query time instead of freezing an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeBound {
    Absolute(DateTime<Utc>),
    Relative(String),
}

impl TimeBound {
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeBound::Absolute(ts) => Some(*ts),
            TimeBound::Relative(_) => None,
        }
    }
}

/// Canonical time range produced from two loosely-typed inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: TimeBound,
    pub to: TimeBound,
    pub mode: TimeMode,
}
