use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::time::{TimeBound, TimeMode, TimeRange};

/// Field name used by the time filter's range clause
pub const WILDCARD_FIELD: &str = "*";

/// Index pattern known to the host application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPattern {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMeta {
    pub index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Query fragment bound to an index pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub meta: FilterMeta,
    pub query: Value,
}

impl QueryFilter {
    pub fn new(query: Value, index: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            meta: FilterMeta {
                index: index.into(),
                alias,
            },
            query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeClause {
    pub mode: TimeMode,
    pub gte: TimeBound,
    pub lte: TimeBound,
}

/// `{"range": {"*": {mode, gte, lte}}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub range: BTreeMap<String, RangeClause>,
}

impl RangeFilter {
    pub fn wildcard(range: TimeRange) -> Self {
        let mut clauses = BTreeMap::new();
        clauses.insert(
            WILDCARD_FIELD.to_string(),
            RangeClause {
                mode: range.mode,
                gte: range.from,
                lte: range.to,
            },
        );
        Self { range: clauses }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Query(QueryFilter),
    Range(RangeFilter),
}

impl Filter {
    pub fn as_query(&self) -> Option<&QueryFilter> {
        match self {
            Filter::Query(filter) => Some(filter),
            Filter::Range(_) => None,
        }
    }
}

impl From<QueryFilter> for Filter {
    fn from(filter: QueryFilter) -> Self {
        Filter::Query(filter)
    }
}

impl From<RangeFilter> for Filter {
    fn from(filter: RangeFilter) -> Self {
        Filter::Range(filter)
    }
}

/// Payload of the host's filter-application callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyFilter {
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field_name: Option<String>,
}

impl ApplyFilter {
    pub fn filters(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            time_field_name: None,
        }
    }

    pub fn time_range(range: TimeRange) -> Self {
        Self {
            filters: vec![RangeFilter::wildcard(range).into()],
            time_field_name: Some(WILDCARD_FIELD.to_string()),
        }
    }
}
