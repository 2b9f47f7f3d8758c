use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use vegaview_engine::{filters_match, index_titles_from_spec, normalize_time_range_at};
use vegaview_types::{ApplyFilter, Error as SpecError, Filter, QueryFilter, TimeRange};

use crate::Result;
use crate::host::{FilterService, IndexPatterns};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Turns handler arguments into host filter actions
#[derive(Clone)]
pub struct FilterBridge {
    filters: Arc<dyn FilterService>,
    index_patterns: Arc<dyn IndexPatterns>,
    spec_titles: Vec<String>,
    clock: Clock,
}

impl FilterBridge {
    pub fn new(
        filters: Arc<dyn FilterService>,
        index_patterns: Arc<dyn IndexPatterns>,
        spec: &Value,
    ) -> Self {
        Self {
            filters,
            index_patterns,
            spec_titles: index_titles_from_spec(spec),
            clock: Arc::new(Utc::now),
        }
    }

    /// Pin "now" for relative date math
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Resolve an index reference to an index pattern id.
    ///
    /// An explicit title must exist. Without one, the first index named by the
    /// spec's data sources is tried, then the host default.
    pub async fn find_index(&self, index: Option<&str>) -> Result<String> {
        if let Some(title) = index {
            return match self.index_patterns.find(title).await? {
                Some(pattern) => Ok(pattern.id),
                None => Err(SpecError::IndexResolution(format!("Index \"{}\" not found", title)).into()),
            };
        }

        for title in &self.spec_titles {
            if let Some(pattern) = self.index_patterns.find(title).await? {
                tracing::debug!(%title, id = %pattern.id, "index resolved from spec");
                return Ok(pattern.id);
            }
        }

        match self.index_patterns.default_pattern().await? {
            Some(pattern) => Ok(pattern.id),
            None => Err(SpecError::IndexResolution("Unable to find default index".to_string()).into()),
        }
    }

    pub async fn add_filter(
        &self,
        query: Value,
        index: Option<&str>,
        alias: Option<String>,
    ) -> Result<()> {
        let index_id = self.find_index(index).await?;
        let filter = QueryFilter::new(query, index_id, alias);
        self.filters.apply(ApplyFilter::filters(vec![filter.into()]));
        Ok(())
    }

    /// Remove the active filter equal to `(query, index)`; no match is not an error
    pub async fn remove_filter(&self, query: Value, index: Option<&str>) -> Result<()> {
        let index_id = self.find_index(index).await?;
        let candidate: Filter = QueryFilter::new(query, index_id, None).into();

        let existing = self
            .filters
            .filters()
            .into_iter()
            .find(|active| filters_match(active, &candidate));

        match existing {
            Some(filter) => self.filters.remove_filter(&filter),
            None => {
                tracing::debug!("no active filter matches removal request");
                Ok(())
            }
        }
    }

    pub fn remove_all_filters(&self) {
        self.filters.remove_all();
    }

    pub fn set_time_filter(&self, start: &Value, end: &Value) -> Result<TimeRange> {
        let range = normalize_time_range_at(start, end, (self.clock)())?;
        self.filters.apply(ApplyFilter::time_range(range.clone()));
        Ok(range)
    }
}
