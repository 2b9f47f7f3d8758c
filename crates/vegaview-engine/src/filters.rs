use serde_json::Value;
use vegaview_types::Filter;

/// Structural comparison used to find an active filter to remove.
///
/// Query filters match on query body and index; the alias is only a label.
pub fn filters_match(existing: &Filter, candidate: &Filter) -> bool {
    match (existing, candidate) {
        (Filter::Query(a), Filter::Query(b)) => a.query == b.query && a.meta.index == b.meta.index,
        (Filter::Range(a), Filter::Range(b)) => a == b,
        _ => false,
    }
}

/// Index pattern titles referenced by the spec's data sources, in spec order.
///
/// Looks at `data[*].url.index` where `data` may be an array or a single object.
pub fn index_titles_from_spec(spec: &Value) -> Vec<String> {
    let sources: Vec<&Value> = match spec.get("data") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    };

    let mut titles: Vec<String> = Vec::new();
    for source in sources {
        let Some(title) = source
            .get("url")
            .and_then(|url| url.get("index"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        if !title.is_empty() && !titles.iter().any(|t| t == title) {
            titles.push(title.to_string());
        }
    }
    titles
}
