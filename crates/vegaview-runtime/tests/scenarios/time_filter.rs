//! Time Filter Tests
//!
//! Verifies that `setTimeFilter` calls become wildcard range filters with
//! the right mode and bound order.

use anyhow::Result;
use serde_json::{Value, json};
use vegaview_runtime::EngineCall;
use vegaview_testing::ViewHarness;
use vegaview_testing::assertions::time_clause;

async fn apply_time_filter(start: Value, end: Value) -> Result<ViewHarness> {
    let harness = ViewHarness::new(json!({}));
    harness.factory().script(EngineCall::Invoke {
        name: "setTimeFilter".to_string(),
        args: vec![start, end],
    });
    harness.start().await?;
    Ok(harness)
}

#[tokio::test]
async fn test_relative_expressions_are_kept_verbatim() -> Result<()> {
    let harness = apply_time_filter(json!("now-1h"), json!("now")).await?;

    let applied = harness.filters().applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(
        time_clause(&applied[0])?,
        json!({"mode": "relative", "gte": "now-1h", "lte": "now"})
    );

    Ok(())
}

#[tokio::test]
async fn test_reversed_absolute_dates_are_swapped() -> Result<()> {
    let harness =
        apply_time_filter(json!("2024-03-02T00:00:00Z"), json!("2024-03-01T00:00:00Z")).await?;

    assert_eq!(
        time_clause(&harness.filters().applied()[0])?,
        json!({
            "mode": "absolute",
            "gte": "2024-03-01T00:00:00Z",
            "lte": "2024-03-02T00:00:00Z"
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_epoch_millis_are_absolute() -> Result<()> {
    let harness = apply_time_filter(json!(1704067200000_i64), json!(1704153600000_i64)).await?;

    assert_eq!(
        time_clause(&harness.filters().applied()[0])?,
        json!({
            "mode": "absolute",
            "gte": "2024-01-01T00:00:00Z",
            "lte": "2024-01-02T00:00:00Z"
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_mixed_inputs_become_absolute() -> Result<()> {
    let harness = apply_time_filter(json!("now-1h"), json!("2024-03-01T00:00:00Z")).await?;

    let clause = time_clause(&harness.filters().applied()[0])?;
    assert_eq!(clause["mode"], "absolute");
    assert_ne!(clause["gte"], "now-1h");
    assert_ne!(clause["lte"], "now-1h");

    Ok(())
}

#[tokio::test]
async fn test_malformed_range_is_reported_and_not_applied() -> Result<()> {
    let harness = apply_time_filter(json!("not-a-date"), json!("also-not-a-date")).await?;

    assert!(harness.filters().applied().is_empty());
    let messages = harness.panel().with_class(vegaview_runtime::classes::MESSAGE_CODE);
    assert_eq!(messages.len(), 1);
    let text = messages[0].text.clone().unwrap_or_default();
    assert!(text.contains("start=not-a-date"), "{}", text);
    assert!(text.contains("end=also-not-a-date"), "{}", text);

    Ok(())
}
