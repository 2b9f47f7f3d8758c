//! Expression Call Tests
//!
//! Verifies that calls posted by the engine's expression interpreter reach
//! the host filter manager only after the render pass, and that bad calls are
//! reported instead of failing the render.

use anyhow::Result;
use serde_json::json;
use vegaview_runtime::{EngineCall, ExpressionFunction};
use vegaview_testing::assertions::assert_panel_messages;
use vegaview_testing::{FakeEngineView, FakeExpressionTable, ViewHarness};
use vegaview_types::{MessageKind, QueryFilter};

fn invoke(name: &str, args: Vec<serde_json::Value>) -> EngineCall {
    EngineCall::Invoke {
        name: name.to_string(),
        args,
    }
}

// =============================================================================
// ROUTING
// =============================================================================

#[tokio::test]
async fn test_unknown_function_is_reported_not_thrown() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    harness.factory().script(invoke("dropIndex", vec![json!("logs")]));

    let controller = harness.start().await?;

    assert!(controller.view().is_some(), "render still completed");
    assert_panel_messages(
        harness.panel(),
        &[(
            MessageKind::Err,
            "dropIndex is not a recognized expression function",
        )],
    )?;

    Ok(())
}

#[tokio::test]
async fn test_calls_wait_for_render_to_finish() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    let controller = harness.controller();

    let view = FakeEngineView::new();
    let release = view.hold_next_render();
    view.queue_invoke("removeAllFilters", vec![]);

    let mut bind = Box::pin(controller.set_view(Some(view.clone())));
    assert!(futures::poll!(&mut bind).is_pending());

    // The call is queued but the render is still in flight
    assert_eq!(view.renders(), 1);
    assert_eq!(controller.dispatch_pending().await, 0);
    assert_eq!(harness.filters().remove_all_calls(), 0);

    release.send(()).expect("render still waiting");
    bind.await?;

    assert_eq!(harness.filters().remove_all_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_dispatch_pending_outside_render() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");
    let router = view.router().expect("view mounted");

    router.invoke("removeAllFilters", vec![]);
    router.warn("Cannot find a selection named \"brush\"");

    assert_eq!(controller.dispatch_pending().await, 2);
    assert_eq!(controller.dispatch_pending().await, 0);
    assert_eq!(harness.filters().remove_all_calls(), 1);
    assert_panel_messages(
        harness.panel(),
        &[(MessageKind::Warn, "Cannot find a selection named \"brush\"")],
    )?;

    Ok(())
}

#[tokio::test]
async fn test_calls_after_destroy_are_dropped() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    let controller = harness.start().await?;
    let router = harness
        .factory()
        .last_view()
        .and_then(|view| view.router())
        .expect("view mounted");

    controller.destroy().await;
    router.invoke("removeAllFilters", vec![]);

    assert_eq!(controller.dispatch_pending().await, 0);
    assert_eq!(harness.filters().remove_all_calls(), 0);

    Ok(())
}

#[test]
fn test_install_defines_missing_names_once() {
    let harness = ViewHarness::new(json!({}));
    let mut table = FakeExpressionTable::default().with_builtin("setTimeFilter");

    assert_eq!(harness.functions().install(&mut table), 3);
    assert_eq!(harness.functions().install(&mut table), 0);
    for function in ExpressionFunction::ALL {
        assert!(table.names().contains(function.name()));
    }
}

// =============================================================================
// FILTERS
// =============================================================================

#[tokio::test]
async fn test_add_filter_prefers_spec_index() -> Result<()> {
    let spec = json!({"data": [{"name": "table", "url": {"index": "logs-*", "body": {}}}]});
    let harness = ViewHarness::new(spec)
        .with_index_pattern("logs-id", "logs-*")
        .with_default_index("default-id", "default");
    harness.factory().script(invoke(
        "addFilter",
        vec![json!({"match_phrase": {"response": 404}}), json!(null), json!("not found")],
    ));

    harness.start().await?;

    let applied = harness.filters().applied();
    assert_eq!(applied.len(), 1);
    let filter = applied[0].filters[0].as_query().expect("query filter");
    assert_eq!(filter.meta.index, "logs-id");
    assert_eq!(filter.meta.alias.as_deref(), Some("not found"));

    Ok(())
}

#[tokio::test]
async fn test_add_filter_falls_back_to_default_index() -> Result<()> {
    let harness = ViewHarness::new(json!({"data": []})).with_default_index("default-id", "default");
    harness
        .factory()
        .script(invoke("addFilter", vec![json!({"match_all": {}})]));

    harness.start().await?;

    let applied = harness.filters().applied();
    assert_eq!(applied[0].filters[0].as_query().expect("query filter").meta.index, "default-id");

    Ok(())
}

#[tokio::test]
async fn test_add_filter_without_any_index_is_reported() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    harness
        .factory()
        .script(invoke("addFilter", vec![json!({"match_all": {}})]));

    harness.start().await?;

    assert!(harness.filters().applied().is_empty());
    assert_panel_messages(
        harness.panel(),
        &[(MessageKind::Err, "Unable to find default index")],
    )?;

    Ok(())
}

#[tokio::test]
async fn test_explicit_unknown_index_is_reported() -> Result<()> {
    let harness = ViewHarness::new(json!({})).with_default_index("default-id", "default");
    harness.factory().script(invoke(
        "addFilter",
        vec![json!({"match_all": {}}), json!("metrics-*")],
    ));

    harness.start().await?;

    assert!(harness.filters().applied().is_empty());
    assert_panel_messages(
        harness.panel(),
        &[(MessageKind::Err, "Index \"metrics-*\" not found")],
    )?;

    Ok(())
}

#[tokio::test]
async fn test_remove_filter_matches_filter_added_with_alias() -> Result<()> {
    let query = json!({"term": {"host.keyword": "web-01"}});
    let harness = ViewHarness::new(json!({})).with_default_index("default-id", "default");
    harness.filters().push_active(QueryFilter::new(
        query.clone(),
        "default-id",
        Some("web-01 only".to_string()),
    ));
    harness
        .factory()
        .script(invoke("removeFilter", vec![query.clone()]));

    harness.start().await?;

    let removed = harness.filters().removed();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].as_query().expect("query filter").query, query);
    assert!(harness.panel().with_class("vgaVis__messages").is_empty());

    Ok(())
}

#[tokio::test]
async fn test_remove_without_match_is_silent() -> Result<()> {
    let harness = ViewHarness::new(json!({})).with_default_index("default-id", "default");
    harness
        .factory()
        .script(invoke("removeFilter", vec![json!({"term": {"a": 1}})]));

    let controller = harness.start().await?;

    assert!(harness.filters().removed().is_empty());
    assert!(controller.messages().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_removal_error_does_not_stop_later_calls() -> Result<()> {
    let query = json!({"exists": {"field": "error"}});
    let harness = ViewHarness::new(json!({})).with_default_index("default-id", "default");
    harness
        .filters()
        .push_active(QueryFilter::new(query.clone(), "default-id", None));
    harness.filters().fail_removals("Filter is pinned");
    harness.factory().script(invoke("removeFilter", vec![query]));
    harness.factory().script(invoke("removeAllFilters", vec![]));

    harness.start().await?;

    assert_eq!(harness.filters().remove_all_calls(), 1);
    assert_panel_messages(harness.panel(), &[(MessageKind::Err, "Filter is pinned")])?;

    Ok(())
}
