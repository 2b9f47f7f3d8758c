//! Debug Slot Tests
//!
//! Verifies that the diagnostic slot follows the most recently bound view
//! and that teardown of an older view never clears a newer binding.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use vegaview_runtime::{DebugRegistry, EngineView, same_view};
use vegaview_testing::{FakeEngineView, ViewHarness};

fn as_engine_view(view: Arc<vegaview_testing::FakeEngineView>) -> Arc<dyn EngineView> {
    view
}

#[tokio::test]
async fn test_older_view_teardown_keeps_newer_slot() -> Result<()> {
    let debug = Arc::new(DebugRegistry::new());
    let first = ViewHarness::new(json!({"title": "first"})).with_debug(Arc::clone(&debug));
    let second = ViewHarness::new(json!({"title": "second"})).with_debug(Arc::clone(&debug));

    let first_controller = first.start().await?;
    let second_controller = second.start().await?;
    let second_view = as_engine_view(second.factory().last_view().expect("view created"));

    first_controller.destroy().await;

    let entry = debug.current().expect("slot still bound");
    assert!(same_view(&entry.view, &second_view));
    assert_eq!(entry.spec, json!({"title": "second"}));

    second_controller.destroy().await;
    assert!(debug.current().is_none());

    Ok(())
}

#[tokio::test]
async fn test_slot_records_vega_lite_source() -> Result<()> {
    let vlspec = json!({"mark": "bar", "encoding": {}});
    let harness = ViewHarness::new(json!({"marks": [{"type": "rect"}]})).with_parser(|mut parser| {
        parser.vlspec = Some(vlspec.clone());
        parser
    });

    harness.start().await?;

    let entry = harness.debug().current().expect("slot bound");
    assert_eq!(entry.vlspec, Some(vlspec));
    assert!(harness.debug().has_announced());

    Ok(())
}

#[tokio::test]
async fn test_banner_can_be_disabled() -> Result<()> {
    let harness = ViewHarness::new(json!({})).with_config_file("debug_banner = false\n")?;

    harness.start().await?;

    assert!(harness.debug().current().is_some());
    assert!(!harness.debug().has_announced());

    Ok(())
}

#[tokio::test]
async fn test_replaced_view_leaves_the_slot() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    let controller = harness.start().await?;
    let first = as_engine_view(harness.factory().last_view().expect("view created"));

    let second = FakeEngineView::new();
    controller.set_view(Some(second.clone())).await?;
    let second = as_engine_view(second);

    let entry = harness.debug().current().expect("slot bound");
    assert!(same_view(&entry.view, &second));
    assert!(!same_view(&entry.view, &first));

    controller.set_view(None).await?;
    assert!(harness.debug().current().is_none(), "unbinding clears the slot");

    Ok(())
}
