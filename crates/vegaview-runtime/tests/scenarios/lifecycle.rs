//! Lifecycle Tests
//!
//! Verifies init/set_view/destroy sequencing: single init, fatal parse
//! handling, view replacement and exactly-once teardown.

use anyhow::Result;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use vegaview_runtime::{EngineView, Error, classes};
use vegaview_testing::assertions::{assert_panel_empty, assert_panel_messages};
use vegaview_testing::{FakeEngineView, ViewHarness};
use vegaview_types::{Direction, MessageKind, TooltipConfig};

fn spec() -> serde_json::Value {
    json!({"$schema": "https://vega.github.io/schema/vega/v5.json", "marks": []})
}

// =============================================================================
// INIT
// =============================================================================

#[tokio::test]
async fn test_init_mounts_nodes_and_renders() -> Result<()> {
    let harness = ViewHarness::new(spec()).with_parser(|mut parser| {
        parser.controls_dir = Direction::Row;
        parser
    });

    let controller = harness.start().await?;

    assert_eq!(harness.panel().with_class(classes::VIEW).len(), 1);
    assert_eq!(
        harness.panel().with_class("vgaVis__controls--row").len(),
        1
    );

    let view = harness.factory().last_view().expect("view created");
    assert_eq!(view.renders(), 1);
    let mount = view.mount().expect("view initialized");
    assert_eq!(mount.container, controller.container());
    assert_eq!(mount.controls, controller.controls());
    assert!(controller.messages().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_second_init_is_contract_violation() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;

    let err = controller.init().await.unwrap_err();

    assert!(matches!(err, Error::Lifecycle(_)));
    assert!(err.is_contract_violation());
    assert_eq!(harness.factory().views().len(), 1, "no second engine view");

    Ok(())
}

#[tokio::test]
async fn test_fatal_parse_error_stops_before_engine() -> Result<()> {
    let harness = ViewHarness::new(spec()).with_parser(|parser| {
        parser
            .with_warning("Unrecognized property \"widht\"")
            .with_error("Unexpected token } in JSON")
    });

    let controller = harness.start().await?;

    assert!(harness.factory().last_config().is_none());
    assert!(controller.view().is_none());
    assert_panel_messages(
        harness.panel(),
        &[
            (MessageKind::Warn, "Unrecognized property \"widht\""),
            (MessageKind::Err, "Unexpected token } in JSON"),
        ],
    )?;

    // Mounted nodes are still cleaned up
    controller.destroy().await;
    assert_panel_empty(harness.panel())?;

    Ok(())
}

#[tokio::test]
async fn test_engine_construction_failure_is_reported() -> Result<()> {
    let harness = ViewHarness::new(spec());
    harness.factory().fail_with("canvas unavailable");

    let controller = harness.start().await?;

    assert!(controller.view().is_none());
    assert_panel_messages(
        harness.panel(),
        &[(MessageKind::Err, "Rendering error: canvas unavailable")],
    )?;

    Ok(())
}

// =============================================================================
// SET VIEW
// =============================================================================

#[tokio::test]
async fn test_set_view_with_bound_view_is_noop() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");

    controller.set_view(Some(view.clone())).await?;

    assert_eq!(view.renders(), 1);
    assert_eq!(view.finalized(), 0);

    Ok(())
}

#[tokio::test]
async fn test_set_view_replaces_and_finalizes_previous() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;
    let first = harness.factory().last_view().expect("view created");

    let second = FakeEngineView::new();
    controller.set_view(Some(second.clone())).await?;

    assert_eq!(first.finalized(), 1);
    assert_eq!(second.renders(), 1);

    controller.set_view(None).await?;

    assert_eq!(second.finalized(), 1);
    assert_eq!(second.renders(), 1, "unbinding does not render");
    assert!(controller.view().is_none());

    Ok(())
}

#[tokio::test]
async fn test_failed_render_is_returned_to_caller() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;

    let broken = FakeEngineView::new();
    broken.fail_next_render("dataflow error");
    let err = controller.set_view(Some(broken.clone())).await.unwrap_err();

    assert!(matches!(err, Error::Engine(_)));
    let bound: Arc<dyn EngineView> = broken;
    assert!(vegaview_runtime::same_view(
        &controller.view().expect("still bound"),
        &bound
    ));

    Ok(())
}

// =============================================================================
// DESTROY
// =============================================================================

#[tokio::test]
async fn test_concurrent_destroy_runs_each_handler_once() -> Result<()> {
    let harness = ViewHarness::new(spec())
        .with_parser(|parser| parser.with_tooltips(TooltipConfig::default()));
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");
    assert_eq!(harness.tooltips().attached(), 1);

    let teardowns: Vec<_> = (0..8).map(|_| controller.destroy()).collect();
    join_all(teardowns).await;
    controller.destroy().await;

    assert_eq!(view.finalized(), 1);
    assert_eq!(harness.tooltips().cleaned(), 1);
    assert!(controller.is_destroyed());
    assert!(controller.view().is_none());
    assert_panel_empty(harness.panel())?;

    Ok(())
}

#[tokio::test]
async fn test_destroy_before_init() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.controller();

    controller.destroy().await;

    assert!(controller.is_destroyed());
    assert!(harness.panel().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_view_bound_after_teardown_is_finalized() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;
    controller.destroy().await;

    let late = FakeEngineView::new();
    controller.set_view(Some(late.clone())).await?;

    assert_eq!(late.finalized(), 1);
    assert_eq!(late.renders(), 0);
    assert!(controller.view().is_none());

    Ok(())
}

#[tokio::test]
async fn test_message_after_teardown_does_not_leak_nodes() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;
    controller.destroy().await;

    controller.on_error(&"engine callback after destroy");
    controller.on_warn("second callback after destroy");

    assert_panel_empty(harness.panel())?;
    assert_eq!(controller.messages().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_message_list_not_remounted_after_teardown() -> Result<()> {
    let harness = ViewHarness::new(spec());
    let controller = harness.start().await?;
    controller.on_error(&"shown while live");
    assert_eq!(harness.panel().with_class(classes::MESSAGES).len(), 1);

    controller.destroy().await;
    controller.on_error(&"late one");
    controller.on_error(&"late two");

    assert_panel_empty(harness.panel())
}
