//! Resize Tests
//!
//! Verifies container measurement, padding and change detection for views
//! that follow the panel size.

use anyhow::Result;
use serde_json::json;
use vegaview_testing::ViewHarness;

fn resizing_harness() -> ViewHarness {
    ViewHarness::new(json!({"autosize": "fit"})).with_parser(|parser| {
        let mut parser = parser.with_resize(true);
        parser.padding_width = 10.0;
        parser.padding_height = 4.0;
        parser
    })
}

#[tokio::test]
async fn test_initial_size_applies_padding() -> Result<()> {
    let harness = resizing_harness();
    harness.panel().set_size(500.7, 300.0);

    harness.start().await?;

    let view = harness.factory().last_view().expect("view created");
    // 300 - 4 (spec padding) - 6 (scrollbar guard)
    assert_eq!(view.size(), (490.0, 290.0));
    assert_eq!(view.renders(), 1);

    Ok(())
}

#[tokio::test]
async fn test_resize_renders_only_on_change() -> Result<()> {
    let harness = resizing_harness();
    harness.panel().set_size(400.0, 300.0);
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");

    assert!(!controller.resize().await);
    assert_eq!(view.renders(), 1);

    harness.panel().set_size(640.0, 480.0);
    assert!(controller.resize().await);
    assert_eq!(view.size(), (630.0, 470.0));
    assert_eq!(view.renders(), 2);

    Ok(())
}

#[tokio::test]
async fn test_tiny_container_floors_at_zero() -> Result<()> {
    let harness = resizing_harness();
    harness.panel().set_size(120.0, 8.0);
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");

    assert_eq!(view.size(), (110.0, 0.0));
    assert!(!controller.resize().await);

    Ok(())
}

#[tokio::test]
async fn test_resize_disabled_is_noop() -> Result<()> {
    let harness = ViewHarness::new(json!({}));
    harness.panel().set_size(640.0, 480.0);
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");

    assert!(!controller.resize().await);
    assert_eq!(view.resizes(), 0);
    assert_eq!(view.renders(), 1);

    Ok(())
}

#[tokio::test]
async fn test_resize_render_failure_is_reported() -> Result<()> {
    let harness = resizing_harness();
    harness.panel().set_size(400.0, 300.0);
    let controller = harness.start().await?;
    let view = harness.factory().last_view().expect("view created");

    view.fail_next_render("signal width is not defined");
    harness.panel().set_size(800.0, 600.0);

    assert!(controller.resize().await);
    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Rendering error: signal width is not defined");

    Ok(())
}
