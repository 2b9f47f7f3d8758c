//! Custom assertions for vegaview-specific validation.
//!
//! Provides high-level assertions that make tests more readable:
//! - Panel message list contents
//! - Mounted node cleanup
//! - Time filter shape

use anyhow::{Context, Result};
use serde_json::Value;
use vegaview_runtime::classes;
use vegaview_types::{ApplyFilter, MessageKind};

use crate::host::FakePanel;

/// Assert that the panel's message list shows exactly `expected`, in order.
pub fn assert_panel_messages(panel: &FakePanel, expected: &[(MessageKind, &str)]) -> Result<()> {
    let items: Vec<(String, String)> = panel
        .with_class(classes::MESSAGE_CODE)
        .into_iter()
        .map(|code| {
            let item = panel
                .nodes()
                .into_iter()
                .find(|node| Some(node.id) == code.parent)
                .map(|node| node.class)
                .unwrap_or_default();
            (item, code.text.unwrap_or_default())
        })
        .collect();

    if items.len() != expected.len() {
        anyhow::bail!("Expected {} messages, got {:?}", expected.len(), items);
    }

    for (i, ((class, text), (kind, want))) in items.iter().zip(expected).enumerate() {
        if *class != classes::message(*kind) {
            anyhow::bail!("Message {} has class {:?}, expected {:?}", i, class, kind);
        }
        if text != want {
            anyhow::bail!("Message {} reads {:?}, expected {:?}", i, text, want);
        }
    }

    Ok(())
}

/// Assert that teardown left nothing mounted in the panel.
pub fn assert_panel_empty(panel: &FakePanel) -> Result<()> {
    let nodes = panel.nodes();
    if !nodes.is_empty() {
        anyhow::bail!("Expected empty panel, {} nodes still mounted: {:?}", nodes.len(), nodes);
    }
    Ok(())
}

/// Extract the `{mode, gte, lte}` clause of a time-range application.
pub fn time_clause(action: &ApplyFilter) -> Result<Value> {
    if action.time_field_name.as_deref() != Some("*") {
        anyhow::bail!("Expected a wildcard time field, got {:?}", action.time_field_name);
    }
    let json = serde_json::to_value(action)?;
    json["filters"][0]["range"]["*"]
        .as_object()
        .map(|clause| Value::Object(clause.clone()))
        .context("Expected 'filters[0].range.*' clause")
}
