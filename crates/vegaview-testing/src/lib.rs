//! Testing infrastructure for vegaview integration tests.
//!
//! This crate provides:
//! - `ViewHarness`: Fluent interface for declarative controller setup
//! - `host`: In-memory panel, filter manager, index patterns and tooltips
//! - `engine`: Scriptable engine view and factory
//! - `assertions`: Readable checks over panel and filter state

pub mod assertions;
pub mod engine;
pub mod host;
pub mod world;

pub use engine::{FakeEngineFactory, FakeEngineView};
pub use host::{
    FakeExpressionTable, FakeFilterService, FakeIndexPatterns, FakePanel, FakeTooltips, PanelNode,
};
pub use world::ViewHarness;
