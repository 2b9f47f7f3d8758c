//! ViewHarness pattern for declarative controller setup.
//!
//! Provides a fluent interface for:
//! - Building a parser result
//! - Seeding index patterns and active filters
//! - Loading host configuration from a real TOML file
//! - Starting a controller wired to in-memory services

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use vegaview_runtime::{DebugRegistry, FunctionRegistry, ViewConfig, ViewController, ViewServices};
use vegaview_types::ParserResult;

use crate::engine::FakeEngineFactory;
use crate::host::{FakeFilterService, FakeIndexPatterns, FakePanel, FakeTooltips};

/// Declarative controller environment.
///
/// Each harness owns its own debug slot and function registry so tests do
/// not observe each other through process-wide state.
///
/// # Example
/// ```no_run
/// use vegaview_testing::ViewHarness;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let harness = ViewHarness::new(serde_json::json!({"marks": []}))
///     .with_default_index("logs-id", "logs-*");
///
/// let controller = harness.start().await?;
/// assert!(controller.view().is_some());
/// # Ok(())
/// # }
/// ```
pub struct ViewHarness {
    parser: ParserResult,
    config: ViewConfig,
    panel: Arc<FakePanel>,
    filters: Arc<FakeFilterService>,
    index_patterns: Arc<FakeIndexPatterns>,
    factory: Arc<FakeEngineFactory>,
    tooltips: Arc<FakeTooltips>,
    functions: Arc<FunctionRegistry>,
    debug: Arc<DebugRegistry>,
    config_dir: Option<TempDir>,
}

impl ViewHarness {
    pub fn new(spec: Value) -> Self {
        Self {
            parser: ParserResult::new(spec),
            config: ViewConfig::default(),
            panel: Arc::new(FakePanel::new()),
            filters: Arc::new(FakeFilterService::new()),
            index_patterns: Arc::new(FakeIndexPatterns::new()),
            factory: Arc::new(FakeEngineFactory::new()),
            tooltips: Arc::new(FakeTooltips::new()),
            functions: Arc::new(FunctionRegistry::new()),
            debug: Arc::new(DebugRegistry::new()),
            config_dir: None,
        }
    }

    /// Adjust the parser result before any controller is built
    pub fn with_parser(mut self, adjust: impl FnOnce(ParserResult) -> ParserResult) -> Self {
        self.parser = adjust(self.parser);
        self
    }

    pub fn with_config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    /// Write `contents` to a config file and load it the way the host would
    pub fn with_config_file(mut self, contents: &str) -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("vegaview").join("config.toml");
        std::fs::create_dir_all(dir.path().join("vegaview"))?;
        std::fs::write(&path, contents)?;

        self.config = ViewConfig::load_from(&path)?;
        self.config_dir = Some(dir);
        Ok(self)
    }

    pub fn with_index_pattern(self, id: &str, title: &str) -> Self {
        self.index_patterns.add(id, title);
        self
    }

    pub fn with_default_index(self, id: &str, title: &str) -> Self {
        self.index_patterns.set_default(id, title);
        self
    }

    /// Share a debug slot with another harness
    pub fn with_debug(mut self, debug: Arc<DebugRegistry>) -> Self {
        self.debug = debug;
        self
    }

    pub fn parser(&self) -> &ParserResult {
        &self.parser
    }

    pub fn panel(&self) -> &Arc<FakePanel> {
        &self.panel
    }

    pub fn filters(&self) -> &Arc<FakeFilterService> {
        &self.filters
    }

    pub fn factory(&self) -> &Arc<FakeEngineFactory> {
        &self.factory
    }

    pub fn tooltips(&self) -> &Arc<FakeTooltips> {
        &self.tooltips
    }

    pub fn debug(&self) -> &Arc<DebugRegistry> {
        &self.debug
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    pub fn services(&self) -> ViewServices {
        ViewServices::new(
            self.panel.clone(),
            self.filters.clone(),
            self.index_patterns.clone(),
        )
        .with_config(self.config.clone())
        .with_functions(Arc::clone(&self.functions))
        .with_debug(Arc::clone(&self.debug))
        .with_tooltips(self.tooltips.clone())
    }

    /// A controller that has not been initialized yet
    pub fn controller(&self) -> ViewController {
        ViewController::standard(self.parser.clone(), self.services(), self.factory.clone())
    }

    /// Build and initialize a controller
    pub async fn start(&self) -> Result<ViewController> {
        let controller = self.controller();
        controller.init().await?;
        Ok(controller)
    }
}
