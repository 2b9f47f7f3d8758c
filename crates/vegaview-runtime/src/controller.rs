//! Lifecycle of one visualization panel.
//!
//! ```text
//! init ──► mount nodes ──► report parse warnings/error ──► customization
//!                                                            │
//!                                                            ▼
//!          destroy ◄── resize* ◄── render ◄── set_view(view)
//! ```
//!
//! Engine calls posted through the [`CallRouter`] are drained only after a
//! render pass completes, or by [`ViewController::dispatch_pending`] when no
//! render is in flight.

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;
use vegaview_engine::{ResourceLoader, StandardLoader, UrlAccessGate};
use vegaview_types::{MessageRecord, ParserResult};

use crate::bridge::{FunctionRegistry, HandlerCall};
use crate::config::ViewConfig;
use crate::debug::DebugRegistry;
use crate::destroy::{DestroyChain, Teardown};
use crate::filter_bridge::FilterBridge;
use crate::host::{FilterService, IndexPatterns, NodeId, Panel, TooltipProvider, classes};
use crate::messages::MessageSink;
use crate::view::{
    CallRouter, EngineCall, EngineConfig, EngineFactory, EngineView, ViewMount, same_view,
};
use crate::{Error, Result};

/// Subtracted from the measured height so the view never triggers a scrollbar
const HEIGHT_EXTRA_PADDING: f64 = 6.0;

/// Host services and process-wide tables a controller is wired to
#[derive(Clone)]
pub struct ViewServices {
    pub config: ViewConfig,
    pub panel: Arc<dyn Panel>,
    pub filters: Arc<dyn FilterService>,
    pub index_patterns: Arc<dyn IndexPatterns>,
    pub functions: Arc<FunctionRegistry>,
    pub debug: Arc<DebugRegistry>,
    pub loader: Arc<dyn ResourceLoader>,
    pub tooltips: Option<Arc<dyn TooltipProvider>>,
}

impl ViewServices {
    /// Services with default configuration and the process-wide registries
    pub fn new(
        panel: Arc<dyn Panel>,
        filters: Arc<dyn FilterService>,
        index_patterns: Arc<dyn IndexPatterns>,
    ) -> Self {
        Self {
            config: ViewConfig::default(),
            panel,
            filters,
            index_patterns,
            functions: FunctionRegistry::global(),
            debug: DebugRegistry::global(),
            loader: Arc::new(StandardLoader),
            tooltips: None,
        }
    }

    pub fn with_config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_debug(mut self, debug: Arc<DebugRegistry>) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_tooltips(mut self, tooltips: Arc<dyn TooltipProvider>) -> Self {
        self.tooltips = Some(tooltips);
        self
    }
}

/// Builds the engine view during `init()` and binds it with `set_view`
pub trait ViewCustomization: Send + Sync {
    fn initialize(
        &self,
        controller: ViewController,
        config: EngineConfig,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Creates the view through an [`EngineFactory`] and waits for the first render
pub struct StandardView {
    factory: Arc<dyn EngineFactory>,
}

impl StandardView {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self { factory }
    }
}

impl ViewCustomization for StandardView {
    fn initialize(
        &self,
        controller: ViewController,
        config: EngineConfig,
    ) -> BoxFuture<'static, Result<()>> {
        let factory = Arc::clone(&self.factory);
        async move {
            let view = factory.create(controller.parser(), &config)?;
            controller.set_view(Some(view)).await
        }
        .boxed()
    }
}

#[derive(Default)]
struct ViewState {
    container: Option<NodeId>,
    controls: Option<NodeId>,
    view: Option<Arc<dyn EngineView>>,
}

struct Inner {
    id: Uuid,
    parser: ParserResult,
    services: ViewServices,
    customization: Arc<dyn ViewCustomization>,
    initialized: AtomicBool,
    // Shared with destroy handlers, which must not own the controller
    state: Arc<Mutex<ViewState>>,
    chain: Arc<DestroyChain>,
    messages: MessageSink,
    filter_bridge: FilterBridge,
    router: CallRouter,
    calls: Mutex<UnboundedReceiver<EngineCall>>,
    rendering: AtomicUsize,
    // View currently published in the debug slot
    debug_view: Arc<Mutex<Option<Arc<dyn EngineView>>>>,
}

struct RenderGuard<'a>(&'a AtomicUsize);

impl<'a> RenderGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the engine view, mount points and teardown chain of one panel
#[derive(Clone)]
pub struct ViewController {
    inner: Arc<Inner>,
}

impl ViewController {
    pub fn new(
        parser: ParserResult,
        services: ViewServices,
        customization: Arc<dyn ViewCustomization>,
    ) -> Self {
        let chain = Arc::new(DestroyChain::new());
        let messages = MessageSink::new(
            Arc::clone(&services.panel),
            Arc::clone(&chain),
            parser.hide_warnings,
        );
        let filter_bridge = FilterBridge::new(
            Arc::clone(&services.filters),
            Arc::clone(&services.index_patterns),
            &parser.spec,
        );
        let (router, calls) = CallRouter::channel();

        let debug_view: Arc<Mutex<Option<Arc<dyn EngineView>>>> = Arc::default();
        {
            let debug = Arc::clone(&services.debug);
            let debug_view = Arc::clone(&debug_view);
            chain.add_sync(move || {
                if let Some(view) = debug_view.lock().take() {
                    debug.release(&view);
                }
            });
        }

        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                parser,
                services,
                customization,
                initialized: AtomicBool::new(false),
                state: Arc::new(Mutex::new(ViewState::default())),
                chain,
                messages,
                filter_bridge,
                router,
                calls: Mutex::new(calls),
                rendering: AtomicUsize::new(0),
                debug_view,
            }),
        }
    }

    /// Controller whose views come from `factory`
    pub fn standard(
        parser: ParserResult,
        services: ViewServices,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        Self::new(parser, services, Arc::new(StandardView::new(factory)))
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn parser(&self) -> &ParserResult {
        &self.inner.parser
    }

    pub fn view(&self) -> Option<Arc<dyn EngineView>> {
        self.inner.state.lock().view.clone()
    }

    pub fn container(&self) -> Option<NodeId> {
        self.inner.state.lock().container
    }

    pub fn controls(&self) -> Option<NodeId> {
        self.inner.state.lock().controls
    }

    pub fn messages(&self) -> Vec<MessageRecord> {
        self.inner.messages.records()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.chain.is_claimed()
    }

    /// Mount the panel and build the engine view.
    ///
    /// Only a second call fails; every other error is shown in the panel.
    pub async fn init(&self) -> Result<()> {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return Err(Error::Lifecycle("init() can only be called once".to_string()));
        }

        if let Err(err) = self.try_init().await {
            self.on_error(&err);
        }
        Ok(())
    }

    async fn try_init(&self) -> Result<()> {
        let parser = &self.inner.parser;
        let services = &self.inner.services;

        let container = services.panel.append(None, "div", classes::VIEW);
        let controls = services
            .panel
            .append(None, "div", &classes::controls(parser.controls_dir));
        {
            let mut state = self.inner.state.lock();
            state.container = Some(container);
            state.controls = Some(controls);
        }
        self.register_unmount();

        for warning in &parser.warnings {
            self.on_warn(warning);
        }

        if let Some(error) = &parser.error {
            return Err(Error::FatalParse(error.clone()));
        }

        let config = EngineConfig {
            renderer: parser.renderer,
            loader: Arc::new(UrlAccessGate::new(
                Arc::clone(&services.loader),
                services.config.enable_external_urls,
            )),
        };

        tracing::debug!(
            view_id = %self.inner.id,
            renderer = ?parser.renderer,
            direction = parser.container_dir.as_str(),
            "building engine view"
        );
        let customization = Arc::clone(&self.inner.customization);
        customization.initialize(self.clone(), config).await
    }

    fn register_unmount(&self) {
        let state = Arc::clone(&self.inner.state);
        let panel = Arc::clone(&self.inner.services.panel);
        self.inner.chain.add_sync(move || {
            let (container, controls, view) = {
                let mut state = state.lock();
                (state.container.take(), state.controls.take(), state.view.take())
            };
            for node in [container, controls].into_iter().flatten() {
                panel.remove(node);
            }
            if let Some(view) = view {
                view.finalize();
            }
        });
    }

    /// Bind `view` and render it. `None` unbinds without rendering.
    ///
    /// The returned future resolves once the render pass has finished; the
    /// view is bound before that.
    pub async fn set_view(&self, view: Option<Arc<dyn EngineView>>) -> Result<()> {
        if self.is_destroyed() {
            if let Some(view) = view {
                tracing::debug!(view_id = %self.inner.id, "view bound after teardown, finalizing");
                view.finalize();
            }
            return Ok(());
        }

        let previous = {
            let mut state = self.inner.state.lock();
            let unchanged = match (&state.view, &view) {
                (Some(current), Some(next)) => same_view(current, next),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                return Ok(());
            }
            std::mem::replace(&mut state.view, view.clone())
        };

        if let Some(previous) = previous {
            self.release_debug(&previous);
            previous.finalize();
        }

        let Some(view) = view else {
            return Ok(());
        };

        if self.inner.parser.use_resize {
            self.update_size(&view);
        }

        let (container, controls) = {
            let state = self.inner.state.lock();
            (state.container, state.controls)
        };
        view.initialize(ViewMount {
            container,
            controls,
            router: self.inner.router.clone(),
        });

        if let (Some(provider), Some(config)) =
            (&self.inner.services.tooltips, &self.inner.parser.tooltips)
        {
            let cleanup = provider.attach(&view, config);
            self.inner.chain.add_sync(cleanup);
        }

        self.render(&view).await?;

        let services = &self.inner.services;
        services.debug.bind(
            Arc::clone(&view),
            self.inner.parser.spec.clone(),
            self.inner.parser.vlspec.clone(),
            services.config.debug_banner,
        );
        *self.inner.debug_view.lock() = Some(view);

        Ok(())
    }

    fn release_debug(&self, view: &Arc<dyn EngineView>) {
        let mut published = self.inner.debug_view.lock();
        if published.as_ref().is_some_and(|current| same_view(current, view)) {
            *published = None;
            self.inner.services.debug.release(view);
        }
    }

    /// Re-measure the container and re-render if the size changed.
    ///
    /// Returns whether a render pass ran. Render failures are shown in the panel.
    pub async fn resize(&self) -> bool {
        if !self.inner.parser.use_resize {
            return false;
        }
        let Some(view) = self.view() else {
            return false;
        };
        if !self.update_size(&view) {
            return false;
        }

        if let Err(err) = self.render(&view).await {
            self.on_error(&err);
        }
        true
    }

    fn update_size(&self, view: &Arc<dyn EngineView>) -> bool {
        let Some(container) = self.container() else {
            return false;
        };
        let measured = self.inner.services.panel.measure(container);
        let parser = &self.inner.parser;

        let width = (measured.width - parser.padding_width).max(0.0).floor();
        let height = (measured.height - parser.padding_height - HEIGHT_EXTRA_PADDING)
            .max(0.0)
            .floor();

        if view.width() != width || view.height() != height {
            view.set_size(width, height);
            true
        } else {
            false
        }
    }

    async fn render(&self, view: &Arc<dyn EngineView>) -> Result<()> {
        let result = {
            let _guard = RenderGuard::enter(&self.inner.rendering);
            view.run_async().await
        };
        self.drain().await;
        result
    }

    /// Run engine calls posted outside a render pass.
    ///
    /// Does nothing while a render is in flight; its completion drains the
    /// queue instead. Returns how many calls were handled.
    pub async fn dispatch_pending(&self) -> usize {
        if self.inner.rendering.load(Ordering::SeqCst) > 0 {
            return 0;
        }
        self.drain().await
    }

    async fn drain(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = self.inner.calls.lock().try_recv().ok();
            let Some(call) = next else {
                break;
            };
            if self.is_destroyed() {
                tracing::debug!(view_id = %self.inner.id, ?call, "dropping engine call after teardown");
                continue;
            }
            self.dispatch(call).await;
            handled += 1;
        }
        handled
    }

    async fn dispatch(&self, call: EngineCall) {
        let outcome = match call {
            EngineCall::Warn(text) => {
                self.on_warn(&text);
                return;
            }
            EngineCall::Error(text) => {
                self.on_error(&text);
                return;
            }
            EngineCall::Invoke { name, args } => {
                match self.inner.services.functions.resolve(&name, args) {
                    Ok(call) => self.handle(call).await,
                    Err(err) => Err(err),
                }
            }
        };

        if let Err(err) = outcome {
            self.on_error(&err);
        }
    }

    async fn handle(&self, call: HandlerCall) -> Result<()> {
        tracing::debug!(
            view_id = %self.inner.id,
            handler = call.function().handler_name(),
            "expression function"
        );
        let bridge = &self.inner.filter_bridge;
        match call {
            HandlerCall::AddFilter {
                query,
                index,
                alias,
            } => bridge.add_filter(query, index.as_deref(), alias).await,
            HandlerCall::RemoveFilter { query, index } => {
                bridge.remove_filter(query, index.as_deref()).await
            }
            HandlerCall::RemoveAllFilters => {
                bridge.remove_all_filters();
                Ok(())
            }
            HandlerCall::SetTimeFilter { start, end } => {
                bridge.set_time_filter(&start, &end).map(|_| ())
            }
        }
    }

    /// Tear everything down. Safe to call any number of times.
    pub fn destroy(&self) -> Teardown {
        if !self.is_destroyed() {
            tracing::debug!(view_id = %self.inner.id, "destroying view");
        }
        self.inner.chain.destroy()
    }

    pub fn on_warn(&self, text: &str) {
        tracing::warn!(view_id = %self.inner.id, "{}", text);
        self.inner.messages.warn(text);
    }

    pub fn on_error(&self, err: &dyn fmt::Display) {
        let text = err.to_string();
        tracing::error!(view_id = %self.inner.id, "{}", text);
        self.inner.messages.error(text);
    }
}

impl fmt::Debug for ViewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewController")
            .field("id", &self.inner.id)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
