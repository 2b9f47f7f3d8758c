//! Scriptable engine view.
//!
//! A `FakeEngineView` stands in for the rendering engine: it records what the
//! controller asks of it and, during a render pass, posts whatever engine
//! calls the test queued, the way the expression interpreter would.

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vegaview_runtime::{
    CallRouter, EngineCall, EngineConfig, EngineFactory, EngineView, Error, Result, ViewMount,
};
use vegaview_types::ParserResult;

#[derive(Default)]
pub struct FakeEngineView {
    size: Mutex<(f64, f64)>,
    mount: Mutex<Option<ViewMount>>,
    scripted: Mutex<Vec<EngineCall>>,
    render_error: Mutex<Option<String>>,
    held_render: Mutex<Option<oneshot::Receiver<()>>>,
    renders: AtomicUsize,
    resizes: AtomicUsize,
    finalized: AtomicUsize,
}

impl FakeEngineView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Post `call` during the next render pass
    pub fn queue(&self, call: EngineCall) {
        self.scripted.lock().push(call);
    }

    /// Queue an expression-function call for the next render pass
    pub fn queue_invoke(&self, name: &str, args: Vec<Value>) {
        self.queue(EngineCall::Invoke {
            name: name.to_string(),
            args,
        });
    }

    /// Make the next render pass fail with `message`
    pub fn fail_next_render(&self, message: impl Into<String>) {
        *self.render_error.lock() = Some(message.into());
    }

    /// Keep the next render pass pending until the returned sender fires
    pub fn hold_next_render(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.held_render.lock() = Some(rx);
        tx
    }

    /// Router handed over by the controller, for posting outside a render
    pub fn router(&self) -> Option<CallRouter> {
        self.mount.lock().as_ref().map(|mount| mount.router.clone())
    }

    pub fn mount(&self) -> Option<ViewMount> {
        self.mount.lock().clone()
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn resizes(&self) -> usize {
        self.resizes.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }

    pub fn size(&self) -> (f64, f64) {
        *self.size.lock()
    }
}

impl EngineView for FakeEngineView {
    fn initialize(&self, mount: ViewMount) {
        *self.mount.lock() = Some(mount);
    }

    fn run_async(&self) -> BoxFuture<'static, Result<()>> {
        self.renders.fetch_add(1, Ordering::SeqCst);

        let calls: Vec<EngineCall> = std::mem::take(&mut *self.scripted.lock());
        if let Some(router) = self.router() {
            for call in calls {
                match call {
                    EngineCall::Invoke { name, args } => router.invoke(name, args),
                    EngineCall::Warn(text) => router.warn(text),
                    EngineCall::Error(text) => router.error(text),
                }
            }
        }

        let failure = self.render_error.lock().take();
        let held = self.held_render.lock().take();
        async move {
            if let Some(held) = held {
                let _ = held.await;
            }
            match failure {
                Some(message) => Err(Error::Engine(message)),
                None => Ok(()),
            }
        }
        .boxed()
    }

    fn finalize(&self) {
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }

    fn width(&self) -> f64 {
        self.size.lock().0
    }

    fn height(&self) -> f64 {
        self.size.lock().1
    }

    fn set_size(&self, width: f64, height: f64) {
        self.resizes.fetch_add(1, Ordering::SeqCst);
        *self.size.lock() = (width, height);
    }
}

/// Hands out `FakeEngineView`s and remembers what it was asked to build
#[derive(Default)]
pub struct FakeEngineFactory {
    views: Mutex<Vec<Arc<FakeEngineView>>>,
    configs: Mutex<Vec<EngineConfig>>,
    scripted: Mutex<Vec<EngineCall>>,
    failure: Mutex<Option<String>>,
}

impl FakeEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls every new view posts during its first render
    pub fn script(&self, call: EngineCall) {
        self.scripted.lock().push(call);
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn views(&self) -> Vec<Arc<FakeEngineView>> {
        self.views.lock().clone()
    }

    pub fn last_view(&self) -> Option<Arc<FakeEngineView>> {
        self.views.lock().last().cloned()
    }

    pub fn last_config(&self) -> Option<EngineConfig> {
        self.configs.lock().last().cloned()
    }
}

impl EngineFactory for FakeEngineFactory {
    fn create(&self, _parser: &ParserResult, config: &EngineConfig) -> Result<Arc<dyn EngineView>> {
        self.configs.lock().push(config.clone());
        if let Some(message) = self.failure.lock().clone() {
            return Err(Error::Engine(message));
        }

        let view = FakeEngineView::new();
        for call in self.scripted.lock().iter().cloned() {
            view.queue(call);
        }
        self.views.lock().push(Arc::clone(&view));
        Ok(view)
    }
}
