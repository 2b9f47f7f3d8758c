//! Contract with the external rendering engine.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use vegaview_engine::UrlAccessGate;
use vegaview_types::{ParserResult, RendererKind};

use crate::Result;
use crate::host::NodeId;

/// Something the engine asks the host to do.
///
/// Posted from inside the engine's expression interpreter and drained by the
/// controller once the current render pass has finished.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Invoke { name: String, args: Vec<Value> },
    Warn(String),
    Error(String),
}

/// Back-reference from a bound engine view to its controller
#[derive(Debug, Clone)]
pub struct CallRouter {
    tx: mpsc::UnboundedSender<EngineCall>,
}

impl CallRouter {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<EngineCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn invoke(&self, name: impl Into<String>, args: Vec<Value>) {
        self.post(EngineCall::Invoke {
            name: name.into(),
            args,
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.post(EngineCall::Warn(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(EngineCall::Error(message.into()));
    }

    fn post(&self, call: EngineCall) {
        if self.tx.send(call).is_err() {
            tracing::debug!("controller gone, dropping engine call");
        }
    }
}

/// Everything a view needs when it is bound to a controller
#[derive(Debug, Clone)]
pub struct ViewMount {
    pub container: Option<NodeId>,
    pub controls: Option<NodeId>,
    pub router: CallRouter,
}

/// Configuration handed to the engine at construction
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub renderer: RendererKind,
    pub loader: Arc<UrlAccessGate>,
}

/// A live engine view
pub trait EngineView: Send + Sync {
    fn initialize(&self, mount: ViewMount);

    /// Start a render pass; the future resolves when it completes
    fn run_async(&self) -> BoxFuture<'static, Result<()>>;

    fn finalize(&self);

    fn width(&self) -> f64;

    fn height(&self) -> f64;

    fn set_size(&self, width: f64, height: f64);
}

/// Builds engine views from parsed specs
pub trait EngineFactory: Send + Sync {
    fn create(&self, parser: &ParserResult, config: &EngineConfig) -> Result<Arc<dyn EngineView>>;
}

/// Identity comparison for views (never value equality)
pub fn same_view(a: &Arc<dyn EngineView>, b: &Arc<dyn EngineView>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
