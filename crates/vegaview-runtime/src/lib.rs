pub mod bridge;
pub mod config;
pub mod controller;
pub mod debug;
pub mod destroy;
pub mod error;
pub mod filter_bridge;
pub mod host;
pub mod messages;
pub mod view;

pub use bridge::{ExpressionFunction, ExpressionTable, FunctionRegistry, HandlerCall};
pub use config::{ViewConfig, resolve_config_path};
pub use controller::{StandardView, ViewController, ViewCustomization, ViewServices};
pub use debug::{DebugEntry, DebugRegistry};
pub use destroy::{DestroyChain, DestroyHandler, Teardown};
pub use error::{Error, Result};
pub use filter_bridge::FilterBridge;
pub use host::{
    FilterService, IndexPatterns, NodeId, Panel, Size, TooltipCleanup, TooltipProvider, classes,
};
pub use messages::MessageSink;
pub use view::{
    CallRouter, EngineCall, EngineConfig, EngineFactory, EngineView, ViewMount, same_view,
};

pub use vegaview_engine::{
    LoadOptions, ResourceLoader, SanitizedUri, StandardLoader, UriInput, UrlAccessGate,
    bypass_external_url_check,
};
