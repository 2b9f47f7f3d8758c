//! Host application services the controller consumes.
//!
//! None of these are implemented here: the dashboard supplies them, and
//! `vegaview-testing` ships in-memory fakes.

use futures::future::BoxFuture;
use std::sync::Arc;
use vegaview_types::{ApplyFilter, Direction, Filter, IndexPattern, MessageKind, TooltipConfig};

use crate::Result;
use crate::view::EngineView;

/// Opaque handle to a node created through [`Panel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// The DOM subtree owned by one visualization panel
pub trait Panel: Send + Sync {
    /// Append an element under `parent` (or the panel root) and return its handle
    fn append(&self, parent: Option<NodeId>, tag: &str, class: &str) -> NodeId;

    fn set_text(&self, node: NodeId, text: &str);

    /// Detach a node and its children; unknown nodes are ignored
    fn remove(&self, node: NodeId);

    fn measure(&self, node: NodeId) -> Size;
}

/// Host filter manager
pub trait FilterService: Send + Sync {
    /// Currently active filters
    fn filters(&self) -> Vec<Filter>;

    /// Filter-application callback (also used for time ranges)
    fn apply(&self, action: ApplyFilter);

    fn remove_filter(&self, filter: &Filter) -> Result<()>;

    fn remove_all(&self);
}

/// Index pattern lookup
pub trait IndexPatterns: Send + Sync {
    fn find(&self, title: &str) -> BoxFuture<'_, Result<Option<IndexPattern>>>;

    fn default_pattern(&self) -> BoxFuture<'_, Result<Option<IndexPattern>>>;
}

/// Cleanup returned by [`TooltipProvider::attach`]
pub type TooltipCleanup = Box<dyn FnOnce() + Send>;

pub trait TooltipProvider: Send + Sync {
    fn attach(&self, view: &Arc<dyn EngineView>, config: &TooltipConfig) -> TooltipCleanup;
}

/// Class names used for styling hooks
pub mod classes {
    use super::*;

    pub const VIEW: &str = "vgaVis__view";
    pub const MESSAGES: &str = "vgaVis__messages";
    pub const MESSAGE_CODE: &str = "vgaVis__messageCode";

    pub fn controls(direction: Direction) -> String {
        format!("vgaVis__controls vgaVis__controls--{}", direction.as_str())
    }

    pub fn message(kind: MessageKind) -> String {
        format!("vgaVis__message vgaVis__message--{}", kind.as_str())
    }
}
