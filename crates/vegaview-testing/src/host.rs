//! In-memory stand-ins for the host application's services.

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use vegaview_runtime::{
    EngineView, Error, ExpressionTable, FilterService, IndexPatterns, NodeId, Panel, Result, Size,
    TooltipCleanup, TooltipProvider,
};
use vegaview_types::{ApplyFilter, Filter, IndexPattern, TooltipConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct PanelNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub tag: String,
    pub class: String,
    pub text: Option<String>,
}

/// A DOM subtree kept as a flat list of live nodes.
#[derive(Default)]
pub struct FakePanel {
    next_id: AtomicU64,
    nodes: Mutex<Vec<PanelNode>>,
    size: Mutex<Size>,
}

impl FakePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size reported by `measure` for every node
    pub fn set_size(&self, width: f64, height: f64) {
        *self.size.lock() = Size { width, height };
    }

    pub fn nodes(&self) -> Vec<PanelNode> {
        self.nodes.lock().clone()
    }

    /// Live nodes whose class list contains `class`
    pub fn with_class(&self, class: &str) -> Vec<PanelNode> {
        self.nodes
            .lock()
            .iter()
            .filter(|node| node.class.split_whitespace().any(|c| c == class))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}

impl Panel for FakePanel {
    fn append(&self, parent: Option<NodeId>, tag: &str, class: &str) -> NodeId {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.nodes.lock().push(PanelNode {
            id,
            parent,
            tag: tag.to_string(),
            class: class.to_string(),
            text: None,
        });
        id
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(entry) = self.nodes.lock().iter_mut().find(|n| n.id == node) {
            entry.text = Some(text.to_string());
        }
    }

    fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.lock();
        let mut doomed = vec![node];
        // Parents are always appended before their children
        for entry in nodes.iter() {
            if let Some(parent) = entry.parent
                && doomed.contains(&parent)
            {
                doomed.push(entry.id);
            }
        }
        nodes.retain(|entry| !doomed.contains(&entry.id));
    }

    fn measure(&self, _node: NodeId) -> Size {
        *self.size.lock()
    }
}

/// Filter manager that records every action
#[derive(Default)]
pub struct FakeFilterService {
    active: Mutex<Vec<Filter>>,
    applied: Mutex<Vec<ApplyFilter>>,
    removed: Mutex<Vec<Filter>>,
    remove_all_calls: AtomicUsize,
    removal_error: Mutex<Option<String>>,
}

impl FakeFilterService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_active(&self, filter: impl Into<Filter>) {
        self.active.lock().push(filter.into());
    }

    /// Make every `remove_filter` call fail with `message`
    pub fn fail_removals(&self, message: impl Into<String>) {
        *self.removal_error.lock() = Some(message.into());
    }

    pub fn applied(&self) -> Vec<ApplyFilter> {
        self.applied.lock().clone()
    }

    pub fn removed(&self) -> Vec<Filter> {
        self.removed.lock().clone()
    }

    pub fn remove_all_calls(&self) -> usize {
        self.remove_all_calls.load(Ordering::SeqCst)
    }
}

impl FilterService for FakeFilterService {
    fn filters(&self) -> Vec<Filter> {
        self.active.lock().clone()
    }

    fn apply(&self, action: ApplyFilter) {
        self.applied.lock().push(action);
    }

    fn remove_filter(&self, filter: &Filter) -> Result<()> {
        if let Some(message) = self.removal_error.lock().clone() {
            return Err(Error::Host(message));
        }
        self.active.lock().retain(|active| active != filter);
        self.removed.lock().push(filter.clone());
        Ok(())
    }

    fn remove_all(&self) {
        self.remove_all_calls.fetch_add(1, Ordering::SeqCst);
        self.active.lock().clear();
    }
}

#[derive(Default)]
pub struct FakeIndexPatterns {
    known: Mutex<Vec<IndexPattern>>,
    default: Mutex<Option<IndexPattern>>,
}

impl FakeIndexPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: &str, title: &str) {
        self.known.lock().push(pattern(id, title));
    }

    pub fn set_default(&self, id: &str, title: &str) {
        *self.default.lock() = Some(pattern(id, title));
    }
}

fn pattern(id: &str, title: &str) -> IndexPattern {
    IndexPattern {
        id: id.to_string(),
        title: title.to_string(),
    }
}

impl IndexPatterns for FakeIndexPatterns {
    fn find(&self, title: &str) -> BoxFuture<'_, Result<Option<IndexPattern>>> {
        let found = self
            .known
            .lock()
            .iter()
            .find(|pattern| pattern.title == title)
            .cloned();
        futures::future::ready(Ok::<_, Error>(found)).boxed()
    }

    fn default_pattern(&self) -> BoxFuture<'_, Result<Option<IndexPattern>>> {
        let default = self.default.lock().clone();
        futures::future::ready(Ok::<_, Error>(default)).boxed()
    }
}

/// Counts tooltip handlers attached and cleaned up
#[derive(Default)]
pub struct FakeTooltips {
    attached: AtomicUsize,
    cleaned: Arc<AtomicUsize>,
    last_config: Mutex<Option<TooltipConfig>>,
}

impl FakeTooltips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn cleaned(&self) -> usize {
        self.cleaned.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<TooltipConfig> {
        self.last_config.lock().clone()
    }
}

impl TooltipProvider for FakeTooltips {
    fn attach(&self, _view: &Arc<dyn EngineView>, config: &TooltipConfig) -> TooltipCleanup {
        self.attached.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock() = Some(config.clone());
        let cleaned = Arc::clone(&self.cleaned);
        Box::new(move || {
            cleaned.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Engine expression table backed by a set of names
#[derive(Debug, Default)]
pub struct FakeExpressionTable {
    names: HashSet<String>,
}

impl FakeExpressionTable {
    pub fn with_builtin(mut self, name: &str) -> Self {
        self.names.insert(name.to_string());
        self
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }
}

impl ExpressionTable for FakeExpressionTable {
    fn is_defined(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn define(&mut self, name: &'static str) {
        self.names.insert(name.to_string());
    }
}
