//! Process-wide diagnostic slot holding the most recently bound view.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::view::{EngineView, same_view};

/// What the slot exposes for inspection
#[derive(Clone)]
pub struct DebugEntry {
    pub view: Arc<dyn EngineView>,
    pub spec: Value,
    pub vlspec: Option<Value>,
}

impl fmt::Debug for DebugEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugEntry")
            .field("spec", &self.spec)
            .field("vlspec", &self.vlspec)
            .finish_non_exhaustive()
    }
}

static GLOBAL: Lazy<Arc<DebugRegistry>> = Lazy::new(|| Arc::new(DebugRegistry::new()));

#[derive(Default)]
pub struct DebugRegistry {
    announced: AtomicBool,
    slot: Mutex<Option<DebugEntry>>,
}

impl DebugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<DebugRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Point the slot at `view`, replacing whatever was there
    pub fn bind(&self, view: Arc<dyn EngineView>, spec: Value, vlspec: Option<Value>, announce: bool) {
        if announce && !self.announced.swap(true, Ordering::SeqCst) {
            tracing::info!(
                "Inspect the current visualization with vegaview_runtime::DebugRegistry::global().current(); \
                 it holds the view, its spec and the Vega-Lite source when there is one"
            );
        }

        *self.slot.lock() = Some(DebugEntry { view, spec, vlspec });
    }

    /// Clear the slot if it still refers to `view`. Returns whether it did.
    pub fn release(&self, view: &Arc<dyn EngineView>) -> bool {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some(entry) if same_view(&entry.view, view) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<DebugEntry> {
        self.slot.lock().clone()
    }

    pub fn has_announced(&self) -> bool {
        self.announced.load(Ordering::SeqCst)
    }
}
