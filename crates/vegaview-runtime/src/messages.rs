use parking_lot::Mutex;
use std::sync::Arc;
use vegaview_types::{MessageKind, MessageRecord};

use crate::destroy::DestroyChain;
use crate::host::{NodeId, Panel, classes};

#[derive(Default)]
struct SinkState {
    list: Option<NodeId>,
    records: Vec<MessageRecord>,
}

/// Warning and error list shown at the bottom of the panel.
///
/// The list node is created with the first message and removed on teardown.
pub struct MessageSink {
    panel: Arc<dyn Panel>,
    chain: Arc<DestroyChain>,
    hide_warnings: bool,
    state: Mutex<SinkState>,
}

impl MessageSink {
    pub fn new(panel: Arc<dyn Panel>, chain: Arc<DestroyChain>, hide_warnings: bool) -> Self {
        Self {
            panel,
            chain,
            hide_warnings,
            state: Mutex::new(SinkState::default()),
        }
    }

    /// Append a message. Returns false when it was suppressed.
    pub fn add(&self, kind: MessageKind, text: impl Into<String>) -> bool {
        if kind == MessageKind::Warn && self.hide_warnings {
            return false;
        }

        let record = MessageRecord {
            kind,
            text: text.into(),
        };

        let mut state = self.state.lock();
        // After teardown the panel is no longer ours to mount into
        if self.chain.is_claimed() {
            tracing::debug!(kind = kind.as_str(), "message after teardown, not mounted");
            state.records.push(record);
            return true;
        }

        let list = match state.list {
            Some(list) => list,
            None => {
                let list = self.panel.append(None, "ul", classes::MESSAGES);
                let panel = Arc::clone(&self.panel);
                self.chain.add_sync(move || panel.remove(list));
                state.list = Some(list);
                list
            }
        };

        let item = self.panel.append(Some(list), "li", &classes::message(kind));
        let code = self.panel.append(Some(item), "pre", classes::MESSAGE_CODE);
        self.panel.set_text(code, &record.text);

        state.records.push(record);
        true
    }

    pub fn warn(&self, text: impl Into<String>) -> bool {
        self.add(MessageKind::Warn, text)
    }

    pub fn error(&self, text: impl Into<String>) -> bool {
        self.add(MessageKind::Err, text)
    }

    /// Messages in display order
    pub fn records(&self) -> Vec<MessageRecord> {
        self.state.lock().records.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }
}
