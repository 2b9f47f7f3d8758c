use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Warn,
    Err,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Warn => "warn",
            MessageKind::Err => "err",
        }
    }
}

/// A warning or error shown in the panel's message list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub kind: MessageKind,
    pub text: String,
}

impl MessageRecord {
    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warn,
            text: text.into(),
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Err,
            text: text.into(),
        }
    }
}
