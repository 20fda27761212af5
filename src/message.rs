use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::{ItemKey, TimelineItem};

/// A timeline entry as delivered by the mock source and the push bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub author: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub edited: bool,
}

impl ChatMessage {
    pub fn new(id: i64, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            author: author.into(),
            body: body.into(),
            sent_at: Utc::now(),
            edited: false,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.edited = true;
        self
    }
}

impl TimelineItem for ChatMessage {
    type Key = ItemKey;

    fn key(&self) -> ItemKey {
        ItemKey::Number(self.id)
    }
}
