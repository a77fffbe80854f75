//! The bounded message window and per-author damping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Most recent messages considered per pass, including the trigger.
pub const DEFAULT_WINDOW_SIZE: usize = 18;

/// Hard cap on the window; config can shrink it, never grow it.
pub const MAX_WINDOW_SIZE: usize = DEFAULT_WINDOW_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(pub String);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A fetched chat message. Immutable once in a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub author: AuthorId,
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
}

impl ChatMessage {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            author: AuthorId(author.into()),
            content: content.into(),
            is_bot: false,
        }
    }
}

pub type AuthorCounts = HashMap<AuthorId, usize>;

/// Oldest-first slice of recent channel history.
#[derive(Debug, Clone, Default)]
pub struct Window {
    messages: Vec<ChatMessage>,
}

impl Window {
    /// Keep the `limit` most recent messages of an oldest-first list.
    pub fn from_recent(mut messages: Vec<ChatMessage>, limit: usize) -> Self {
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        Self { messages }
    }

    /// Build from platform history, which arrives newest-first.
    pub fn from_newest_first(mut messages: Vec<ChatMessage>, limit: usize) -> Self {
        messages.truncate(limit);
        messages.reverse();
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn author_counts(&self) -> AuthorCounts {
        let mut counts = AuthorCounts::new();
        for msg in &self.messages {
            *counts.entry(msg.author.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Per-message weight for an author with `count` messages in the window.
///
/// A lone message counts fully; above that the weight is `1.2 / sqrt(n)`,
/// which is below 1 for every n >= 2 and strictly decreasing.
pub fn author_weight(count: usize) -> f64 {
    if count <= 1 {
        return 1.0;
    }
    1.2 / (count as f64).sqrt()
}
