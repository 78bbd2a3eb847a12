//! UI-agnostic conversation state
//!
//! This module contains the message store shared by every frontend. It does
//! not depend on any UI framework.

use std::fmt;

use chrono::{DateTime, Local};

use crate::api::{HistoryEntry, Role};

/// How many of the most recent messages accompany each request as context.
pub const HISTORY_WINDOW: usize = 10;

/// Identifier of a message within one session. Assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn role(&self) -> Role {
        match self {
            Sender::User => Role::User,
            Sender::Assistant => Role::Assistant,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Spectra",
        }
    }
}

/// A single entry in the thread. Never modified after it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub is_error: bool,
}

impl Message {
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.sender.role(),
            content: self.content.clone(),
        }
    }
}

/// Append-only, insertion-ordered list of messages.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Sender::User, content.into(), false)
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Sender::Assistant, content.into(), false)
    }

    /// Append an assistant-styled message standing in for a failed reply.
    pub fn push_error(&mut self, content: impl Into<String>) -> &Message {
        self.push(Sender::Assistant, content.into(), true)
    }

    fn push(&mut self, sender: Sender, content: String, is_error: bool) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: MessageId(self.next_id),
            content,
            sender,
            timestamp: Local::now(),
            is_error,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last [`HISTORY_WINDOW`] messages, oldest first, in wire form.
    pub fn history_window(&self) -> Vec<HistoryEntry> {
        let start = self.messages.len().saturating_sub(HISTORY_WINDOW);
        self.messages[start..]
            .iter()
            .map(Message::to_history_entry)
            .collect()
    }
}

/// Result of the one-shot status probe made when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Checking,
    Connected,
    Offline,
}

impl Connectivity {
    pub fn label(&self) -> &'static str {
        match self {
            Connectivity::Checking => "Checking",
            Connectivity::Connected => "Connected",
            Connectivity::Offline => "Offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut store = MessageStore::new();
        let first = store.push_user("one").id;
        let second = store.push_assistant("two").id;
        let third = store.push_error("three").id;
        assert!(first < second && second < third);

        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_error_messages_are_assistant_styled() {
        let mut store = MessageStore::new();
        let msg = store.push_error("oops");
        assert_eq!(msg.sender, Sender::Assistant);
        assert!(msg.is_error);
        assert!(!store.push_assistant("fine").is_error);
    }

    #[test]
    fn test_history_window_keeps_latest_ten() {
        let mut store = MessageStore::new();
        for i in 1..=11 {
            if i % 2 == 1 {
                store.push_user(format!("m{}", i));
            } else {
                store.push_assistant(format!("m{}", i));
            }
        }

        let window = store.history_window();
        assert_eq!(window.len(), HISTORY_WINDOW);
        assert_eq!(window.first().unwrap().content, "m2");
        assert_eq!(window.first().unwrap().role, Role::Assistant);
        assert_eq!(window.last().unwrap().content, "m11");
        assert_eq!(window.last().unwrap().role, Role::User);
    }

    #[test]
    fn test_history_window_short_thread() {
        let mut store = MessageStore::new();
        assert!(store.history_window().is_empty());
        store.push_assistant("greeting");
        assert_eq!(store.history_window().len(), 1);
    }
}
