//! UI-agnostic conversation state types
//!
//! This module contains data structures that are shared between different UIs
//! (the TUI, the one-shot `ask` command) and don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Greeting the assistant opens every conversation with.
pub const GREETING: &str = "Hello! I'm GeoNexus AI designed to solve your queries related to MOSDAC portal. \
I can help you find satellite data, explore missions, and navigate our knowledge base. \
What would you like to know?";

/// Creation-order identifier of a message, unique within one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single transcript entry. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
}

/// The transcript of one session plus the transient "awaiting response" status.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    awaiting: bool,
    status_text: String,
}

impl Conversation {
    /// A fresh conversation seeded with the assistant greeting
    pub fn new() -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            next_id: 1,
            awaiting: false,
            status_text: String::new(),
        };
        conversation.push(Sender::Assistant, GREETING.to_string());
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True until the user has sent anything
    pub fn only_greeting(&self) -> bool {
        self.messages.len() <= 1
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub(crate) fn push(&mut self, sender: Sender, text: String) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message { id, sender, text });
        id
    }

    pub(crate) fn set_awaiting(&mut self, awaiting: bool) {
        self.awaiting = awaiting;
        if !awaiting {
            self.status_text.clear();
        }
    }

    pub(crate) fn set_status_text(&mut self, text: &str) {
        self.status_text.clear();
        self.status_text.push_str(text);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
