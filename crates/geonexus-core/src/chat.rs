//! One conversational session with the query backend.
//!
//! Submitting is split in two so a UI event loop never blocks on the network:
//! [`ChatExchange::begin_submit`] records the user's message and hands back a
//! [`PendingQuery`]; the caller runs the request wherever it likes and feeds the
//! outcome to [`ChatExchange::complete`]. [`ChatExchange::submit`] does both in
//! sequence for callers that can simply await.
//!
//! Assistant messages store the backend's raw JSON body. Answer extraction
//! happens in [`ChatExchange::render`].

use std::time::Duration;

use serde_json::Value;

use crate::error::QueryError;
use crate::format::{format_answer, Block};
use crate::query::QueryClient;
use crate::response::{parse_response, ParsedResponse};
use crate::state::{Conversation, Message, MessageId, Sender};

/// Status lines shown in turn while a response is awaited
pub const LOADING_PROMPTS: [&str; 3] = [
    "Analyzing query...",
    "Searching knowledge graph...",
    "Generating response...",
];

/// How long each loading prompt stays up before the next one
pub const LOADING_PROMPT_INTERVAL: Duration = Duration::from_secs(8);

/// Canned queries offered before the user has asked anything
pub const QUICK_SUGGESTIONS: [&str; 3] = [
    "Recent satellite missions",
    "Mumbai data search",
    "Cartosat-3 docs",
];

/// A submitted query waiting to be sent. Hand its outcome back with the same ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub ticket: u64,
    pub query: String,
}

/// Display form of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Plain(String),
    Formatted(Vec<Block>),
}

impl Rendered {
    /// Flatten to terminal-friendly text, one line per heading, item, or paragraph
    pub fn to_plain_text(&self) -> String {
        match self {
            Rendered::Plain(text) => text.clone(),
            Rendered::Formatted(blocks) => {
                let mut lines: Vec<String> = Vec::new();
                for block in blocks {
                    match block {
                        Block::Heading { text, .. } | Block::Paragraph { text } => {
                            lines.push(text.clone())
                        }
                        Block::List { items } => {
                            lines.extend(items.iter().map(|item| format!("• {}", item)))
                        }
                    }
                }
                lines.join("\n")
            }
        }
    }
}

pub struct ChatExchange {
    conversation: Conversation,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl ChatExchange {
    pub fn new() -> Self {
        Self {
            conversation: Conversation::new(),
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_awaiting(&self) -> bool {
        self.conversation.is_awaiting()
    }

    pub fn status_text(&self) -> &str {
        self.conversation.status_text()
    }

    /// Record a user message and reserve the in-flight slot.
    ///
    /// Returns `None` without touching any state when the trimmed content is
    /// empty or another query is still outstanding.
    pub fn begin_submit(&mut self, content: &str) -> Option<PendingQuery> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        if let Some(ticket) = self.in_flight {
            tracing::debug!(ticket, "submit rejected, query already in flight");
            return None;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        self.conversation.push(Sender::User, content.to_string());
        self.conversation.set_awaiting(true);
        self.conversation.set_status_text(LOADING_PROMPTS[0]);

        tracing::info!(ticket, chars = content.chars().count(), "query submitted");
        Some(PendingQuery {
            ticket,
            query: content.to_string(),
        })
    }

    /// Apply the outcome of a pending query.
    ///
    /// Appends exactly one assistant message and clears the awaiting flag.
    /// A ticket that is not the one in flight (the session was reset since) is
    /// ignored and `None` is returned.
    pub fn complete(
        &mut self,
        ticket: u64,
        outcome: Result<Value, QueryError>,
    ) -> Option<MessageId> {
        if self.in_flight != Some(ticket) {
            tracing::debug!(ticket, "dropping stale query completion");
            return None;
        }
        self.in_flight = None;

        let text = match outcome {
            Ok(body) => body.to_string(),
            Err(error) => {
                tracing::warn!(ticket, %error, "query failed");
                error_text(&error)
            }
        };

        let id = self.conversation.push(Sender::Assistant, text);
        self.conversation.set_awaiting(false);
        Some(id)
    }

    /// Submit and wait for the response in one step
    pub async fn submit(&mut self, client: &QueryClient, content: &str) -> Option<MessageId> {
        let pending = self.begin_submit(content)?;
        let outcome = client.query(&pending.query).await;
        self.complete(pending.ticket, outcome)
    }

    /// Step the loading prompt for the time spent awaiting so far.
    /// Holds on the last prompt once all have been shown.
    pub fn advance_status(&mut self, elapsed: Duration) {
        if !self.conversation.is_awaiting() {
            return;
        }
        let step = (elapsed.as_secs() / LOADING_PROMPT_INTERVAL.as_secs()) as usize;
        let prompt = LOADING_PROMPTS[step.min(LOADING_PROMPTS.len() - 1)];
        if self.conversation.status_text() != prompt {
            self.conversation.set_status_text(prompt);
        }
    }

    /// Start over with only the greeting. Any outstanding completion becomes stale.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::info!(ticket, "conversation reset with query in flight");
        }
        self.conversation = Conversation::new();
    }

    /// Decide how a message is displayed. Pure: the message is never changed.
    pub fn render(message: &Message) -> Rendered {
        match message.sender {
            Sender::User => Rendered::Plain(message.text.clone()),
            Sender::Assistant => match parse_response(&message.text) {
                ParsedResponse::RecognizedAnswer(answer) => {
                    Rendered::Formatted(format_answer(&answer))
                }
                ParsedResponse::RawPayload(raw) => Rendered::Plain(raw),
            },
        }
    }
}

impl Default for ChatExchange {
    fn default() -> Self {
        Self::new()
    }
}

/// Transcript text for a failed query
pub fn error_text(error: &QueryError) -> String {
    format!(
        "Sorry, I encountered an error. Please ensure the backend is running. \nDetails: {}",
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut chat = ChatExchange::new();
        assert_eq!(chat.begin_submit(""), None);
        assert_eq!(chat.begin_submit("   "), None);
        assert_eq!(chat.messages().len(), 1);
        assert!(!chat.is_awaiting());
    }

    #[test]
    fn test_submit_appends_user_message_before_response() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("  hello ").unwrap();
        assert_eq!(pending.query, "hello");

        let last = chat.conversation().last().unwrap();
        assert_eq!(last.sender, Sender::User);
        assert_eq!(last.text, "hello");
        assert_eq!(chat.messages().len(), 2);
        assert!(chat.is_awaiting());
        assert_eq!(chat.status_text(), LOADING_PROMPTS[0]);
    }

    #[test]
    fn test_successful_response_is_stored_raw_and_rendered_formatted() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("status of X").unwrap();
        let id = chat
            .complete(pending.ticket, Ok(json!({"answer": "Satellite X is active."})))
            .unwrap();

        assert_eq!(chat.messages().len(), 3);
        let message = chat.conversation().last().unwrap();
        assert_eq!(message.id, id);
        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.text, r#"{"answer":"Satellite X is active."}"#);

        let rendered = ChatExchange::render(message);
        assert!(matches!(rendered, Rendered::Formatted(_)));
        assert!(rendered.to_plain_text().contains("Satellite X is active."));
        assert!(!chat.is_awaiting());
    }

    #[test]
    fn test_unrecognized_body_renders_verbatim() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("anything").unwrap();
        chat.complete(pending.ticket, Ok(json!({"nodes": []})));
        let message = chat.conversation().last().unwrap();
        assert_eq!(
            ChatExchange::render(message),
            Rendered::Plain(r#"{"nodes":[]}"#.to_string())
        );
    }

    #[test]
    fn test_failure_appends_one_error_message() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("hello").unwrap();
        chat.complete(
            pending.ticket,
            Err(QueryError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        );

        assert_eq!(chat.messages().len(), 3);
        let message = chat.conversation().last().unwrap();
        assert_eq!(message.sender, Sender::Assistant);
        assert!(message.text.contains("encountered an error"));
        assert!(message.text.contains("Server error: 500"));
        assert!(!chat.is_awaiting());
        assert_eq!(chat.status_text(), "");
    }

    #[test]
    fn test_second_submit_rejected_while_in_flight() {
        let mut chat = ChatExchange::new();
        let first = chat.begin_submit("first").unwrap();
        assert_eq!(chat.begin_submit("second"), None);
        assert_eq!(chat.messages().len(), 2);

        chat.complete(first.ticket, Ok(json!({"answer": "ok"})));
        assert!(chat.begin_submit("second").is_some());
    }

    #[test]
    fn test_completion_after_reset_is_dropped() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("hello").unwrap();
        chat.reset();
        assert!(!chat.is_awaiting());

        assert_eq!(chat.complete(pending.ticket, Ok(json!({"answer": "late"}))), None);
        assert_eq!(chat.messages().len(), 1);
        assert!(chat.conversation().only_greeting());
    }

    #[test]
    fn test_status_steps_through_prompts_and_holds() {
        let mut chat = ChatExchange::new();
        chat.begin_submit("hello").unwrap();

        chat.advance_status(Duration::from_secs(3));
        assert_eq!(chat.status_text(), LOADING_PROMPTS[0]);
        chat.advance_status(Duration::from_secs(8));
        assert_eq!(chat.status_text(), LOADING_PROMPTS[1]);
        chat.advance_status(Duration::from_secs(17));
        assert_eq!(chat.status_text(), LOADING_PROMPTS[2]);
        chat.advance_status(Duration::from_secs(600));
        assert_eq!(chat.status_text(), LOADING_PROMPTS[2]);
    }

    #[test]
    fn test_status_untouched_when_idle() {
        let mut chat = ChatExchange::new();
        chat.advance_status(Duration::from_secs(30));
        assert_eq!(chat.status_text(), "");
    }

    #[test]
    fn test_plain_text_flattening() {
        let rendered = Rendered::Formatted(format_answer("# Title\n* a\n* b\nplain line"));
        assert_eq!(rendered.to_plain_text(), "Title\n• a\n• b\nplain line");
    }

    #[test]
    fn test_user_messages_never_formatted() {
        let mut chat = ChatExchange::new();
        chat.begin_submit(r##"{"answer": "# not a heading"}"##).unwrap();
        let message = chat.conversation().last().unwrap();
        assert_eq!(
            ChatExchange::render(message),
            Rendered::Plain(r##"{"answer": "# not a heading"}"##.to_string())
        );
    }

    #[test]
    fn test_render_block_count_matches_line_groups() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("products").unwrap();
        let answer = "## Products\n* SST\n* OLR\nBoth are daily.\n- Rainfall\n# End";
        chat.complete(pending.ticket, Ok(json!({ "answer": answer })));

        match ChatExchange::render(chat.conversation().last().unwrap()) {
            Rendered::Formatted(blocks) => assert_eq!(blocks.len(), 5),
            other => panic!("expected formatted output, got {:?}", other),
        }
    }
}
