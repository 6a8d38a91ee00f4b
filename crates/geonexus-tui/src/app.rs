use std::time::Instant;

use geonexus_core::{ChatExchange, PendingQuery, QueryClient, QueryError, QUICK_SUGGESTIONS};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub chat: ChatExchange,
    pub client: QueryClient,
    pub query_task: Option<JoinHandle<()>>,
    pub awaiting_since: Option<Instant>,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript viewport
    pub scroll: u16,
    pub max_scroll: u16,
    pub follow: bool, // keep the newest message in view
    pub chat_height: u16,
    pub chat_width: u16,

    pub animation_frame: u8,
}

impl App {
    pub fn new(client: QueryClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            chat: ChatExchange::new(),
            client,
            query_task: None,
            awaiting_since: None,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            max_scroll: 0,
            follow: true,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
        }
    }

    /// Whether the quick suggestion row is on offer
    pub fn show_suggestions(&self) -> bool {
        self.chat.conversation().only_greeting() && !self.chat.is_awaiting()
    }

    /// Send the input box contents. The box is only cleared when the submit is accepted.
    pub fn submit_input(&mut self, tx: &UnboundedSender<AppEvent>) {
        if let Some(pending) = self.chat.begin_submit(&self.input) {
            self.input.clear();
            self.cursor = 0;
            self.spawn_query(pending, tx);
        }
    }

    /// Send one of the canned suggestions (0-based)
    pub fn submit_suggestion(&mut self, index: usize, tx: &UnboundedSender<AppEvent>) {
        if !self.show_suggestions() {
            return;
        }
        if let Some(text) = QUICK_SUGGESTIONS.get(index) {
            if let Some(pending) = self.chat.begin_submit(text) {
                self.spawn_query(pending, tx);
            }
        }
    }

    fn spawn_query(&mut self, pending: PendingQuery, tx: &UnboundedSender<AppEvent>) {
        let client = self.client.clone();
        let tx = tx.clone();
        self.awaiting_since = Some(Instant::now());
        self.follow = true;

        self.query_task = Some(tokio::spawn(async move {
            let outcome = client.query(&pending.query).await;
            // Receiver is gone once the app has shut down
            let _ = tx.send(AppEvent::QueryFinished {
                ticket: pending.ticket,
                outcome,
            });
        }));
    }

    pub fn on_query_finished(&mut self, ticket: u64, outcome: Result<Value, QueryError>) {
        if self.chat.complete(ticket, outcome).is_some() {
            self.query_task = None;
            self.awaiting_since = None;
            self.follow = true;
        }
    }

    /// Tick animation frame and loading prompt (called by Tick event)
    pub fn tick(&mut self) {
        if let Some(since) = self.awaiting_since {
            self.animation_frame = (self.animation_frame + 1) % 3;
            self.chat.advance_status(since.elapsed());
        }
    }

    /// Drop the transcript and any outstanding query
    pub fn new_conversation(&mut self) {
        self.abort_query();
        self.chat.reset();
        self.scroll = 0;
        self.follow = true;
    }

    /// Teardown: no completion may land after this
    pub fn shutdown(&mut self) {
        self.abort_query();
    }

    fn abort_query(&mut self) {
        if let Some(task) = self.query_task.take() {
            task.abort();
        }
        self.awaiting_since = None;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll);
        if self.scroll >= self.max_scroll {
            self.follow = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.scroll = self.max_scroll;
    }
}
