//! The message-send round trip.
//!
//! A [`ChatSession`] is the only owner of a [`ChatState`]. Submitting a
//! draft appends the user turn and clears the draft right away, then spawns
//! one task per request. Tasks never touch the state: when a request
//! resolves, the task posts a message back over a channel and the owner
//! applies it on its next poll. Replies are therefore appended in resolution
//! order, which can differ from send order.
//!
//! Failures are logged at `warn` and otherwise dropped: nothing is appended,
//! the draft is not restored and nothing is retried.

use crate::client::{ChatReply, ChatRequest, ChatService};
use crate::conversation::{ChatState, ConversationLog, Draft, StateUpdate, Turn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Result of asking the session to submit its draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    /// The draft was blank; nothing happened.
    Ignored,
    /// A user turn was appended and a request issued.
    Sent,
}

/// How an in-flight request ended, once the owner has applied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A bot turn was appended.
    Appended,
    /// The request failed; it was logged and nothing changed.
    SilentFail,
}

/// Message posted by a request task when it resolves.
#[derive(Debug)]
enum Completion {
    Replied(ChatReply),
    Failed,
}

/// A chat session: conversation state plus the round trip to the service.
pub struct ChatSession {
    id: Uuid,
    state: ChatState,
    service: Arc<dyn ChatService>,
    platform: Option<String>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("platform", &self.platform)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create a session talking to `service`.
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id: Uuid::new_v4(),
            state: ChatState::new(),
            service,
            platform: None,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Attach a platform id to every outgoing request.
    #[must_use]
    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }

    /// Session id, used to correlate diagnostics.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Platform sent with each request, if any.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn log(&self) -> &ConversationLog {
        self.state.log()
    }

    pub fn draft(&self) -> &Draft {
        self.state.draft()
    }

    /// Mutable draft access for cursor-level edits.
    pub fn draft_mut(&mut self) -> &mut Draft {
        self.state.draft_mut()
    }

    /// Replace the draft with a new full text value.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.apply(StateUpdate::SetDraft(text.into()));
    }

    /// Number of requests issued but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Submit the current draft.
    ///
    /// Must be called from within a tokio runtime. The user turn and the
    /// draft clear are applied before this returns.
    pub fn submit(&mut self) -> Submit {
        if self.state.draft().is_blank() {
            return Submit::Ignored;
        }

        let message = self.state.draft_mut().take();
        self.state
            .apply(StateUpdate::AppendTurn(Turn::user(message.clone())));

        let request = ChatRequest::new(message).with_platform(self.platform.clone());
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let span = info_span!("round_trip", session = %self.id, turn = self.state.log().len());

        tokio::spawn(
            async move {
                let completion = match service.send_message(&request).await {
                    Ok(reply) => {
                        debug!(sources_used = ?reply.sources_used, "reply received");
                        Completion::Replied(reply)
                    }
                    Err(e) => {
                        warn!(error = %e, "chat request failed; message dropped");
                        Completion::Failed
                    }
                };
                // The receiver lives as long as the session; if it is gone
                // there is nobody left to show the reply to.
                let _ = tx.send(completion);
            }
            .instrument(span),
        );

        self.in_flight += 1;
        Submit::Sent
    }

    /// Apply one resolved request if any is waiting, without blocking.
    pub fn try_complete(&mut self) -> Option<Outcome> {
        let completion = self.rx.try_recv().ok()?;
        Some(self.apply(completion))
    }

    /// Apply every resolved request that is waiting, in resolution order.
    pub fn drain_completions(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.try_complete() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Wait for the next request to resolve and apply it.
    ///
    /// Returns `None` immediately when nothing is in flight. With no
    /// timeout configured on the service this can wait forever.
    pub async fn next_completion(&mut self) -> Option<Outcome> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> Outcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Replied(reply) => {
                self.state
                    .apply(StateUpdate::AppendTurn(Turn::bot(reply.response)));
                Outcome::Appended
            }
            Completion::Failed => Outcome::SilentFail,
        }
    }
}
