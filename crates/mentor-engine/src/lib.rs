//! mentor-engine: Headless engine for the mentor chat client
//!
//! This crate provides everything below the terminal UI:
//! - Conversation state (turn log and draft)
//! - The message-send round trip to the remote chat service
//! - HTTP client for the chat service
//! - Configuration and diagnostic logging

pub mod client;
pub mod config;
pub mod conversation;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use client::{
    ChatReply, ChatRequest, ChatService, HealthStatus, HistoryEntry, HttpChatService, Platform,
    ServiceError,
};
pub use config::{Config, ConfigError};
pub use conversation::{ChatState, ConversationLog, Draft, StateUpdate, Turn, BOT_LABEL};
pub use logging::{init_logging, LogTarget, LoggingError};
pub use session::{ChatSession, Outcome, Submit};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
