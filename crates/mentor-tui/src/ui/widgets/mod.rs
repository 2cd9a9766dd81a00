//! Reusable widgets for the mentor TUI.

pub mod chat;
pub mod input;
pub mod status_bar;
pub mod transcript;

pub use chat::ChatWidget;
pub use input::DraftInput;
pub use status_bar::{KeyHint, StatusBar};
pub use transcript::{transcript_lines, Transcript};
