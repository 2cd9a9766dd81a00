//! Conversation state for a chat session.
//!
//! [`ChatState`] owns the turn log and the draft buffer. It has exactly two
//! mutation operations, appending a turn and replacing the draft, and both
//! are expressed as a [`StateUpdate`] message so callers can hand them across
//! task boundaries instead of sharing the state itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used as `user_text` for turns that carry a bot reply.
pub const BOT_LABEL: &str = "Bot";

/// One logged exchange unit: a user submission or a bot reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Text supplied by the user, or [`BOT_LABEL`] for bot turns.
    pub user_text: String,
    /// Reply text. Always empty for user turns.
    pub reply_text: String,
    /// When the turn was appended.
    pub created_at: DateTime<Utc>,
    /// Set only by [`Turn::bot`]; a user may type the label too.
    #[serde(default)]
    from_bot: bool,
}

impl Turn {
    /// Create a user turn with an empty reply.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            user_text: text.into(),
            reply_text: String::new(),
            created_at: Utc::now(),
            from_bot: false,
        }
    }

    /// Create a bot turn carrying a reply.
    pub fn bot(reply: impl Into<String>) -> Self {
        Self {
            user_text: BOT_LABEL.into(),
            reply_text: reply.into(),
            created_at: Utc::now(),
            from_bot: true,
        }
    }

    /// Whether this turn was produced by the chat service.
    pub fn is_bot(&self) -> bool {
        self.from_bot
    }
}

// Equality is over the visible content only; timestamps differ between
// otherwise identical turns.
impl PartialEq for Turn {
    fn eq(&self, other: &Self) -> bool {
        self.user_text == other.user_text
            && self.reply_text == other.reply_text
            && self.from_bot == other.from_bot
    }
}

impl Eq for Turn {}

/// Append-only, chronologically ordered log of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterate over turns in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// The turns as a slice.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Get the most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// The not-yet-sent message buffer, with an edit cursor.
///
/// The cursor is a character index, so multi-byte input never splits a
/// code point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    text: String,
    cursor: usize,
}

impl Draft {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position as a character index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the draft has no characters at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the draft is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the whole text. The cursor moves to the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.char_len();
    }

    /// Take the text, leaving the draft empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(i, _)| i)
    }
}

/// A mutation of [`ChatState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    /// Append a turn to the log.
    AppendTurn(Turn),
    /// Replace the draft with a new full text value.
    SetDraft(String),
}

/// Conversation log plus draft, owned by a single chat session.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    log: ConversationLog,
    draft: Draft,
}

impl ChatState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a state update.
    pub fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::AppendTurn(turn) => self.append_turn(turn),
            StateUpdate::SetDraft(text) => self.set_draft(text),
        }
    }

    /// Append a turn to the log.
    pub fn append_turn(&mut self, turn: Turn) {
        self.log.push(turn);
    }

    /// Replace the draft unconditionally.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft.set(text);
    }

    /// The turn log.
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// The draft buffer.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Mutable access to the draft for cursor edits.
    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let user = Turn::user("Hi");
        assert_eq!(user.user_text, "Hi");
        assert!(user.reply_text.is_empty());
        assert!(!user.is_bot());

        let bot = Turn::bot("Hello!");
        assert_eq!(bot.user_text, "Bot");
        assert_eq!(bot.reply_text, "Hello!");
        assert!(bot.is_bot());
    }

    #[test]
    fn test_user_typing_bot_label_is_still_a_user_turn() {
        let typed = Turn::user("Bot");
        assert_eq!(typed.user_text, BOT_LABEL);
        assert!(!typed.is_bot());
        assert_ne!(typed, Turn::bot(""));

        let mut state = ChatState::new();
        state.append_turn(typed);
        assert!(!state.log().turns()[0].is_bot());
    }

    #[test]
    fn test_turn_equality_ignores_timestamp() {
        let mut a = Turn::user("same");
        let b = Turn::user("same");
        a.created_at = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(a, b);
    }

    #[test]
    fn test_log_preserves_insertion_order() {
        let mut state = ChatState::new();
        state.append_turn(Turn::user("one"));
        state.append_turn(Turn::bot("two"));
        state.append_turn(Turn::user("three"));

        let texts: Vec<&str> = state.log().iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(texts, vec!["one", "Bot", "three"]);
        assert_eq!(state.log().last().map(|t| t.user_text.as_str()), Some("three"));
    }

    #[test]
    fn test_apply_routes_updates() {
        let mut state = ChatState::new();
        state.apply(StateUpdate::SetDraft("draft".into()));
        assert_eq!(state.draft().text(), "draft");

        state.apply(StateUpdate::AppendTurn(Turn::user("x")));
        assert_eq!(state.log().len(), 1);
    }

    #[test]
    fn test_set_draft_has_no_limit_or_validation() {
        let mut state = ChatState::new();
        let long = "a".repeat(100_000);
        state.set_draft(long.clone());
        assert_eq!(state.draft().text(), long);

        state.set_draft("   ");
        assert_eq!(state.draft().text(), "   ");
        assert!(state.draft().is_blank());
    }

    #[test]
    fn test_draft_editing() {
        let mut draft = Draft::new();
        draft.insert_str("Hello");
        draft.move_left();
        draft.move_left();
        assert_eq!(draft.cursor(), 3);

        draft.insert('X');
        assert_eq!(draft.text(), "HelXlo");

        draft.move_home();
        draft.delete();
        assert_eq!(draft.text(), "elXlo");

        draft.move_end();
        draft.backspace();
        assert_eq!(draft.text(), "elXl");
        assert_eq!(draft.cursor(), 4);
    }

    #[test]
    fn test_draft_multibyte_cursor() {
        let mut draft = Draft::new();
        draft.set("héllo");
        draft.move_home();
        draft.move_right();
        draft.move_right();
        draft.backspace();
        assert_eq!(draft.text(), "hllo");

        draft.insert('ü');
        assert_eq!(draft.text(), "hüllo");
        assert_eq!(draft.cursor(), 2);
    }

    #[test]
    fn test_draft_take_clears() {
        let mut draft = Draft::new();
        draft.set("message");
        assert_eq!(draft.take(), "message");
        assert!(draft.is_empty());
        assert_eq!(draft.cursor(), 0);
    }

    #[test]
    fn test_draft_edges_are_noops() {
        let mut draft = Draft::new();
        draft.backspace();
        draft.delete();
        draft.move_left();
        draft.move_right();
        assert!(draft.is_empty());
        assert_eq!(draft.cursor(), 0);
    }
}
