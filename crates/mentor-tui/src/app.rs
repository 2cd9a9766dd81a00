//! Application state and update logic for the mentor TUI.

use crate::event::Action;
use crate::screens::chat::transcript_area;
use crate::ui::widgets::{transcript_lines, Transcript};
use mentor_engine::{ChatSession, Config, Outcome, Submit};
use ratatui::layout::Rect;

/// Lines moved per scroll action.
const SCROLL_STEP: u16 = 3;

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Page title.
    pub title: String,
    /// Page subtitle.
    pub subtitle: String,
    /// Chat service base URL, for the status bar.
    pub endpoint: String,
    /// The conversation and its pending requests.
    pub session: ChatSession,
    /// Transcript lines scrolled up from the newest.
    pub scroll: u16,
    /// Last drawn terminal area.
    pub viewport: Rect,
}

impl App {
    /// Create a new app around an existing session.
    pub fn new(config: &Config, session: ChatSession) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            endpoint: config.endpoint.clone(),
            session,
            scroll: 0,
            viewport: Rect::default(),
        }
    }

    /// Handle an action.
    ///
    /// Must be called from within a tokio runtime, since [`Action::Submit`]
    /// starts a request.
    pub fn handle_action(&mut self, action: Action) {
        // Global actions
        match action {
            Action::Quit => {
                self.should_quit = true;
                return;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return;
            }
            _ => {}
        }

        // If help is showing, any key closes it
        if self.show_help {
            self.show_help = false;
            return;
        }

        match action {
            Action::Back => self.should_quit = true,
            Action::Submit => {
                if self.session.submit() == Submit::Sent {
                    self.scroll = 0;
                }
            }
            Action::Insert(ch) => self.session.draft_mut().insert(ch),
            Action::Backspace => self.session.draft_mut().backspace(),
            Action::Delete => self.session.draft_mut().delete(),
            Action::Left => self.session.draft_mut().move_left(),
            Action::Right => self.session.draft_mut().move_right(),
            Action::Home => self.session.draft_mut().move_home(),
            Action::End => self.session.draft_mut().move_end(),
            Action::ClearDraft => self.session.set_draft(""),
            Action::ScrollUp => self.scroll_up(SCROLL_STEP),
            Action::ScrollDown => self.scroll_down(SCROLL_STEP),
            Action::Quit | Action::Help | Action::None => {}
        }
    }

    /// Apply any replies that have arrived. Returns how many were applied.
    pub fn poll_completions(&mut self) -> usize {
        let before = self.transcript_len();
        let applied = self.session.drain_completions().len();
        if applied > 0 {
            self.keep_view(before);
        }
        applied
    }

    /// Wait for the next in-flight request to resolve and apply it.
    ///
    /// Cancel-safe: dropping the future before it resolves loses nothing.
    pub async fn next_completion(&mut self) -> Option<Outcome> {
        let before = self.transcript_len();
        let outcome = self.session.next_completion().await?;
        self.keep_view(before);
        Some(outcome)
    }

    fn transcript_len(&self) -> usize {
        let area = transcript_area(self.viewport);
        transcript_lines(self.session.log(), area.width).len()
    }

    /// Keep an up-scrolled view on the same lines after the log grew from
    /// `before` lines.
    fn keep_view(&mut self, before: usize) {
        if self.scroll > 0 {
            let grown = self.transcript_len().saturating_sub(before);
            self.scroll = self
                .scroll
                .saturating_add(u16::try_from(grown).unwrap_or(u16::MAX));
        }
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Remember the terminal area of the last draw.
    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Largest scroll offset for the current viewport.
    pub fn max_scroll(&self) -> u16 {
        let area = transcript_area(self.viewport);
        Transcript::max_scroll(self.session.log(), area.width, area.height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Text for the right side of the status bar.
    pub fn status_text(&self) -> String {
        match self.session.platform() {
            Some(platform) => format!("{} [{platform}]", self.endpoint),
            None => self.endpoint.clone(),
        }
    }
}
