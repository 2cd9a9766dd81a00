//! Transcript of the conversation log.
//!
//! Each turn renders as its label (the user's text, or `Bot`) followed by
//! the reply when there is one, wrapped to the available width:
//!
//! ```text
//! What is SQL injection?
//!
//! Bot: SQL injection is when an attacker smuggles query
//! syntax into an input field...
//! ```
//!
//! Rendering only reads the log; the same log always yields the same lines.

use crate::ui::theme::Styles;
use mentor_engine::{ConversationLog, Turn};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Shown when the log is empty.
const EMPTY_TEXT: &str = "No messages yet. Ask a cybersecurity question to get started.";

/// Build the wrapped transcript lines for `log`.
pub fn transcript_lines(log: &ConversationLog, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();

    for (i, turn) in log.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(wrap_styled(&turn_segments(turn), width));
    }

    lines
}

fn turn_segments(turn: &Turn) -> Vec<(String, Style)> {
    let label_style = if turn.is_bot() {
        Styles::bot_label()
    } else {
        Styles::user_label()
    };

    let mut segments = vec![(turn.user_text.clone(), label_style)];
    if !turn.reply_text.is_empty() {
        segments.push((": ".to_string(), label_style));
        segments.push((turn.reply_text.clone(), Styles::default()));
    }
    segments
}

/// Wrap styled text to `width`, keeping each character's style.
///
/// Hard line breaks are honoured; soft breaks come from textwrap, which
/// drops the whitespace it breaks on.
fn wrap_styled(segments: &[(String, Style)], width: usize) -> Vec<Line<'static>> {
    let mut hard_lines: Vec<Vec<(char, Style)>> = vec![Vec::new()];
    for (text, style) in segments {
        for ch in text.chars() {
            if ch == '\n' {
                hard_lines.push(Vec::new());
            } else if let Some(current) = hard_lines.last_mut() {
                current.push((ch, *style));
            }
        }
    }

    let mut out = Vec::new();
    for styled in hard_lines {
        if styled.is_empty() {
            out.push(Line::default());
            continue;
        }

        let plain: String = styled.iter().map(|(ch, _)| ch).collect();
        let mut idx = 0;
        for piece in textwrap::wrap(&plain, width) {
            // Skip whitespace consumed by the break.
            while idx < styled.len()
                && styled[idx].0.is_whitespace()
                && !piece.starts_with(styled[idx].0)
            {
                idx += 1;
            }

            let mut spans: Vec<Span<'static>> = Vec::new();
            let mut run = String::new();
            let mut run_style: Option<Style> = None;

            for ch in piece.chars() {
                let style = styled.get(idx).map_or_else(Styles::default, |(_, s)| *s);
                idx += 1;
                if run_style.is_some_and(|s| s != style) {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
                }
                run_style = Some(style);
                run.push(ch);
            }
            if !run.is_empty() {
                spans.push(Span::styled(run, run_style.unwrap_or_default()));
            }

            out.push(Line::from(spans));
        }
    }

    out
}

/// Bottom-anchored view of the transcript.
///
/// `scroll` counts lines up from the newest line; it is clamped so the view
/// never scrolls past the first line.
pub struct Transcript<'a> {
    log: &'a ConversationLog,
    scroll: u16,
}

impl<'a> Transcript<'a> {
    pub fn new(log: &'a ConversationLog) -> Self {
        Self { log, scroll: 0 }
    }

    #[must_use]
    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    /// Largest useful scroll offset for a viewport of `width` x `height`.
    pub fn max_scroll(log: &ConversationLog, width: u16, height: u16) -> u16 {
        let total = transcript_lines(log, width).len();
        u16::try_from(total.saturating_sub(usize::from(height))).unwrap_or(u16::MAX)
    }
}

impl Widget for Transcript<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        if self.log.is_empty() {
            Paragraph::new(Line::from(Span::styled(EMPTY_TEXT, Styles::dim())))
                .style(Styles::default())
                .render(area, buf);
            return;
        }

        let lines = transcript_lines(self.log, area.width);
        let height = usize::from(area.height);
        let max_scroll = lines.len().saturating_sub(height);
        let start = max_scroll - usize::from(self.scroll).min(max_scroll);
        let end = (start + height).min(lines.len());

        Paragraph::new(lines[start..end].to_vec())
            .style(Styles::default())
            .render(area, buf);
    }
}
