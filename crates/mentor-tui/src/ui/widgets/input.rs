//! Draft input widget.

use crate::ui::theme::Styles;
use mentor_engine::Draft;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

/// Prompt shown before the draft.
const PROMPT: &str = "> ";

/// Renders a [`Draft`] with a prompt and a cursor marker.
///
/// The cursor is drawn as `_` at the end of the text and as `|` before the
/// character it sits on. When the draft is taller than the area, the last
/// rows are shown.
pub struct DraftInput<'a> {
    draft: &'a Draft,
    placeholder: Option<&'a str>,
    focused: bool,
}

impl<'a> DraftInput<'a> {
    pub fn new(draft: &'a Draft) -> Self {
        Self {
            draft,
            placeholder: None,
            focused: true,
        }
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn lines(&self) -> Vec<Line<'static>> {
        if self.draft.is_empty() {
            let mut spans = vec![Span::styled(PROMPT, Styles::active())];
            if self.focused {
                spans.push(Span::styled("_", Styles::active()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder.to_string(), Styles::dim()));
            }
            return vec![Line::from(spans)];
        }

        let indent = " ".repeat(PROMPT.len());
        let mut lines = Vec::new();
        let mut current = vec![Span::styled(PROMPT, Styles::active())];
        let mut text = String::new();

        for (i, ch) in self.draft.text().chars().enumerate() {
            if self.focused && i == self.draft.cursor() {
                current.push(Span::styled(std::mem::take(&mut text), Styles::default()));
                current.push(Span::styled(
                    if ch == '\n' { "_" } else { "|" },
                    Styles::active(),
                ));
            }
            if ch == '\n' {
                current.push(Span::styled(std::mem::take(&mut text), Styles::default()));
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::raw(indent.clone()));
            } else {
                text.push(ch);
            }
        }

        current.push(Span::styled(text, Styles::default()));
        if self.focused && self.draft.cursor() >= self.draft.text().chars().count() {
            current.push(Span::styled("_", Styles::active()));
        }
        lines.push(Line::from(current));
        lines
    }
}

/// Rows `lines` occupy when wrapped to `width`.
fn wrapped_rows(lines: &[Line<'_>], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|s| s.content.width()).sum();
            w.div_ceil(width).max(1)
        })
        .sum()
}

impl Widget for DraftInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let lines = self.lines();
        let rows = wrapped_rows(&lines, area.width);
        let hidden = u16::try_from(rows.saturating_sub(usize::from(area.height))).unwrap_or(u16::MAX);

        Paragraph::new(lines)
            .style(Styles::default())
            .wrap(Wrap { trim: false })
            .scroll((hidden, 0))
            .render(area, buf);
    }
}
