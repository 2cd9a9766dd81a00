//! Chat widget.
//!
//! The transcript on top and the draft input at the bottom:
//!
//! ```text
//! ┌─ Chat ───────────────────────────────┐
//! │ What is a buffer overflow?           │
//! │                                      │
//! │ Bot: Think of pouring too much water │
//! │ into a cup...                        │
//! ├──────────────────────────────────────┤
//! │ > _                                  │
//! └──────────────────────────────────────┘
//! ```

use super::{DraftInput, Transcript};
use crate::ui::theme::Styles;
use mentor_engine::ChatState;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::line,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Fixed height for the input area (in lines).
pub const INPUT_HEIGHT: u16 = 3;

/// Height for the divider line.
const DIVIDER_HEIGHT: u16 = 1;

const PLACEHOLDER: &str = "Ask a cybersecurity question...";

/// Areas of the chat widget inside its border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatAreas {
    pub transcript: Rect,
    pub divider: Rect,
    pub input: Rect,
}

impl ChatAreas {
    /// Split the widget's outer `area`. When too small for everything, the
    /// transcript gets nothing and the input takes what is left.
    pub fn split(area: Rect) -> Self {
        let inner = Block::default().borders(Borders::ALL).inner(area);

        if inner.height < INPUT_HEIGHT + DIVIDER_HEIGHT + 1 {
            return Self {
                transcript: Rect::new(inner.x, inner.y, inner.width, 0),
                divider: Rect::new(inner.x, inner.y, inner.width, 0),
                input: inner,
            };
        }

        let transcript_height = inner.height - INPUT_HEIGHT - DIVIDER_HEIGHT;
        let divider_y = inner.y + transcript_height;
        Self {
            transcript: Rect::new(inner.x, inner.y, inner.width, transcript_height),
            divider: Rect::new(inner.x, divider_y, inner.width, DIVIDER_HEIGHT),
            input: Rect::new(inner.x, divider_y + DIVIDER_HEIGHT, inner.width, INPUT_HEIGHT),
        }
    }
}

/// Chat widget over a [`ChatState`].
pub struct ChatWidget<'a> {
    state: &'a ChatState,
    scroll: u16,
    focused: bool,
}

impl<'a> ChatWidget<'a> {
    pub fn new(state: &'a ChatState) -> Self {
        Self {
            state,
            scroll: 0,
            focused: true,
        }
    }

    /// Lines scrolled up from the newest message.
    #[must_use]
    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

fn render_divider(area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let divider = line::HORIZONTAL.repeat(usize::from(area.width));
    Paragraph::new(Line::from(Span::styled(divider, Styles::border()))).render(area, buf);
}

impl Widget for ChatWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Styles::border_active()
        } else {
            Styles::border()
        };

        Block::default()
            .title(" Chat ")
            .title_style(Styles::default())
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Styles::default())
            .render(area, buf);

        let areas = ChatAreas::split(area);

        if areas.transcript.height > 0 {
            Transcript::new(self.state.log())
                .scroll(self.scroll)
                .render(areas.transcript, buf);
        }
        render_divider(areas.divider, buf);
        DraftInput::new(self.state.draft())
            .placeholder(PLACEHOLDER)
            .focused(self.focused)
            .render(areas.input, buf);
    }
}
