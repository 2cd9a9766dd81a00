//! Chat screen: header, conversation, and status bar.

use crate::app::App;
use crate::screens::Screen;
use crate::ui::theme::Styles;
use crate::ui::widgets::chat::ChatAreas;
use crate::ui::widgets::{ChatWidget, KeyHint, StatusBar};
use crate::ui::page_layout;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

const HINTS: &[KeyHint] = &[
    KeyHint::new("Enter", "Send"),
    KeyHint::new("PgUp/PgDn", "Scroll"),
    KeyHint::new("F1", "Help"),
];

/// Area the transcript occupies when the page fills `area`.
pub fn transcript_area(area: Rect) -> Rect {
    let (_, body, _) = page_layout(area);
    ChatAreas::split(body).transcript
}

/// The chat screen.
pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header_area, body_area, status_area) = page_layout(area);

        render_header(app, header_area, buf);

        ChatWidget::new(app.session.state())
            .scroll(app.scroll)
            .focused(!app.show_help)
            .render(body_area, buf);

        let status_text = app.status_text();
        StatusBar::new("CHAT")
            .hints(HINTS)
            .right(&status_text)
            .render(status_area, buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(app.title.as_str(), Styles::title())),
        Line::from(Span::styled(app.subtitle.as_str(), Styles::dim())),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Styles::default())
        .render(area, buf);
}
