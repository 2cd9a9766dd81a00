//! Test utilities for mentor-tui snapshot and integration testing.

use crate::app::App;
pub use crate::headless::buffer_to_string;
use crate::screens::Screen as ScreenTrait;
use mentor_engine::{ChatSession, Config, HttpChatService};
use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, Terminal};
use std::sync::Arc;
use std::time::Duration;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Endpoint nothing listens on.
pub const CLOSED_ENDPOINT: &str = "http://127.0.0.1:9";

/// Create a test terminal with the default dimensions (80x24).
pub fn create_test_terminal() -> Terminal<TestBackend> {
    create_test_terminal_sized(TEST_WIDTH, TEST_HEIGHT)
}

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Create an app whose requests go to `endpoint`.
pub fn create_app_for(endpoint: &str) -> App {
    let config = Config {
        endpoint: endpoint.to_string(),
        ..Config::default()
    };
    let service = HttpChatService::new(endpoint, Some(Duration::from_secs(5)))
        .expect("test endpoint should parse");
    App::new(&config, ChatSession::new(Arc::new(service)))
}

/// Create a test app whose requests always fail to connect.
pub fn create_test_app() -> App {
    create_app_for(CLOSED_ENDPOINT)
}

/// Render a screen to a buffer and return it as a string.
pub fn render_screen_to_string<S: ScreenTrait>(screen: &S, app: &App) -> String {
    let area = Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT);
    let mut buffer = Buffer::empty(area);
    screen.render(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_terminal() {
        let terminal = create_test_terminal();
        let size = terminal.size().unwrap();
        assert_eq!(size.width, TEST_WIDTH);
        assert_eq!(size.height, TEST_HEIGHT);
    }

    #[test]
    fn test_create_test_app() {
        let app = create_test_app();
        assert_eq!(app.endpoint, CLOSED_ENDPOINT);
        assert!(app.session.log().is_empty());
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }
}
