//! mentor-tui: Terminal chat page for the mentor chat client
//!
//! This crate provides the interactive layer, including:
//! - The chat page (header, transcript, draft input, status bar)
//! - Key handling and the event loop
//! - Headless mode for testing and automation

mod app;
mod event;
pub mod headless;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod ui;

use screens::Screen as ScreenTrait;

pub use app::App;
pub use event::{key_to_action, Action, Event, EventHandler};
pub use mentor_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mentor_engine::{ChatSession, Config, Outcome};
use ratatui::{backend::CrosstermBackend, buffer::Buffer, layout::Rect, Terminal};
use std::io::{self, stdout};
use tracing::{debug, info};

/// Tick rate of the event thread (4 Hz).
const TICK_RATE_MS: u64 = 250;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Draw the whole page for `app`.
pub(crate) fn render_page(app: &App, area: Rect, buf: &mut Buffer) {
    screens::chat::ChatScreen.render(app, area, buf);
    if app.show_help {
        screens::render_help_overlay(area, buf);
    }
}

/// Run the chat page until the user quits.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on
/// exit. Requests still in flight when the page closes are abandoned.
pub async fn run_tui(config: &Config, session: ChatSession) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(session = %session.id(), endpoint = %config.endpoint, "chat page opened");
    let mut app = App::new(config, session);
    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    info!(
        turns = app.session.log().len(),
        abandoned = app.session.in_flight(),
        "chat page closed"
    );
    terminal.show_cursor()?;

    result
}

/// What woke the loop.
enum Step {
    Event(Option<Event>),
    Completion(Option<Outcome>),
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| {
            app.set_viewport(frame.area());
            render_page(app, frame.area(), frame.buffer_mut());
        })?;

        let waiting = app.session.in_flight() > 0;
        let step = tokio::select! {
            event = events.next() => Step::Event(event),
            outcome = app.next_completion(), if waiting => Step::Completion(outcome),
        };

        match step {
            Step::Event(None) => break,
            Step::Event(Some(event)) => handle_event(app, event),
            Step::Completion(outcome) => debug!(?outcome, "request resolved"),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => {
            if key.kind == KeyEventKind::Press {
                app.handle_action(key_to_action(key));
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.scroll_up(1),
            MouseEventKind::ScrollDown => app.scroll_down(1),
            _ => {}
        },
        // The next draw picks up any resize.
        Event::Tick | Event::Resize(_, _) => {}
    }
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{buffer_to_string, create_test_app, TEST_HEIGHT, TEST_WIDTH};

    fn render(app: &App) -> String {
        let area = Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT);
        let mut buf = Buffer::empty(area);
        render_page(app, area, &mut buf);
        buffer_to_string(&buf)
    }

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }

    #[tokio::test]
    async fn test_render_page_is_idempotent() {
        let mut app = create_test_app();
        app.session.set_draft("Hi");
        app.session.submit();
        app.session.set_draft("draft in progress");

        let first = render(&app);
        let second = render(&app);
        assert_eq!(first, second);
        assert_eq!(app.session.log().len(), 1);
        assert_eq!(app.session.draft().text(), "draft in progress");
    }

    #[test]
    fn test_help_overlay_drawn_over_page() {
        let mut app = create_test_app();
        let plain = render(&app);
        assert!(!plain.contains("Send message"));

        app.show_help = true;
        let with_help = render(&app);
        assert!(with_help.contains("Send message"));
        assert!(with_help.contains("Toggle this help"));
    }

    #[test]
    fn test_mouse_wheel_scrolls_one_line() {
        use crossterm::event::{KeyModifiers, MouseEvent};

        let mut app = create_test_app();
        app.scroll = 5;
        handle_event(
            &mut app,
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::ScrollDown,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            }),
        );
        assert_eq!(app.scroll, 4);
    }

    #[test]
    fn test_tick_leaves_page_unchanged() {
        let mut app = create_test_app();
        app.session.set_draft("typing");
        let before = render(&app);

        handle_event(&mut app, Event::Tick);
        assert_eq!(render(&app), before);
        assert_eq!(app.session.draft().text(), "typing");
    }

    #[test]
    fn test_key_release_ignored() {
        use crossterm::event::{KeyCode, KeyEvent, KeyEventState, KeyModifiers};

        let mut app = create_test_app();
        let release = KeyEvent {
            code: KeyCode::Char('x'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_event(&mut app, Event::Key(release));
        assert!(app.session.draft().is_empty());

        handle_event(&mut app, Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));
        assert_eq!(app.session.draft().text(), "x");
    }
}
