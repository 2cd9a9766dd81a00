//! Headless mode for the mentor TUI.
//!
//! Runs the chat page against a [`TestBackend`] instead of a real terminal.
//! Actions are sent over a channel and the rendered screen is published
//! after each draw, which makes end-to-end tests and scripted drivers
//! possible.

use crate::app::App;
use crate::event::Action;
use crate::render_page;
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default terminal dimensions for headless mode.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// State captured from the headless TUI after each render.
#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    /// Whether the TUI should quit.
    pub should_quit: bool,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Turns in the conversation log.
    pub turns: usize,
    /// Requests issued but not yet applied.
    pub in_flight: usize,
}

/// Handle to control a headless TUI instance.
pub struct HeadlessHandle {
    action_tx: mpsc::UnboundedSender<Action>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send an action to the TUI.
    ///
    /// Returns `true` if the action was sent successfully.
    pub fn send_action(&self, action: Action) -> bool {
        self.action_tx.send(action).is_ok()
    }

    /// Type `text` into the draft, one character at a time.
    pub fn type_text(&self, text: &str) -> bool {
        text.chars().all(|ch| self.send_action(Action::Insert(ch)))
    }

    /// Get the current state of the TUI.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a condition is met on the state.
    ///
    /// Returns the state when the condition is met, or `None` if timed out.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.state();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match tokio::time::timeout(remaining, self.state_rx.changed()).await {
                Ok(Ok(())) => {}
                // Timed out, or the loop exited.
                _ => return None,
            }
        }
    }

    /// Wait for specific text to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        self.wait_for(|s| s.screen_contents.contains(text), timeout)
            .await
    }

    /// Check if the TUI has quit.
    pub fn has_quit(&self) -> bool {
        self.state().should_quit
    }
}

/// Configuration for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
    /// Tick rate in milliseconds.
    pub tick_rate_ms: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_rate_ms: 50,
        }
    }
}

/// Run the chat page in headless mode.
///
/// Returns a handle to control the page and a join handle for the
/// background task.
///
/// # Example
///
/// ```ignore
/// let (mut handle, task) = run_tui_headless(app, HeadlessConfig::default());
///
/// handle.type_text("Hi");
/// handle.send_action(Action::Submit);
/// handle.wait_for_text("Bot:", Duration::from_secs(5)).await;
///
/// handle.send_action(Action::Quit);
/// task.await.unwrap();
/// ```
pub fn run_tui_headless(
    app: App,
    config: HeadlessConfig,
) -> (HeadlessHandle, JoinHandle<Result<(), String>>) {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());

    let task = tokio::spawn(async move {
        run_headless_loop(app, config, action_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    let handle = HeadlessHandle {
        action_tx,
        state_rx,
    };

    (handle, task)
}

async fn run_headless_loop(
    mut app: App,
    config: HeadlessConfig,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let backend = TestBackend::new(config.width, config.height);
    let mut terminal = Terminal::new(backend)?;
    let tick_duration = Duration::from_millis(config.tick_rate_ms);

    loop {
        app.poll_completions();

        terminal.draw(|frame| {
            app.set_viewport(frame.area());
            render_page(&app, frame.area(), frame.buffer_mut());
        })?;

        let _ = state_tx.send(HeadlessState {
            screen_contents: buffer_to_string(terminal.backend().buffer()),
            should_quit: app.should_quit,
            show_help: app.show_help,
            turns: app.session.log().len(),
            in_flight: app.session.in_flight(),
        });

        if app.should_quit {
            break;
        }

        let action = tokio::select! {
            received = action_rx.recv() => received,
            () = tokio::time::sleep(tick_duration) => Some(Action::None),
        };
        // Every handle is gone; nobody can drive or observe the page.
        let Some(action) = action else {
            break;
        };

        if action != Action::None {
            app.handle_action(action);
        }
    }

    Ok(())
}

/// Convert a terminal buffer to text, trimming trailing spaces per row.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_app_for, create_test_app};

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_headless_config_default() {
        let config = HeadlessConfig::default();
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.tick_rate_ms, 50);
    }

    #[tokio::test]
    async fn test_loop_ends_when_handle_dropped() {
        let (handle, task) = run_tui_headless(create_test_app(), HeadlessConfig::default());
        drop(handle);

        let finished = tokio::time::timeout(WAIT, task).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_send_and_receive_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::JsonString(r#"{"message":"Hi"}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Hello!"}"#)
            .create_async()
            .await;

        let (mut handle, task) =
            run_tui_headless(create_app_for(&server.url()), HeadlessConfig::default());

        handle.wait_for_text("No messages yet.", WAIT).await.unwrap();
        assert!(handle.type_text("Hi"));
        assert!(handle.send_action(Action::Submit));

        let state = handle.wait_for_text("Bot: Hello!", WAIT).await.unwrap();
        assert_eq!(state.turns, 2);
        assert_eq!(state.in_flight, 0);
        assert!(state.screen_contents.contains("│Hi"));
        assert!(state.screen_contents.contains("> _Ask a cybersecurity question..."));
        mock.assert_async().await;

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
        assert!(handle.has_quit());
    }

    #[tokio::test]
    async fn test_failed_reply_changes_nothing_on_screen() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let (mut handle, task) =
            run_tui_headless(create_app_for(&server.url()), HeadlessConfig::default());

        handle.type_text("Hi");
        handle.send_action(Action::Submit);

        let state = handle
            .wait_for(|s| s.turns == 1 && s.in_flight == 0, WAIT)
            .await
            .unwrap();
        assert!(!state.screen_contents.contains("Bot:"));
        assert!(!state.screen_contents.contains("boom"));
        // The draft is not restored.
        assert!(state.screen_contents.contains("> _Ask a cybersecurity question..."));

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_help_overlay() {
        let (mut handle, task) =
            run_tui_headless(create_app_for("http://127.0.0.1:9"), HeadlessConfig::default());

        handle.send_action(Action::Help);
        let state = handle.wait_for_text("Send message", WAIT).await.unwrap();
        assert!(state.show_help);

        handle.send_action(Action::Back);
        let state = handle.wait_for(|s| !s.show_help, WAIT).await.unwrap();
        assert!(!state.should_quit);

        handle.send_action(Action::Back);
        task.await.unwrap().unwrap();
        assert!(handle.has_quit());
    }
}
