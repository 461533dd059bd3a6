//! App: terminal event loop around one footer widget.
//!
//! - Keyboard events arrive from a blocking reader task.
//! - Snapshots arrive from the controller's watch channel.
//! - A 100ms frame tick keeps the marquee and the cursor blink moving.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use footer_core::{FooterSnapshot, WidgetHandle};

use crate::footer::{self, FooterFrame, FOOTER_HEIGHT};
use crate::status::StatusLine;
use crate::theme::Palette;

const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const BLINK_PERIOD_MS: u128 = 500;
const KEY_HINT: &str = "t theme · y copy link · q quit";

#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Snapshot(FooterSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CycleTheme,
    CopyLink,
    Quit,
    Noop,
}

pub fn key_action(key: KeyEvent) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::Noop;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('t') => Action::CycleTheme,
        KeyCode::Char('y') => Action::CopyLink,
        _ => Action::Noop,
    }
}

pub struct App {
    handle: WidgetHandle,
    owner: String,
    snapshot: FooterSnapshot,
    status: StatusLine,
    started: Instant,
    should_quit: bool,
}

impl App {
    pub fn new(handle: WidgetHandle, owner: String) -> Self {
        let snapshot = handle.snapshot();
        Self {
            handle,
            owner,
            snapshot,
            status: StatusLine::new(),
            started: Instant::now(),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("terminal ready, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: widget snapshots ─────────────────────────────────
        let snap_tx = tx.clone();
        let mut snapshots = self.handle.subscribe();
        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snap = snapshots.borrow_and_update().clone();
                if snap_tx.send(AppMessage::Snapshot(snap)).await.is_err() {
                    break;
                }
            }
        });

        let mut frame_tick = tokio::time::interval(FRAME_INTERVAL);
        frame_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;
            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => self.handle_message(msg).await,
                _ = frame_tick.tick() => self.status.tick(),
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => self.dispatch(key_action(key)).await,
            AppMessage::Event(_) => {}
            AppMessage::Snapshot(snap) => self.snapshot = snap,
        }
    }

    async fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::CycleTheme => {
                let next = Palette::next_name(self.handle.theme().as_deref());
                info!("switching theme to {}", next);
                if let Err(e) = self.handle.set_theme(next).await {
                    warn!("theme change dropped: {}", e);
                    self.status.error(e.to_string());
                }
            }
            Action::CopyLink => self.copy_active_link(),
            Action::Noop => {}
        }
    }

    fn copy_active_link(&mut self) {
        let Some(link) = footer::active_link(&self.snapshot) else {
            self.status.error("no link to copy yet");
            return;
        };
        let url = link.url.clone();
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url.clone())) {
            Ok(()) => {
                let display = if url.chars().count() > 40 {
                    format!("{}…", url.chars().take(40).collect::<String>())
                } else {
                    url
                };
                self.status.success(format!("copied: {}", display));
            }
            Err(e) => {
                warn!("clipboard error: {}", e);
                self.status.error(format!("clipboard error: {}", e));
            }
        }
    }

    fn blink_on(&self, now: Instant) -> bool {
        (now.duration_since(self.started).as_millis() / BLINK_PERIOD_MS) % 2 == 0
    }

    pub fn draw(&self, frame: &mut Frame) {
        let now = Instant::now();
        let view = FooterFrame {
            snapshot: &self.snapshot,
            owner: &self.owner,
            now,
            blink_on: self.blink_on(now),
        };
        let palette = view.palette();
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(palette.bg)), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.status.draw(frame, chunks[1], &palette, KEY_HINT);
        footer::draw(frame, chunks[2], &view);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use footer_core::testing::MemorySource;
    use footer_core::{DataLoader, LoadStrategy, WidgetController};

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_action(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(key_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_action(key(KeyCode::Char('t'))), Action::CycleTheme);
        assert_eq!(key_action(key(KeyCode::Char('y'))), Action::CopyLink);
        assert_eq!(key_action(key(KeyCode::Char('x'))), Action::Noop);

        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(key_action(release), Action::Noop);
    }

    #[tokio::test]
    async fn cycle_theme_reaches_the_controller() {
        let source = MemorySource::new();
        source.respond_body("contact.json", r#"{"email":"a@b.com"}"#);
        source.respond_body("blog.json", r#"{"entries":[]}"#);
        let (handle, join) = WidgetController::spawn(
            DataLoader::new(source, "contact.json", "blog.json"),
            LoadStrategy::FailFast,
            Some("green"),
        );

        let mut app = App::new(handle.clone(), "guest@footer".into());
        app.dispatch(Action::CycleTheme).await;

        let mut rx = handle.subscribe();
        let snap = rx
            .wait_for(|s| s.theme.as_deref() == Some("amber"))
            .await
            .unwrap()
            .clone();
        app.handle_message(AppMessage::Snapshot(snap)).await;

        let mut terminal = Terminal::new(TestBackend::new(80, 6)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let row: String = (0..buffer.area.width)
            .map(|x| buffer[(x, 4)].symbol().to_string())
            .collect();
        assert!(row.contains("guest@footer"), "{row}");

        app.dispatch(Action::Quit).await;
        assert!(app.should_quit);

        handle.shutdown().await;
        join.await.unwrap();
    }
}
