//! One-line transient status message (copy confirmations, clipboard errors).

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Success,
    Error,
}

struct Message {
    text: String,
    severity: Severity,
    expires: Instant,
}

#[derive(Default)]
pub struct StatusLine {
    current: Option<Message>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, severity: Severity, duration: Duration) {
        self.current = Some(Message {
            text: text.into(),
            severity,
            expires: Instant::now() + duration,
        });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(text, Severity::Success, Duration::from_secs(3));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text, Severity::Error, Duration::from_secs(5));
    }

    /// Drop the message once expired.  Call each tick.
    pub fn tick(&mut self) {
        if self.current.as_ref().is_some_and(|m| m.expires <= Instant::now()) {
            self.current = None;
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|m| m.text.as_str())
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette, hint: &str) {
        let line = match &self.current {
            Some(msg) => {
                let (icon, style) = match msg.severity {
                    Severity::Success => ("✓", palette.text()),
                    Severity::Error => ("✗", palette.error()),
                };
                Line::from(Span::styled(
                    format!(" {} {}", icon, msg.text),
                    style.add_modifier(Modifier::BOLD),
                ))
            }
            None => Line::from(Span::styled(
                format!(" {hint}"),
                Style::default().fg(palette.dim).bg(palette.bg),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
