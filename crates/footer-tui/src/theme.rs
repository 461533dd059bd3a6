//! Built-in footer palettes.  The core only sees the theme as a string; this
//! is where a name turns into colors.

use ratatui::style::{Color, Modifier, Style};

/// Cycle order for the `t` key.
pub const THEME_NAMES: [&str; 3] = ["green", "amber", "white"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub fg: Color,
    pub dim: Color,
    pub bg: Color,
    pub link: Color,
    pub error: Color,
}

// ── Palettes ──────────────────────────────────────────────────────────────────

/// Phosphor green, the default.
pub const GREEN: Palette = Palette {
    name: "green",
    fg: Color::Rgb(51, 255, 102),
    dim: Color::Rgb(22, 110, 48),
    bg: Color::Rgb(8, 16, 10),
    link: Color::Rgb(170, 255, 190),
    error: Color::Rgb(255, 80, 80),
};

pub const AMBER: Palette = Palette {
    name: "amber",
    fg: Color::Rgb(255, 176, 0),
    dim: Color::Rgb(130, 88, 0),
    bg: Color::Rgb(18, 12, 4),
    link: Color::Rgb(255, 214, 120),
    error: Color::Rgb(255, 80, 80),
};

pub const WHITE: Palette = Palette {
    name: "white",
    fg: Color::Rgb(215, 215, 225),
    dim: Color::Rgb(105, 105, 120),
    bg: Color::Rgb(16, 16, 18),
    link: Color::Rgb(255, 255, 255),
    error: Color::Rgb(255, 95, 95),
};

impl Palette {
    /// Unknown names fall back to green.
    pub fn named(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "amber" => AMBER,
            "white" => WHITE,
            _ => GREEN,
        }
    }

    pub fn next_name(current: Option<&str>) -> &'static str {
        let current = current.map(Self::named).unwrap_or(GREEN);
        let idx = THEME_NAMES
            .iter()
            .position(|n| *n == current.name)
            .unwrap_or(0);
        THEME_NAMES[(idx + 1) % THEME_NAMES.len()]
    }

    // ── Styles ────────────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn owner(&self) -> Style {
        self.text().add_modifier(Modifier::BOLD)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.dim).bg(self.bg)
    }

    pub fn link(&self) -> Style {
        Style::default()
            .fg(self.link)
            .bg(self.bg)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn error(&self) -> Style {
        Style::default()
            .fg(self.error)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.dim).bg(self.bg)
    }
}
