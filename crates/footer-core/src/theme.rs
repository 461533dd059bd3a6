//! ThemeController: decides whether an incoming theme value warrants a
//! re-render.  The theme itself is an opaque string; only the adapter knows
//! what it looks like.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChange {
    /// Same value as before; nothing to do.
    Unchanged,
    /// New value; re-render the shell and restart the animations.
    Changed,
}

#[derive(Debug, Default)]
pub struct ThemeController {
    current: Option<String>,
    /// Number of structural re-renders so far.
    epoch: u64,
}

impl ThemeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn apply(&mut self, theme: &str) -> ThemeChange {
        if self.current.as_deref() == Some(theme) {
            return ThemeChange::Unchanged;
        }
        self.current = Some(theme.to_string());
        self.epoch += 1;
        ThemeChange::Changed
    }
}
