//! Core of the contact footer: loading, carousel, marquee, theme handling.
//! Rendering lives in the adapter crate and only ever sees [`FooterSnapshot`].

pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod model;
pub mod platform;
pub mod rotation;
pub mod schedule;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod theme;
pub mod ticker;

pub use controller::{WidgetCommand, WidgetController, WidgetHandle};
pub use error::{LoadError, WidgetClosed};
pub use loader::{DataLoader, DocumentSource, HttpSource, LoadStrategy, RetryPolicy};
pub use state::{ContactView, FooterSnapshot, RegionView, TickerView};
