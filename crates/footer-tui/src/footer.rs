//! Footer rendering: turns a [`FooterSnapshot`] into one row of terminal
//! cells:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ owner │ Twitter              │ > new post https://…  •  > another…   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::time::Instant;
use unicode_width::UnicodeWidthStr;

use footer_core::model::LinkItem;
use footer_core::rotation::SlotPhase;
use footer_core::ticker::{scroll_offset, Segment};
use footer_core::{ContactView, FooterSnapshot, RegionView, TickerView};

use crate::theme::Palette;

pub const FOOTER_HEIGHT: u16 = 3;

const LOADING_CONTACT: &str = "LOADING CONTACT DATA";
const LOADING_BLOG: &str = "LOADING BLOG DATA";
const CONTACT_ERROR: &str = "SYSTEM ERROR: CONTACT DATA NOT FOUND";
const BLOG_ERROR: &str = "SYSTEM ERROR: BLOG DATA NOT FOUND";
const ENTRY_PROMPT: &str = "> ";
const ENTRY_SEPARATOR: &str = "  •  ";

/// Everything a frame needs besides the snapshot itself.
pub struct FooterFrame<'a> {
    pub snapshot: &'a FooterSnapshot,
    pub owner: &'a str,
    pub now: Instant,
    /// Cursor phase for the loading indicators.
    pub blink_on: bool,
}

impl FooterFrame<'_> {
    pub fn palette(&self) -> Palette {
        Palette::named(self.snapshot.theme.as_deref().unwrap_or_default())
    }
}

/// The link a reader should consider current: newest slot not fading out.
pub fn active_link(snapshot: &FooterSnapshot) -> Option<&LinkItem> {
    let view = snapshot.contact.ready()?;
    view.slots
        .iter()
        .rev()
        .find(|s| s.phase != SlotPhase::Outgoing)
        .or_else(|| view.slots.last())
        .map(|s| &s.link)
}

pub fn draw(frame: &mut Frame, area: Rect, view: &FooterFrame) {
    let palette = view.palette();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border())
        .style(palette.text());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let owner_width = padded_width(view.owner.width());
    let link_width = contact_width(&view.snapshot.contact);
    let mut constraints = vec![Constraint::Length(owner_width), Constraint::Length(link_width)];
    if view.snapshot.ticker.is_some() {
        constraints.push(Constraint::Min(1));
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner);

    let owner = Line::from(vec![
        Span::styled(format!(" {}", view.owner), palette.owner()),
        Span::styled(" │", palette.dim()),
    ]);
    frame.render_widget(Paragraph::new(owner), chunks[0]);

    frame.render_widget(
        Paragraph::new(contact_line(&view.snapshot.contact, &palette, view.blink_on)),
        chunks[1],
    );

    if let (Some(ticker), Some(area)) = (&view.snapshot.ticker, chunks.get(2)) {
        draw_ticker(frame, *area, ticker, &palette, view);
    }
}

// ── Contact region ────────────────────────────────────────────────────────────

fn contact_width(region: &RegionView<ContactView>) -> u16 {
    let text = match region {
        RegionView::Loading => LOADING_CONTACT.width() + 1,
        RegionView::Unavailable => CONTACT_ERROR.width(),
        RegionView::Ready(view) => view
            .slots
            .iter()
            .map(|s| s.link.label.width())
            .max()
            .unwrap_or(0)
            .max(12),
    };
    padded_width(text)
}

/// Cell width plus the leading space and the ` │` divider.
fn padded_width(text: usize) -> u16 {
    u16::try_from(text).unwrap_or(u16::MAX).saturating_add(3)
}

fn contact_line(region: &RegionView<ContactView>, palette: &Palette, blink_on: bool) -> Line<'static> {
    match region {
        RegionView::Loading => loading_line(LOADING_CONTACT, palette, blink_on),
        RegionView::Unavailable => Line::from(Span::styled(format!(" {CONTACT_ERROR}"), palette.error())),
        RegionView::Ready(view) => {
            let shown = view
                .slots
                .iter()
                .rev()
                .find(|s| s.phase != SlotPhase::Outgoing)
                .or_else(|| view.slots.last());
            match shown {
                // Mid-crossfade: drawn dimmed until it settles.
                Some(slot) if slot.phase != SlotPhase::Active => {
                    Line::from(Span::styled(format!(" {}", slot.link.label), palette.dim()))
                }
                Some(slot) => Line::from(vec![
                    Span::raw(" "),
                    Span::styled(slot.link.label.clone(), palette.link()),
                ]),
                None => Line::default(),
            }
        }
    }
}

fn loading_line(label: &str, palette: &Palette, blink_on: bool) -> Line<'static> {
    let cursor = if blink_on { "_" } else { " " };
    Line::from(vec![
        Span::styled(format!(" {label}"), palette.text()),
        Span::styled(cursor, palette.text()),
    ])
}

// ── Ticker region ─────────────────────────────────────────────────────────────

fn draw_ticker(
    frame: &mut Frame,
    area: Rect,
    region: &RegionView<TickerView>,
    palette: &Palette,
    view: &FooterFrame,
) {
    let ticker = match region {
        RegionView::Loading => {
            frame.render_widget(Paragraph::new(loading_line(LOADING_BLOG, palette, view.blink_on)), area);
            return;
        }
        RegionView::Unavailable => {
            let line = Line::from(Span::styled(format!(" {BLOG_ERROR}"), palette.error()));
            frame.render_widget(Paragraph::new(line), area);
            return;
        }
        RegionView::Ready(ticker) => ticker,
    };

    let line = ticker_line(ticker, palette);
    let content_width = line.width().min(u16::MAX as usize) as u16;
    let offset = scroll_offset(ticker.progress(view.now), area.width, content_width);

    // Positive offset: content starts inside the viewport.  Negative: the
    // first `-offset` columns have scrolled off the left edge.
    let (target, skip) = if offset >= 0 {
        let shift = (offset as u16).min(area.width);
        (
            Rect {
                x: area.x + shift,
                width: area.width - shift,
                ..area
            },
            0,
        )
    } else {
        (area, (-offset).min(u16::MAX as i32) as u16)
    };
    if target.width == 0 {
        return;
    }
    frame.render_widget(Paragraph::new(line).scroll((0, skip)), target);
}

pub fn ticker_line(ticker: &TickerView, palette: &Palette) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, entry) in ticker.pass.entries.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(ENTRY_SEPARATOR, palette.dim()));
        }
        spans.push(Span::styled(ENTRY_PROMPT, palette.dim()));
        for segment in &entry.segments {
            spans.push(match segment {
                Segment::Text(text) => Span::styled(text.clone(), palette.text()),
                Segment::Link(url) => Span::styled(url.clone(), palette.link()),
            });
        }
    }
    Line::from(spans)
}
