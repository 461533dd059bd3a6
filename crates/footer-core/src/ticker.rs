//! TickerEngine: the blog marquee.
//!
//! A *pass* is one left-scrolling run of every feed entry.  Its duration grows
//! with the amount of text (`max(30s, len / 50 * 15s)`).  When a pass ends the
//! engine rebuilds it from the same feed and starts over, so the sequence of
//! passes never ends.  Each pass has a generation number; completion signals
//! for an older generation are stale and ignored.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use unicode_width::UnicodeWidthStr;

use crate::model::FeedData;

/// Floor for a pass, in seconds.
pub const MIN_PASS_SECS: f64 = 30.0;
/// Characters per `SECS_PER_CHUNK` of scrolling.
pub const CHARS_PER_CHUNK: f64 = 50.0;
pub const SECS_PER_CHUNK: f64 = 15.0;
/// Blank columns after the last entry before a pass counts as finished.
pub const TICKER_GAP: u16 = 3;

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://\S+").expect("static regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// A bare URL from the entry text; label and target are the same string.
    Link(String),
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Link(s) => s,
        }
    }
}

/// One feed entry split into plain text and links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub segments: Vec<Segment>,
}

impl RenderedEntry {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for m in url_pattern().find_iter(text) {
            if m.start() > last {
                segments.push(Segment::Text(text[last..m.start()].to_string()));
            }
            segments.push(Segment::Link(m.as_str().to_string()));
            last = m.end();
        }
        if last < text.len() {
            segments.push(Segment::Text(text[last..].to_string()));
        }
        Self { segments }
    }

    pub fn plain_text(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Link(url) => Some(url.as_str()),
            Segment::Text(_) => None,
        })
    }
}

/// One full marquee run.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerPass {
    pub entries: Vec<RenderedEntry>,
    /// Length of the rendered text across all entries, in UTF-16 code units.
    pub rendered_len: usize,
    pub duration: Duration,
}

impl TickerPass {
    pub fn build(feed: &FeedData) -> Self {
        let entries: Vec<RenderedEntry> = feed
            .entries
            .iter()
            .map(|e| RenderedEntry::parse(&e.text))
            .collect();
        let rendered_len = entries
            .iter()
            .flat_map(|e| e.segments.iter())
            .map(|s| s.as_str().encode_utf16().count())
            .sum();
        Self {
            entries,
            rendered_len,
            duration: scroll_duration(rendered_len),
        }
    }

    /// Terminal columns of the bare entry text (no decoration).
    pub fn text_width(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.segments.iter())
            .map(|s| s.as_str().width())
            .sum()
    }
}

/// `max(30, len / 50 * 15)` seconds.
pub fn scroll_duration(rendered_len: usize) -> Duration {
    let secs = (rendered_len as f64 / CHARS_PER_CHUNK * SECS_PER_CHUNK).max(MIN_PASS_SECS);
    Duration::from_secs_f64(secs)
}

/// Column of the content's left edge relative to the viewport's left edge.
///
/// At `progress == 0` the content sits just past the right edge; at
/// `progress == 1` its last column plus [`TICKER_GAP`] has left on the left.
pub fn scroll_offset(progress: f64, viewport_width: u16, content_width: u16) -> i32 {
    let progress = progress.clamp(0.0, 1.0);
    let travel = viewport_width as f64 + content_width as f64 + TICKER_GAP as f64;
    (viewport_width as f64 - progress * travel).floor() as i32
}

/// Handed to the controller so it can schedule the end of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassTicket {
    pub generation: u64,
    pub duration: Duration,
}

#[derive(Debug, Default)]
pub struct TickerEngine {
    pass: Option<Arc<TickerPass>>,
    generation: u64,
    started_at: Option<Instant>,
    completed: u64,
}

impl TickerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(&self) -> Option<&Arc<TickerPass>> {
        self.pass.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Passes that ran to completion since the last [`start`](Self::start).
    pub fn completed_passes(&self) -> u64 {
        self.completed
    }

    pub fn is_running(&self) -> bool {
        self.pass.is_some()
    }

    /// Discard whatever is in flight and begin a fresh pass.
    pub fn start(&mut self, feed: &FeedData, now: Instant) -> PassTicket {
        self.completed = 0;
        self.begin(feed, now)
    }

    /// A pass ended.  Rebuilds and returns the next ticket, or `None` if the
    /// signal belongs to a discarded generation.
    pub fn complete(&mut self, generation: u64, feed: &FeedData, now: Instant) -> Option<PassTicket> {
        if self.pass.is_none() || generation != self.generation {
            return None;
        }
        self.completed += 1;
        Some(self.begin(feed, now))
    }

    pub fn stop(&mut self) {
        self.pass = None;
        self.started_at = None;
        self.generation += 1;
    }

    /// Fraction of the current pass elapsed at `now`, in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f64 {
        match (&self.pass, self.started_at) {
            (Some(pass), Some(start)) => progress_at(pass.duration, start, now),
            _ => 0.0,
        }
    }

    fn begin(&mut self, feed: &FeedData, now: Instant) -> PassTicket {
        self.generation += 1;
        let pass = TickerPass::build(feed);
        let ticket = PassTicket {
            generation: self.generation,
            duration: pass.duration,
        };
        self.pass = Some(Arc::new(pass));
        self.started_at = Some(now);
        ticket
    }
}

pub fn progress_at(duration: Duration, started_at: Instant, now: Instant) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started_at);
    (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeedEntry;

    fn feed(texts: &[&str]) -> FeedData {
        FeedData {
            entries: texts
                .iter()
                .map(|t| FeedEntry {
                    text: t.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn duration_has_a_thirty_second_floor() {
        assert_eq!(scroll_duration(0), Duration::from_secs(30));
        assert_eq!(scroll_duration(100), Duration::from_secs(30));
        assert!(scroll_duration(110) > Duration::from_secs(30));
        assert_eq!(scroll_duration(200), Duration::from_secs(60));
    }

    #[test]
    fn five_hundred_chars_scroll_for_150s() {
        let text = "x".repeat(250);
        let pass = TickerPass::build(&feed(&[&text, &text]));
        assert_eq!(pass.rendered_len, 500);
        assert_eq!(pass.duration, Duration::from_secs(150));
    }

    #[test]
    fn duration_is_monotonic_in_length() {
        let mut prev = Duration::ZERO;
        for len in (0..2000).step_by(7) {
            let d = scroll_duration(len);
            assert!(d >= prev, "len {len}");
            prev = d;
        }
    }

    #[test]
    fn urls_become_links_with_literal_text() {
        let entry = RenderedEntry::parse("new post https://blog.example/a-b?c=1 and http://x.y/z");
        assert_eq!(
            entry.segments,
            vec![
                Segment::Text("new post ".into()),
                Segment::Link("https://blog.example/a-b?c=1".into()),
                Segment::Text(" and ".into()),
                Segment::Link("http://x.y/z".into()),
            ]
        );
        assert_eq!(entry.plain_text(), "new post https://blog.example/a-b?c=1 and http://x.y/z");
        assert_eq!(entry.links().count(), 2);
    }

    #[test]
    fn text_without_urls_is_one_segment() {
        let entry = RenderedEntry::parse("ftp://not-a-link here");
        assert_eq!(entry.segments, vec![Segment::Text("ftp://not-a-link here".into())]);
        assert!(RenderedEntry::parse("").segments.is_empty());
    }

    #[test]
    fn rendered_len_counts_utf16_units_not_bytes() {
        let pass = TickerPass::build(&feed(&["héllo", "wörld"]));
        assert_eq!(pass.rendered_len, 10);
        assert_eq!(pass.text_width(), 10);

        // Outside the BMP: one char, a surrogate pair.
        let pass = TickerPass::build(&feed(&["🚀"]));
        assert_eq!(pass.rendered_len, 2);
        assert_eq!(pass.text_width(), 2);
    }

    #[test]
    fn offset_runs_from_right_edge_past_left_edge() {
        assert_eq!(scroll_offset(0.0, 80, 40), 80);
        assert_eq!(scroll_offset(1.0, 80, 40), -43);
        assert_eq!(scroll_offset(2.0, 80, 40), -43);
        assert!(scroll_offset(0.5, 80, 40) < 80);
    }

    #[test]
    fn completion_rebuilds_and_bumps_generation() {
        let data = feed(&["hello"]);
        let now = Instant::now();
        let mut engine = TickerEngine::new();

        let first = engine.start(&data, now);
        let second = engine.complete(first.generation, &data, now).unwrap();
        assert!(second.generation > first.generation);
        assert_eq!(engine.completed_passes(), 1);

        // The old ticket is stale now.
        assert!(engine.complete(first.generation, &data, now).is_none());
        assert_eq!(engine.completed_passes(), 1);
    }

    #[test]
    fn restart_discards_in_flight_pass() {
        let data = feed(&["hello"]);
        let now = Instant::now();
        let mut engine = TickerEngine::new();

        let first = engine.start(&data, now);
        let restarted = engine.start(&data, now);
        assert_ne!(first.generation, restarted.generation);
        assert!(engine.complete(first.generation, &data, now).is_none());
        assert!(engine.complete(restarted.generation, &data, now).is_some());
    }

    #[test]
    fn stop_invalidates_tickets() {
        let data = feed(&["hello"]);
        let mut engine = TickerEngine::new();
        let ticket = engine.start(&data, Instant::now());
        engine.stop();
        assert!(!engine.is_running());
        assert!(engine.complete(ticket.generation, &data, Instant::now()).is_none());
    }

    #[test]
    fn progress_is_clamped() {
        let start = Instant::now();
        let d = Duration::from_secs(30);
        assert_eq!(progress_at(d, start, start), 0.0);
        assert_eq!(progress_at(d, start, start + Duration::from_secs(15)), 0.5);
        assert_eq!(progress_at(d, start, start + Duration::from_secs(90)), 1.0);
    }
}
