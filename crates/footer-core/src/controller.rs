//! WidgetController: owns one footer's state and every timer it runs.
//!
//! ```text
//!   WidgetHandle ──cmd──▶ ┌──────────────────┐ ──watch──▶ FooterSnapshot
//!                         │ WidgetController │
//!   timers / fetches ───▶ └──────────────────┘
//!          ▲ events              │ schedules
//!          └─────────────────────┘
//! ```
//!
//! All mutation happens on the controller task.  Fetches and timers are
//! spawned as [`ScheduledTask`]s that post an event back; dropping the task
//! aborts it, so a restart or teardown never leaves anything running.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{LoadError, WidgetClosed};
use crate::loader::{DataLoader, DocumentSource, LoadStrategy};
use crate::model::{ContactData, FeedData};
use crate::rotation::{SlotId, CROSSFADE, ROTATION_PERIOD, SETTLE_DELAY};
use crate::schedule::ScheduledTask;
use crate::state::{FooterSnapshot, LoadState, WidgetState};
use crate::theme::ThemeChange;

const CHANNEL_CAPACITY: usize = 64;

/// Requests from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetCommand {
    SetTheme(String),
    Shutdown,
}

#[derive(Debug)]
enum ControllerEvent {
    /// Result of one contact-only attempt (retry strategy).
    ContactAttempt(Result<ContactData, LoadError>),
    /// Result of the parallel contact + feed load (fail-fast strategy).
    CombinedLoad(Result<(ContactData, FeedData), LoadError>),
    RetryDue,
    /// Carries the rotation cycle that scheduled it.
    RotationTick(u64),
    Settle(SlotId),
    Retire(SlotId),
    PassEnded(u64),
}

/// Cheap, cloneable front door to a running controller.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    cmd_tx: mpsc::Sender<WidgetCommand>,
    snapshot_rx: watch::Receiver<FooterSnapshot>,
    /// Last value requested through any clone of this handle.
    requested_theme: Arc<Mutex<Option<String>>>,
}

impl WidgetHandle {
    pub async fn set_theme(&self, theme: impl Into<String>) -> Result<(), WidgetClosed> {
        if self.cmd_tx.is_closed() {
            return Err(WidgetClosed);
        }
        let theme = theme.into();
        if let Ok(mut requested) = self.requested_theme.lock() {
            *requested = Some(theme.clone());
        }
        self.cmd_tx
            .send(WidgetCommand::SetTheme(theme))
            .await
            .map_err(|_| WidgetClosed)
    }

    /// The theme most recently requested, readable before the controller
    /// has re-rendered.  Falls back to the published snapshot.
    pub fn theme(&self) -> Option<String> {
        match self.requested_theme.lock() {
            Ok(requested) => requested.clone(),
            Err(_) => self.snapshot_rx.borrow().theme.clone(),
        }
    }

    pub fn snapshot(&self) -> FooterSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FooterSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Ask the controller to tear down.  Idempotent.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(WidgetCommand::Shutdown).await;
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }
}

pub struct WidgetController<S> {
    loader: DataLoader<S>,
    strategy: LoadStrategy,
    state: WidgetState,

    cmd_rx: mpsc::Receiver<WidgetCommand>,
    events_tx: mpsc::Sender<ControllerEvent>,
    events_rx: mpsc::Receiver<ControllerEvent>,
    snapshot_tx: watch::Sender<FooterSnapshot>,

    fetch: Option<ScheduledTask>,
    retry: Option<ScheduledTask>,
    rotation: Option<ScheduledTask>,
    crossfades: Vec<ScheduledTask>,
    pass: Option<ScheduledTask>,
    /// Bumped whenever the rotation cycle is replaced or stopped.
    rotation_cycle: u64,
}

impl<S: DocumentSource> WidgetController<S> {
    pub fn new(
        loader: DataLoader<S>,
        strategy: LoadStrategy,
        theme: Option<&str>,
    ) -> (Self, WidgetHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut state = WidgetState::new(strategy.has_feed());
        if let Some(theme) = theme {
            state.theme.apply(theme);
        }
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let requested_theme = Arc::new(Mutex::new(state.theme.current().map(str::to_string)));
        let controller = Self {
            loader,
            strategy,
            state,
            cmd_rx,
            events_tx,
            events_rx,
            snapshot_tx,
            fetch: None,
            retry: None,
            rotation: None,
            crossfades: Vec::new(),
            pass: None,
            rotation_cycle: 0,
        };
        let handle = WidgetHandle {
            cmd_tx,
            snapshot_rx,
            requested_theme,
        };
        (controller, handle)
    }

    /// Build a controller and run it on its own task.
    pub fn spawn(
        loader: DataLoader<S>,
        strategy: LoadStrategy,
        theme: Option<&str>,
    ) -> (WidgetHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(loader, strategy, theme);
        (handle, tokio::spawn(controller.run()))
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Load, then process events until shut down or every handle is gone.
    pub async fn run(mut self) {
        self.start();
        while self.step().await {}
        self.teardown();
    }

    /// Mount: publish the loading state and kick off the first load.
    pub fn start(&mut self) {
        info!("footer widget starting ({:?})", self.strategy);
        self.publish();
        self.begin_attempt();
    }

    /// Handle one command or event.  `false` once the widget should stop.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            cmd = self.cmd_rx.recv() => match cmd {
                Some(WidgetCommand::SetTheme(theme)) => {
                    self.set_theme(&theme);
                    true
                }
                Some(WidgetCommand::Shutdown) | None => false,
            },
            Some(event) = self.events_rx.recv() => {
                self.handle_event(event);
                true
            }
        }
    }

    /// Unmount: cancel every fetch and timer.
    pub fn teardown(&mut self) {
        self.fetch = None;
        self.retry = None;
        self.rotation = None;
        self.rotation_cycle += 1;
        self.crossfades.clear();
        self.pass = None;
        self.state.ticker.stop();
        self.state.rotation.clear();
        info!("footer widget torn down");
    }

    // ── Loading ─────────────────────────────────────────────────────────

    fn begin_attempt(&mut self) {
        let loader = self.loader.clone();
        let tx = self.events_tx.clone();
        debug!("load attempt {}", self.state.retry_count + 1);

        self.fetch = Some(match self.strategy {
            LoadStrategy::FailFast => ScheduledTask::spawn("fetch", async move {
                let result = loader.load_all().await;
                let _ = tx.send(ControllerEvent::CombinedLoad(result)).await;
            }),
            LoadStrategy::Retry(_) => ScheduledTask::spawn("fetch", async move {
                let result = loader.load_contact().await;
                let _ = tx.send(ControllerEvent::ContactAttempt(result)).await;
            }),
        });
    }

    fn on_combined_load(&mut self, result: Result<(ContactData, FeedData), LoadError>) {
        match result {
            Ok((contact, feed)) => {
                info!(
                    "footer data loaded: {} links, {} feed entries",
                    contact.links().len(),
                    feed.entries.len()
                );
                self.state.contact = LoadState::Ready(Arc::new(contact));
                self.state.feed = Some(LoadState::Ready(Arc::new(feed)));
                self.start_rotation();
                self.start_ticker();
            }
            Err(e) => {
                warn!("footer data unavailable: {}", e);
                self.state.contact = LoadState::Unavailable;
                self.state.feed = Some(LoadState::Unavailable);
            }
        }
        self.publish();
    }

    fn on_contact_attempt(&mut self, result: Result<ContactData, LoadError>) {
        let policy = match self.strategy {
            LoadStrategy::Retry(policy) => policy,
            LoadStrategy::FailFast => return,
        };
        match result {
            Ok(contact) => {
                info!(
                    "contact data loaded after {} retries: {} links",
                    self.state.retry_count,
                    contact.links().len()
                );
                self.state.contact = LoadState::Ready(Arc::new(contact));
                self.start_rotation();
            }
            Err(e) => match policy.next_retry(self.state.retry_count) {
                Some((count, delay)) => {
                    warn!("contact load failed ({}), retry {} in {:?}", e, count, delay);
                    self.state.retry_count = count;
                    self.retry = Some(ScheduledTask::after(
                        "retry",
                        delay,
                        self.events_tx.clone(),
                        ControllerEvent::RetryDue,
                    ));
                }
                None => {
                    warn!(
                        "contact data unavailable after {} retries: {}",
                        self.state.retry_count, e
                    );
                    self.state.contact = LoadState::Unavailable;
                }
            },
        }
        self.publish();
    }

    // ── Animations ──────────────────────────────────────────────────────

    /// Populate the carousel from the loaded contact data and (re)start its
    /// cycle.  Replacing the task aborts any previous cycle; a tick the old
    /// cycle already queued is dropped by its cycle id.
    fn start_rotation(&mut self) {
        let Some(contact) = self.state.contact_data().cloned() else {
            return;
        };
        self.state.rotation.set_contact(&contact);
        self.state.rotation.populate();
        self.crossfades.clear();
        self.rotation_cycle += 1;
        let cycle = self.rotation_cycle;
        self.rotation = Some(ScheduledTask::every(
            "rotation",
            ROTATION_PERIOD,
            self.events_tx.clone(),
            move || ControllerEvent::RotationTick(cycle),
        ));
    }

    fn start_ticker(&mut self) {
        let Some(feed) = self.state.feed_data().cloned() else {
            return;
        };
        let ticket = self.state.ticker.start(&feed, Instant::now());
        debug!(
            "ticker pass {} started, {:?}",
            ticket.generation, ticket.duration
        );
        self.schedule_pass_end(ticket.generation, ticket.duration);
    }

    fn schedule_pass_end(&mut self, generation: u64, duration: Duration) {
        self.pass = Some(ScheduledTask::after(
            "ticker-pass",
            duration,
            self.events_tx.clone(),
            ControllerEvent::PassEnded(generation),
        ));
    }

    fn on_rotation_tick(&mut self) {
        let Some(transition) = self.state.rotation.tick() else {
            return;
        };
        self.crossfades.retain(|t| !t.is_finished());
        self.crossfades.push(ScheduledTask::after(
            "settle",
            SETTLE_DELAY,
            self.events_tx.clone(),
            ControllerEvent::Settle(transition.incoming),
        ));
        for id in transition.outgoing {
            self.crossfades.push(ScheduledTask::after(
                "retire",
                CROSSFADE,
                self.events_tx.clone(),
                ControllerEvent::Retire(id),
            ));
        }
        self.publish();
    }

    fn on_pass_ended(&mut self, generation: u64) {
        let Some(feed) = self.state.feed_data().cloned() else {
            return;
        };
        match self.state.ticker.complete(generation, &feed, Instant::now()) {
            Some(ticket) => {
                debug!("ticker pass {} rebuilt", ticket.generation);
                self.schedule_pass_end(ticket.generation, ticket.duration);
                self.publish();
            }
            None => debug!("ignoring stale ticker pass {}", generation),
        }
    }

    // ── Theme ───────────────────────────────────────────────────────────

    fn set_theme(&mut self, theme: &str) {
        if self.state.theme.apply(theme) == ThemeChange::Unchanged {
            debug!("theme {:?} unchanged", theme);
            return;
        }
        info!("theme changed to {:?}, re-rendering", theme);
        // Loading / unavailable regions keep their state; only live
        // animations restart, from the data already held.
        self.start_rotation();
        self.start_ticker();
        self.publish();
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::ContactAttempt(result) => {
                self.fetch = None;
                self.on_contact_attempt(result);
            }
            ControllerEvent::CombinedLoad(result) => {
                self.fetch = None;
                self.on_combined_load(result);
            }
            ControllerEvent::RetryDue => {
                self.retry = None;
                if self.state.contact.is_loading() {
                    self.begin_attempt();
                }
            }
            ControllerEvent::RotationTick(cycle) if cycle == self.rotation_cycle => {
                self.on_rotation_tick()
            }
            ControllerEvent::RotationTick(cycle) => {
                debug!("ignoring stale rotation tick from cycle {}", cycle)
            }
            ControllerEvent::Settle(id) => {
                if self.state.rotation.settle(id) {
                    self.publish();
                }
            }
            ControllerEvent::Retire(id) => {
                if self.state.rotation.retire(id) {
                    self.publish();
                }
            }
            ControllerEvent::PassEnded(generation) => self.on_pass_ended(generation),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }
}
