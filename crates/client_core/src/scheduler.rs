use std::{sync::Arc, time::Duration};

use comic_core::DaySelector;
use shared::domain::{Comic, Theme};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    clock::{header_info, system_clock, Clock, HeaderInfo},
    source::ComicSource,
};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// What the client is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComicState {
    /// Nothing dispatched yet.
    Idle {
        theme: Theme,
    },
    Fetching {
        theme: Theme,
    },
    Ready {
        theme: Theme,
        comic: Comic,
    },
    Failed {
        theme: Theme,
        message: String,
    },
}

impl ComicState {
    pub fn theme(&self) -> &Theme {
        match self {
            Self::Idle { theme }
            | Self::Fetching { theme }
            | Self::Ready { theme, .. }
            | Self::Failed { theme, .. } => theme,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Fetching { .. } => "loading",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub theme: Theme,
}

/// Pure transition logic of the refresh loop. Every dispatch bumps the
/// generation; only the result carrying the latest generation may land.
#[derive(Debug)]
pub struct SchedulerMachine {
    state: ComicState,
    generation: u64,
}

impl SchedulerMachine {
    pub fn new(theme: Theme) -> Self {
        Self {
            state: ComicState::Idle { theme },
            generation: 0,
        }
    }

    pub fn state(&self) -> &ComicState {
        &self.state
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    /// Returns a ticket on the first tick and whenever `theme` is not the
    /// one already being shown or fetched. A failed theme stays failed until
    /// the day changes.
    pub fn on_tick(&mut self, theme: &Theme) -> Option<FetchTicket> {
        let idle = matches!(self.state, ComicState::Idle { .. });
        if !idle && self.state.theme() == theme {
            return None;
        }
        self.generation += 1;
        self.state = ComicState::Fetching {
            theme: theme.clone(),
        };
        Some(FetchTicket {
            generation: self.generation,
            theme: theme.clone(),
        })
    }

    /// Applies a settled fetch. Returns false when the ticket was superseded.
    pub fn on_settled(&mut self, ticket: &FetchTicket, outcome: Result<Comic, String>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                latest = self.generation,
                theme = %ticket.theme,
                "discarding stale comic result"
            );
            return false;
        }
        let theme = ticket.theme.clone();
        self.state = match outcome {
            Ok(comic) => ComicState::Ready { theme, comic },
            Err(cause) => ComicState::Failed {
                theme,
                message: format!("API Error: {cause}"),
            },
        };
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub state: ComicState,
    pub header: HeaderInfo,
}

type Settled = (FetchTicket, Result<Comic, String>);

/// Drives a [`SchedulerMachine`] from a timer and publishes every change on a
/// watch channel. The task ends once all receivers are dropped.
pub struct RefreshScheduler {
    selector: DaySelector,
    source: Arc<dyn ComicSource>,
    tick: Duration,
    clock: Clock,
}

impl RefreshScheduler {
    pub fn new(selector: DaySelector, source: Arc<dyn ComicSource>) -> Self {
        Self {
            selector,
            source,
            tick: DEFAULT_TICK,
            clock: system_clock(),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn spawn(self) -> (watch::Receiver<SchedulerSnapshot>, JoinHandle<()>) {
        let now = (self.clock)();
        let initial = SchedulerSnapshot {
            state: ComicState::Idle {
                theme: self.selector.theme_for(now),
            },
            header: header_info(now, self.selector.timezone()),
        };
        let (updates, receiver) = watch::channel(initial);
        let handle = tokio::spawn(self.run(updates));
        (receiver, handle)
    }

    async fn run(self, updates: watch::Sender<SchedulerSnapshot>) {
        let mut machine = SchedulerMachine::new(updates.borrow().state.theme().clone());
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<Settled>();
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = (self.clock)();
                    let theme = self.selector.theme_for(now);
                    if let Some(ticket) = machine.on_tick(&theme) {
                        info!(
                            generation = ticket.generation,
                            %theme,
                            "theme changed, fetching comic"
                        );
                        self.dispatch(ticket, settled_tx.clone());
                    }
                    self.publish(&updates, &machine);
                }
                Some((ticket, outcome)) = settled_rx.recv() => {
                    if machine.on_settled(&ticket, outcome) {
                        self.publish(&updates, &machine);
                    }
                }
                _ = updates.closed() => {
                    debug!("no scheduler subscribers left, stopping");
                    break;
                }
            }
        }
    }

    fn dispatch(&self, ticket: FetchTicket, settled: mpsc::UnboundedSender<Settled>) {
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            let outcome = source.fetch_comic(&ticket.theme).await.map_err(|error| {
                warn!(generation = ticket.generation, %error, "comic fetch failed");
                error.to_string()
            });
            let _ = settled.send((ticket, outcome));
        });
    }

    fn publish(&self, updates: &watch::Sender<SchedulerSnapshot>, machine: &SchedulerMachine) {
        updates.send_replace(SchedulerSnapshot {
            state: machine.state().clone(),
            header: header_info((self.clock)(), self.selector.timezone()),
        });
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
