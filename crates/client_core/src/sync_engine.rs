//! Periodic chain synchronisation.
//!
//! A round fetches the chain summary and the recent block list concurrently and
//! publishes both as one [`ChainView`]. A failed round leaves the previously
//! published view untouched. At most one round is in flight at any time.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::protocol::{Block, ChainInfo};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{error::ServiceError, service::LedgerService};

const STOPPED: u64 = 0;
const SYNC_EVENT_CAPACITY: usize = 64;

/// One consistent round of chain state. Blocks are newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainView {
    pub round: u64,
    pub info: ChainInfo,
    pub blocks: Vec<Block>,
    pub synced_at: DateTime<Utc>,
}

impl ChainView {
    fn from_round(round: u64, info: ChainInfo, blocks: Vec<Block>) -> Self {
        Self {
            round,
            info,
            blocks: newest_first(blocks),
            synced_at: Utc::now(),
        }
    }

    /// Blocks in the order the service returned them.
    pub fn arrival_order(&self) -> Vec<Block> {
        let mut blocks = self.blocks.clone();
        blocks.reverse();
        blocks
    }
}

/// Presentation order is the exact reverse of the service order.
pub fn newest_first(mut blocks: Vec<Block>) -> Vec<Block> {
    blocks.reverse();
    blocks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Online,
    Connecting,
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    Published(Arc<ChainView>),
    RoundFailed { round: u64, error: ServiceError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundOutcome {
    Published,
    Failed,
    Discarded,
}

/// Cancellation token returned by [`SyncEngine::start`].
#[must_use = "dropping the handle leaves the sync timer running"]
#[derive(Debug)]
pub struct SyncHandle {
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct PublishedState {
    view: Option<Arc<ChainView>>,
    last_round_ok: bool,
    last_error: Option<ServiceError>,
}

struct SyncInner {
    service: Arc<dyn LedgerService>,
    state: RwLock<PublishedState>,
    in_flight: AtomicBool,
    refresh_pending: AtomicBool,
    generation: AtomicU64,
    next_generation: AtomicU64,
    rounds: AtomicU64,
    events: broadcast::Sender<SyncEvent>,
}

#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<SyncInner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundTrigger {
    /// First tick of a generation. Queued behind a stale round rather than
    /// skipped.
    Startup,
    Scheduled,
    OutOfBand,
}

impl SyncEngine {
    pub fn new(service: Arc<dyn LedgerService>) -> Self {
        let (events, _) = broadcast::channel(SYNC_EVENT_CAPACITY);
        Self {
            inner: Arc::new(SyncInner {
                service,
                state: RwLock::new(PublishedState::default()),
                in_flight: AtomicBool::new(false),
                refresh_pending: AtomicBool::new(false),
                generation: AtomicU64::new(STOPPED),
                next_generation: AtomicU64::new(1),
                rounds: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Starts periodic rounds. The first round fires immediately. Starting an
    /// engine that is already running supersedes the earlier handle.
    pub fn start(&self, interval: Duration) -> SyncHandle {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let previous = self.inner.generation.swap(generation, Ordering::AcqRel);
        if previous != STOPPED {
            debug!(previous, generation, "sync: superseding running timer");
        }
        info!(generation, interval_ms = interval.as_millis() as u64, "sync: starting");

        let engine = self.clone();
        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut trigger = RoundTrigger::Startup;
            loop {
                ticker.tick().await;
                if engine.inner.generation.load(Ordering::Acquire) != generation {
                    break;
                }
                engine.begin_round(generation, trigger);
                trigger = RoundTrigger::Scheduled;
            }
        });

        SyncHandle { generation, timer }
    }

    /// Cancels the timer. A round already in flight finishes but its result is
    /// discarded.
    pub fn stop(&self, handle: SyncHandle) {
        let stopped = self
            .inner
            .generation
            .compare_exchange(
                handle.generation,
                STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        handle.timer.abort();
        if stopped {
            info!(generation = handle.generation, "sync: stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.generation.load(Ordering::Acquire) != STOPPED
    }

    pub fn is_round_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Requests a round outside the schedule. When a round is already running,
    /// one follow-up round is queued behind it. Returns `false` only when the
    /// engine is stopped.
    pub fn trigger_now(&self) -> bool {
        let generation = self.inner.generation.load(Ordering::Acquire);
        if generation == STOPPED {
            debug!("sync: refresh requested while stopped, ignoring");
            return false;
        }
        self.begin_round(generation, RoundTrigger::OutOfBand);
        true
    }

    pub async fn view(&self) -> Option<Arc<ChainView>> {
        self.inner.state.read().await.view.clone()
    }

    pub async fn status(&self) -> SyncStatus {
        let state = self.inner.state.read().await;
        if state.last_round_ok && state.view.is_some() {
            SyncStatus::Online
        } else {
            SyncStatus::Connecting
        }
    }

    pub async fn last_error(&self) -> Option<ServiceError> {
        self.inner.state.read().await.last_error.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    fn begin_round(&self, generation: u64, trigger: RoundTrigger) {
        // A queued request is published before the guard is tried, so either
        // this call takes the guard or the running round sees the request
        // after releasing it.
        let queued = trigger != RoundTrigger::Scheduled;
        if queued {
            self.inner.refresh_pending.store(true, Ordering::SeqCst);
        }
        if !self.try_acquire_round() {
            if queued {
                debug!(?trigger, "sync: round in flight, queueing follow-up refresh");
            } else {
                debug!("sync: previous round still in flight, skipping tick");
            }
            return;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            let mut generation = generation;
            loop {
                // Everything requested so far is covered by the round below.
                engine.inner.refresh_pending.store(false, Ordering::SeqCst);
                engine.run_round(generation).await;
                engine.inner.in_flight.store(false, Ordering::SeqCst);

                if !engine.inner.refresh_pending.load(Ordering::SeqCst) {
                    break;
                }
                // Whoever grabbed the guard in between started after the
                // request and covers it.
                if !engine.try_acquire_round() {
                    break;
                }
                generation = engine.inner.generation.load(Ordering::Acquire);
                if generation == STOPPED {
                    engine.inner.refresh_pending.store(false, Ordering::SeqCst);
                    engine.inner.in_flight.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });
    }

    fn try_acquire_round(&self) -> bool {
        self.inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn run_round(&self, generation: u64) -> RoundOutcome {
        let round = self.inner.rounds.fetch_add(1, Ordering::Relaxed) + 1;
        let service = &self.inner.service;
        let result = futures::future::try_join(service.chain_info(), service.recent_blocks()).await;

        let mut state = self.inner.state.write().await;
        if self.inner.generation.load(Ordering::Acquire) != generation {
            debug!(round, generation, "sync: engine stopped mid-round, discarding result");
            return RoundOutcome::Discarded;
        }

        match result {
            Ok((info, blocks)) => {
                let view = Arc::new(ChainView::from_round(round, info, blocks));
                state.view = Some(Arc::clone(&view));
                state.last_round_ok = true;
                state.last_error = None;
                drop(state);
                debug!(
                    round,
                    height = view.info.height,
                    blocks = view.blocks.len(),
                    "sync: published snapshot"
                );
                let _ = self.inner.events.send(SyncEvent::Published(view));
                RoundOutcome::Published
            }
            Err(error) => {
                state.last_round_ok = false;
                state.last_error = Some(error.clone());
                drop(state);
                warn!(round, %error, "sync: round failed, keeping previous snapshot");
                let _ = self
                    .inner
                    .events
                    .send(SyncEvent::RoundFailed { round, error });
                RoundOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/sync_engine_tests.rs"]
mod tests;
