//! `SimController` — the lifecycle surface a transport layer drives.
//!
//! ```text
//!             configure             start
//!   Idle ───────────────▶ Configured ─────▶ Running ──┬─ stop ──────▶ Stopped
//!                            │   ▲                     ├─ last tick ─▶ Finished
//!                            │   └── configure ◀───────┤
//!                            └── step (manual)         └─ error ─────▶ Errored(msg)
//! ```
//!
//! A background run owns its [`Sim`] on a worker thread.  Cancellation is
//! checked only between ticks.  Each completed tick's report is sent on a
//! `tokio` broadcast channel; sending never blocks, and a subscriber that
//! falls behind loses the oldest reports instead of stalling the loop.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use mas_core::Tick;

use crate::{Metrics, Sim, SimBuilder, SimError, SimResult, SimulationConfig, TickReport};

/// Pause between background ticks unless configured otherwise.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Reports buffered per subscriber before the oldest are dropped.
pub const REPORT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Configured,
    Running,
    Stopped,
    Finished,
    Errored(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStatus {
    pub phase:       RunPhase,
    /// Last tick processed by the current (or most recent) run.
    pub tick:        Tick,
    pub total_ticks: u64,
    pub running:     bool,
    pub configured:  bool,
}

struct Shared {
    phase:   RunPhase,
    config:  Option<SimulationConfig>,
    /// The idle simulation.  `None` while a worker owns it.
    sim:     Option<Sim>,
    tick:    Tick,
    metrics: Metrics,
}

/// Handles the worker thread needs.
#[derive(Clone)]
struct WorkerLink {
    shared:   Arc<Mutex<Shared>>,
    wake:     Arc<Condvar>,
    cancel:   Arc<AtomicBool>,
    reports:  broadcast::Sender<Arc<TickReport>>,
    interval: Duration,
}

pub struct SimController {
    link:   WorkerLink,
    worker: Option<JoinHandle<()>>,
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimController {
    pub fn new() -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            link: WorkerLink {
                shared: Arc::new(Mutex::new(Shared {
                    phase:   RunPhase::Idle,
                    config:  None,
                    sim:     None,
                    tick:    Tick::ZERO,
                    metrics: Metrics::default(),
                })),
                wake:     Arc::new(Condvar::new()),
                cancel:   Arc::new(AtomicBool::new(false)),
                reports,
                interval: DEFAULT_TICK_INTERVAL,
            },
            worker: None,
        }
    }

    /// Pause between background ticks.  `Duration::ZERO` runs flat out.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.link.interval = interval;
        self
    }

    // ── Transport surface ─────────────────────────────────────────────────

    /// Validate `config` and make it the current configuration.
    ///
    /// Replaces any earlier configuration and resets tick and metrics.
    /// Fails with `InvalidState` while a background run is active.
    pub fn configure(&mut self, config: SimulationConfig) -> SimResult<()> {
        self.reap_worker();
        let mut shared = self.link.shared.lock();
        if shared.phase == RunPhase::Running {
            return Err(SimError::InvalidState("cannot reconfigure while running".into()));
        }
        let sim = SimBuilder::new(config.clone()).build()?;
        info!(ticks = config.ticks, seed = config.seed, "controller configured");
        shared.config = Some(config);
        shared.sim = Some(sim);
        shared.phase = RunPhase::Configured;
        shared.tick = Tick::ZERO;
        shared.metrics = Metrics::default();
        Ok(())
    }

    /// Start a fresh background run of the current configuration.
    pub fn start(&mut self) -> SimResult<()> {
        self.reap_worker();
        let config = {
            let shared = self.link.shared.lock();
            if shared.phase == RunPhase::Running {
                return Err(SimError::InvalidState("already running".into()));
            }
            shared
                .config
                .clone()
                .ok_or_else(|| SimError::InvalidState("start before configure".into()))?
        };
        let sim = SimBuilder::new(config).build()?;
        self.launch(sim)
    }

    /// Cancel the background run and wait for the in-flight tick to finish.
    ///
    /// A no-op when nothing is running.
    pub fn stop(&mut self) -> SimResult<()> {
        if self.worker.is_none() {
            return Ok(());
        }
        self.link.cancel.store(true, Ordering::SeqCst);
        {
            let _shared = self.link.shared.lock();
            self.link.wake.notify_all();
        }
        self.reap_worker();
        Ok(())
    }

    /// Process one tick synchronously on the caller's thread.
    pub fn step(&mut self) -> SimResult<Arc<TickReport>> {
        self.reap_worker();
        let mut guard = self.link.shared.lock();
        let shared = &mut *guard;
        if shared.phase == RunPhase::Running {
            return Err(SimError::InvalidState("cannot step while running".into()));
        }
        let Some(sim) = shared.sim.as_mut() else {
            return Err(SimError::InvalidState(match &shared.phase {
                RunPhase::Errored(detail) => {
                    format!("background run errored ({detail}); start or configure a new run")
                }
                _ => "step before configure".into(),
            }));
        };

        match sim.advance() {
            Ok(report) => {
                let report = Arc::new(report);
                let finished = sim.is_finished();
                shared.tick = report.tick;
                shared.metrics = report.metrics;
                if finished {
                    shared.phase = RunPhase::Finished;
                }
                let _ = self.link.reports.send(Arc::clone(&report));
                Ok(report)
            }
            Err(e) => {
                // A run that already finished stays finished.
                if sim.is_terminated() {
                    shared.phase = RunPhase::Errored(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// The last processed tick and the metrics as of that tick.
    pub fn metrics(&self) -> (Tick, Metrics) {
        let shared = self.link.shared.lock();
        (shared.tick, shared.metrics)
    }

    pub fn status(&self) -> ControllerStatus {
        let shared = self.link.shared.lock();
        ControllerStatus {
            phase:       shared.phase.clone(),
            tick:        shared.tick,
            total_ticks: shared.config.as_ref().map_or(0, |c| c.ticks),
            running:     shared.phase == RunPhase::Running,
            configured:  shared.config.is_some(),
        }
    }

    /// A new receiver for every subsequent tick report.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TickReport>> {
        self.link.reports.subscribe()
    }

    // ── Worker management ─────────────────────────────────────────────────

    /// Hand `sim` to a new worker thread.
    pub(crate) fn launch(&mut self, sim: Sim) -> SimResult<()> {
        {
            let mut shared = self.link.shared.lock();
            shared.sim = None;
            shared.tick = sim.current_tick();
            shared.metrics = sim.metrics();
            shared.phase = RunPhase::Running;
        }
        self.link.cancel.store(false, Ordering::SeqCst);

        let link = self.link.clone();
        let spawned = std::thread::Builder::new()
            .name("mas-tick-loop".into())
            .spawn(move || drive(sim, link));
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.link.shared.lock().phase = RunPhase::Errored(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Join a worker that has stopped, or wait for one told to stop.
    fn reap_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        let done = self.link.cancel.load(Ordering::SeqCst)
            || self.link.shared.lock().phase != RunPhase::Running;
        if !done {
            self.worker = Some(handle);
            return;
        }
        if handle.join().is_err() {
            warn!("tick loop thread exited abnormally");
        }
    }

    /// Block until the background run leaves `Running`.
    pub fn wait(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("tick loop thread exited abnormally");
            }
        }
    }
}

impl Drop for SimController {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

// ── Worker loop ───────────────────────────────────────────────────────────────

fn drive(mut sim: Sim, link: WorkerLink) {
    info!(from = %sim.current_tick(), "background run started");
    let phase = loop {
        if link.cancel.load(Ordering::SeqCst) {
            break RunPhase::Stopped;
        }
        if sim.is_finished() {
            break RunPhase::Finished;
        }

        match catch_unwind(AssertUnwindSafe(|| sim.advance())) {
            Ok(Ok(report)) => {
                {
                    let mut shared = link.shared.lock();
                    shared.tick = report.tick;
                    shared.metrics = report.metrics;
                }
                // Err only means nobody is subscribed.
                let _ = link.reports.send(Arc::new(report));
            }
            Ok(Err(e)) => break RunPhase::Errored(e.to_string()),
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(tick = %sim.current_tick(), %message, "tick panicked");
                break RunPhase::Errored(message);
            }
        }

        if !link.interval.is_zero() && !sim.is_finished() {
            let mut shared = link.shared.lock();
            if !link.cancel.load(Ordering::SeqCst) {
                link.wake.wait_for(&mut shared, link.interval);
            }
        }
    };

    info!(tick = %sim.current_tick(), ?phase, "background run ended");
    let mut shared = link.shared.lock();
    // A panicked run may have been left half-updated.
    shared.sim = match phase {
        RunPhase::Errored(_) => None,
        _ => Some(sim),
    };
    shared.phase = phase;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("tick panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("tick panicked: {s}")
    } else {
        "tick panicked".to_owned()
    }
}
