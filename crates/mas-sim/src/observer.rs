//! Simulation observer trait for progress reporting and data collection.

use mas_core::Tick;

use crate::{Metrics, TickReport};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at tick boundaries.
///
/// Observers see shared references only and cannot reach engine state.
/// All methods have default no-op implementations.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, report: &TickReport) {
///         if report.tick.is_multiple_of(self.interval) {
///             println!("{}: {} purchases", report.tick, report.metrics.purchases);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before a tick is processed.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after a tick completes.
    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Called once after the final tick.
    fn on_sim_end(&mut self, _final_tick: Tick, _metrics: &Metrics) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps every report.  Handy for tests and small runs.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    pub reports: Vec<TickReport>,
    pub finished: Option<(Tick, Metrics)>,
}

impl SimObserver for CollectingObserver {
    fn on_tick_end(&mut self, report: &TickReport) {
        self.reports.push(report.clone());
    }

    fn on_sim_end(&mut self, final_tick: Tick, metrics: &Metrics) {
        self.finished = Some((final_tick, *metrics));
    }
}

/// Forwards to both observers, `A` first.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn on_tick_start(&mut self, tick: Tick) {
        self.0.on_tick_start(tick);
        self.1.on_tick_start(tick);
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.0.on_tick_end(report);
        self.1.on_tick_end(report);
    }

    fn on_sim_end(&mut self, final_tick: Tick, metrics: &Metrics) {
        self.0.on_sim_end(final_tick, metrics);
        self.1.on_sim_end(final_tick, metrics);
    }
}

impl<O: SimObserver + ?Sized> SimObserver for &mut O {
    fn on_tick_start(&mut self, tick: Tick) {
        (**self).on_tick_start(tick);
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        (**self).on_tick_end(report);
    }

    fn on_sim_end(&mut self, final_tick: Tick, metrics: &Metrics) {
        (**self).on_sim_end(final_tick, metrics);
    }
}
