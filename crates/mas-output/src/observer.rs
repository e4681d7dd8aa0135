//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use std::collections::HashSet;

use mas_core::Tick;
use mas_sim::{Metrics, SimObserver, SimulationConfig, TickReport};

use crate::row::{CustomerStateRow, EventRow, InventoryRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes tick reports to any [`OutputWriter`].
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:          W,
    output_interval: u64,
    last_error:      Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, taking the snapshot cadence
    /// from `config`.
    pub fn new(writer: W, config: &SimulationConfig) -> Self {
        Self {
            writer,
            output_interval: config.output_interval_ticks.max(1),
            last_error:      None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }

    fn write_report(&mut self, report: &TickReport) -> OutputResult<()> {
        let tick = report.tick.0;
        self.writer.write_tick_summary(&TickSummaryRow::from_report(report))?;

        let events = report
            .events
            .iter()
            .map(EventRow::from_event)
            .collect::<OutputResult<Vec<_>>>()?;
        if !events.is_empty() {
            self.writer.write_events(&events)?;
        }

        if !report.tick.is_multiple_of(self.output_interval) {
            return Ok(());
        }
        let pending: HashSet<_> = report.pending_restocks.iter().map(|p| &p.sku).collect();
        let inventory: Vec<InventoryRow> = report
            .inventory
            .iter()
            .map(|item| InventoryRow::from_snapshot(tick, item, pending.contains(&item.sku)))
            .collect();
        self.writer.write_inventory(&inventory)?;

        let customers: Vec<CustomerStateRow> = report
            .customer_states
            .iter()
            .map(|c| CustomerStateRow::from_snapshot(tick, c))
            .collect();
        if !customers.is_empty() {
            self.writer.write_customers(&customers)?;
        }
        Ok(())
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, report: &TickReport) {
        let result = self.write_report(report);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick, _metrics: &Metrics) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
