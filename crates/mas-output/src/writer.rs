//! The `OutputWriter` trait implemented by output backends.

use crate::{CustomerStateRow, EventRow, InventoryRow, OutputResult, TickSummaryRow};

/// A sink for the row types in [`crate::row`].
///
/// Errors surface to the observer, which keeps the first one for
/// [`SimOutputObserver::take_error`](crate::SimOutputObserver::take_error).
pub trait OutputWriter {
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    fn write_inventory(&mut self, rows: &[InventoryRow]) -> OutputResult<()>;

    fn write_customers(&mut self, rows: &[CustomerStateRow]) -> OutputResult<()>;

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
