//! `mas-output` — simulation output writers for the retail marketplace
//! simulation.
//!
//! | Writer        | Files created                                                        |
//! |---------------|----------------------------------------------------------------------|
//! | [`CsvWriter`] | `tick_summaries.csv`, `inventory_snapshots.csv`,                     |
//! |               | `customer_states.csv`, `events.csv`                                  |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `mas_sim::SimObserver`.  Tick
//! summaries and events are written every tick; inventory and customer
//! snapshots every `outputIntervalTicks`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mas_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer, &config);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() { eprintln!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{CustomerStateRow, EventRow, InventoryRow, TickSummaryRow};
pub use writer::OutputWriter;
