//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `tick_summaries.csv`
//! - `inventory_snapshots.csv`
//! - `customer_states.csv`
//! - `events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{CustomerStateRow, EventRow, InventoryRow, OutputResult, TickSummaryRow};

pub const TICK_SUMMARY_HEADER: [&str; 10] = [
    "tick", "purchases", "stockouts", "restocks", "restock_orders",
    "complaints", "silence", "revenue", "events", "pending_restocks",
];
pub const INVENTORY_HEADER: [&str; 8] = [
    "tick", "sku", "title", "on_hand", "threshold", "restock_amount", "price", "pending",
];
pub const CUSTOMER_HEADER: [&str; 5] = [
    "tick", "cust_id", "inferred_state", "logprob", "observation_count",
];
pub const EVENT_HEADER: [&str; 3] = ["tick", "type", "payload"];

/// Writes simulation output to four CSV files.
pub struct CsvWriter {
    summaries: Writer<File>,
    inventory: Writer<File>,
    customers: Writer<File>,
    events:    Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open (or truncate) the four CSV files, and
    /// write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(TICK_SUMMARY_HEADER)?;

        let mut inventory = Writer::from_path(dir.join("inventory_snapshots.csv"))?;
        inventory.write_record(INVENTORY_HEADER)?;

        let mut customers = Writer::from_path(dir.join("customer_states.csv"))?;
        customers.write_record(CUSTOMER_HEADER)?;

        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(EVENT_HEADER)?;

        Ok(Self { summaries, inventory, customers, events, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.purchases.to_string(),
            row.stockouts.to_string(),
            row.restocks.to_string(),
            row.restock_orders.to_string(),
            row.complaints.to_string(),
            row.silence.to_string(),
            format!("{:.2}", row.revenue),
            row.events.to_string(),
            row.pending_restocks.to_string(),
        ])?;
        Ok(())
    }

    fn write_inventory(&mut self, rows: &[InventoryRow]) -> OutputResult<()> {
        for row in rows {
            self.inventory.write_record(&[
                row.tick.to_string(),
                row.sku.clone(),
                row.title.clone(),
                row.on_hand.to_string(),
                row.threshold.to_string(),
                row.restock_amount.to_string(),
                row.price.to_string(),
                (row.pending as u8).to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_customers(&mut self, rows: &[CustomerStateRow]) -> OutputResult<()> {
        for row in rows {
            self.customers.write_record(&[
                row.tick.to_string(),
                row.cust_id.to_string(),
                row.inferred_state.clone(),
                row.log_prob.to_string(),
                row.observation_count.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.tick.to_string(),
                row.event_type.clone(),
                row.payload.clone(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.summaries.flush()?;
        self.inventory.flush()?;
        self.customers.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
