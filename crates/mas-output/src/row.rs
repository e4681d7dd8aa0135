//! Plain data row types written by output backends.

use mas_agent::{CustomerSnapshot, Event};
use mas_ledger::InventorySnapshot;
use mas_sim::TickReport;

use crate::OutputResult;

/// Running metrics after one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummaryRow {
    pub tick:             u64,
    pub purchases:        u64,
    pub stockouts:        u64,
    pub restocks:         u64,
    pub restock_orders:   u64,
    pub complaints:       u64,
    pub silence:          u64,
    pub revenue:          f64,
    /// Events emitted during this tick.
    pub events:           u64,
    /// Orders outstanding at the end of this tick.
    pub pending_restocks: u64,
}

impl TickSummaryRow {
    pub fn from_report(report: &TickReport) -> Self {
        let m = &report.metrics;
        Self {
            tick:             report.tick.0,
            purchases:        m.purchases,
            stockouts:        m.stockouts,
            restocks:         m.restocks,
            restock_orders:   m.restock_orders,
            complaints:       m.complaints,
            silence:          m.silence,
            revenue:          m.revenue(),
            events:           report.events.len() as u64,
            pending_restocks: report.pending_restocks.len() as u64,
        }
    }
}

/// One item's stock at a given tick.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub tick:           u64,
    pub sku:            String,
    pub title:          String,
    pub on_hand:        u32,
    pub threshold:      u32,
    pub restock_amount: u32,
    pub price:          f64,
    /// An order for this item is outstanding.
    pub pending:        bool,
}

impl InventoryRow {
    pub fn from_snapshot(tick: u64, item: &InventorySnapshot, pending: bool) -> Self {
        Self {
            tick,
            sku:            item.sku.to_string(),
            title:          item.title.clone(),
            on_hand:        item.on_hand,
            threshold:      item.threshold,
            restock_amount: item.restock_amount,
            price:          item.price,
            pending,
        }
    }
}

/// One customer's inferred mood at a given tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerStateRow {
    pub tick:              u64,
    pub cust_id:           u32,
    pub inferred_state:    String,
    pub log_prob:          f64,
    pub observation_count: u64,
}

impl CustomerStateRow {
    pub fn from_snapshot(tick: u64, snap: &CustomerSnapshot) -> Self {
        Self {
            tick,
            cust_id:           snap.cust_id.0,
            inferred_state:    snap.inferred_state.clone(),
            log_prob:          snap.log_prob,
            observation_count: snap.observation_count,
        }
    }
}

/// One event-log entry.  `payload` is the event body as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub tick:       u64,
    pub event_type: String,
    pub payload:    String,
}

impl EventRow {
    pub fn from_event(event: &Event) -> OutputResult<Self> {
        let mut value = serde_json::to_value(&event.payload)?;
        let body = value
            .get_mut("payload")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null);
        Ok(Self {
            tick:       event.tick.0,
            event_type: event.payload.type_name().to_owned(),
            payload:    serde_json::to_string(&body)?,
        })
    }
}
