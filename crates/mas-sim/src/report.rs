use serde::Serialize;

use mas_agent::{CustomerSnapshot, Event};
use mas_core::Tick;
use mas_ledger::{InventorySnapshot, PendingRestockSnapshot};

use crate::Metrics;

/// Everything that happened in one tick plus the state it left behind.
///
/// Built once by [`Sim::advance`](crate::Sim::advance) and only ever shared
/// by reference (or `Arc`) afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub tick:             Tick,
    pub events:           Vec<Event>,
    pub metrics:          Metrics,
    pub customer_states:  Vec<CustomerSnapshot>,
    pub inventory:        Vec<InventorySnapshot>,
    pub pending_restocks: Vec<PendingRestockSnapshot>,
}
