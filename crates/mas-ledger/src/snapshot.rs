use serde::Serialize;

use mas_core::{Sku, Tick};

/// Read-only view of one item, as published in per-tick reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub sku:            Sku,
    pub title:          String,
    pub on_hand:        u32,
    pub threshold:      u32,
    pub restock_amount: u32,
    pub price:          f64,
}

/// Read-only view of one outstanding order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRestockSnapshot {
    pub sku:             Sku,
    pub title:           String,
    pub amount:          u32,
    pub ordered_tick:    Tick,
    pub delivery_tick:   Tick,
    pub ticks_remaining: u64,
}
