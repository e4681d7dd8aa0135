//! The restock decision rule and order records.

use serde::Serialize;

use mas_core::{Sku, Tick};

/// Ticks between placing a restock order and its delivery.
pub const RESTOCK_DELAY_TICKS: u64 = 3;

/// Longest configurable delivery delay.
pub const MAX_RESTOCK_DELAY_TICKS: u64 = 1_000_000;

/// The single restock decision rule: reorder once stock falls to or below
/// the threshold, unless an order is already outstanding.
#[inline]
pub fn needs_restock(on_hand: u32, threshold: u32, has_pending: bool) -> bool {
    on_hand <= threshold && !has_pending
}

/// An outstanding supplier order.  At most one exists per SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRestock {
    pub sku:           Sku,
    pub amount:        u32,
    pub ordered_tick:  Tick,
    /// Always later than `ordered_tick`.
    pub delivery_tick: Tick,
}

impl PendingRestock {
    #[inline]
    pub fn is_due(&self, now: Tick) -> bool {
        self.delivery_tick <= now
    }
}

/// A restock applied by [`InventoryLedger::deliver_due`](crate::InventoryLedger::deliver_due).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub sku:           Sku,
    pub title:         String,
    pub amount:        u32,
    /// Stock after the delivery was added.
    pub on_hand:       u32,
    pub ordered_tick:  Tick,
    pub delivery_tick: Tick,
}
