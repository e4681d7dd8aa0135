//! `InventoryLedger` — the only writer of stock counts and restock orders.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use mas_core::{Sku, Tick};

use crate::item::InventoryItem;
use crate::restock::{
    needs_restock, Delivery, PendingRestock, MAX_RESTOCK_DELAY_TICKS, RESTOCK_DELAY_TICKS,
};
use crate::snapshot::{InventorySnapshot, PendingRestockSnapshot};
use crate::{CatalogSource, ItemSpec, LedgerError, LedgerResult};

/// What a purchase attempt did to stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Sold {
        qty:               u32,
        unit_price_micros: u64,
        remaining:         u32,
    },
    /// Not enough stock.  Nothing changed.
    OutOfStock { available: u32 },
}

/// Result of [`InventoryLedger::purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub sku:     Sku,
    pub title:   String,
    pub outcome: PurchaseOutcome,
    /// The order this purchase triggered, if any.
    pub restock: Option<PendingRestock>,
}

impl PurchaseReceipt {
    pub fn is_sold(&self) -> bool {
        matches!(self.outcome, PurchaseOutcome::Sold { .. })
    }
}

/// Per-item stock plus outstanding supplier orders.
///
/// Items keep their configuration order for snapshots and weighted choice;
/// `pending` is a `BTreeMap` so deliveries apply in SKU order.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    items:         Vec<InventoryItem>,
    index:         HashMap<Sku, usize>,
    pending:       BTreeMap<Sku, PendingRestock>,
    restock_delay: u64,
}

impl InventoryLedger {
    /// Build a ledger from item specs using [`RESTOCK_DELAY_TICKS`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::Validation`] if `specs` is empty, a SKU repeats, or any
    /// item is malformed.
    pub fn new(specs: Vec<ItemSpec>) -> LedgerResult<Self> {
        if specs.is_empty() {
            return Err(LedgerError::Validation("inventory is empty".into()));
        }
        let mut items = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());
        for spec in specs {
            let item = InventoryItem::from_spec(spec)?;
            if index.insert(item.sku.clone(), items.len()).is_some() {
                return Err(LedgerError::Validation(format!("duplicate sku {}", item.sku)));
            }
            items.push(item);
        }
        Ok(Self {
            items,
            index,
            pending: BTreeMap::new(),
            restock_delay: RESTOCK_DELAY_TICKS,
        })
    }

    /// Build from any catalog source.
    pub fn from_catalog<C: CatalogSource + ?Sized>(catalog: &C) -> LedgerResult<Self> {
        Self::new(catalog.inventory_items())
    }

    /// Override the delivery delay.  Must be within
    /// `1..=MAX_RESTOCK_DELAY_TICKS`.
    pub fn with_restock_delay(mut self, ticks: u64) -> LedgerResult<Self> {
        if !(1..=MAX_RESTOCK_DELAY_TICKS).contains(&ticks) {
            return Err(LedgerError::Validation(format!(
                "restock delay {ticks} outside 1..={MAX_RESTOCK_DELAY_TICKS} ticks"
            )));
        }
        self.restock_delay = ticks;
        Ok(self)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, sku: &Sku) -> Option<&InventoryItem> {
        self.index.get(sku).map(|&i| &self.items[i])
    }

    pub fn pending(&self, sku: &Sku) -> Option<&PendingRestock> {
        self.pending.get(sku)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn restock_delay(&self) -> u64 {
        self.restock_delay
    }

    /// Choice weights for picking an item to buy: `max(on_hand, 1)` in item
    /// order, so empty items stay possible but stocked ones dominate.
    pub fn stock_weights(&self) -> Vec<u32> {
        self.items.iter().map(|i| i.on_hand.max(1)).collect()
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Sell `qty` units of `sku` at tick `now`.
    ///
    /// Insufficient stock is a normal outcome ([`PurchaseOutcome::OutOfStock`])
    /// and leaves the ledger unchanged.  After a sale the restock rule runs
    /// for this SKU and any new order is returned in the receipt.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UnknownSku`] if `sku` is not stocked;
    /// [`LedgerError::Validation`] if `qty` is zero;
    /// [`LedgerError::Overflow`] if a triggered order's delivery tick would
    /// pass `u64::MAX`.
    pub fn purchase(&mut self, sku: &Sku, qty: u32, now: Tick) -> LedgerResult<PurchaseReceipt> {
        if qty == 0 {
            return Err(LedgerError::Validation("purchase quantity must be positive".into()));
        }
        let idx = self.position(sku)?;
        let item = &mut self.items[idx];

        if item.on_hand < qty {
            debug!(%sku, qty, available = item.on_hand, %now, "stockout");
            return Ok(PurchaseReceipt {
                sku:     item.sku.clone(),
                title:   item.title.clone(),
                outcome: PurchaseOutcome::OutOfStock { available: item.on_hand },
                restock: None,
            });
        }

        item.on_hand -= qty;
        let outcome = PurchaseOutcome::Sold {
            qty,
            unit_price_micros: item.price_micros,
            remaining:         item.on_hand,
        };
        debug!(%sku, qty, remaining = item.on_hand, %now, "sold");

        let title = item.title.clone();
        let restock = self.order_if_needed(idx, now)?;
        Ok(PurchaseReceipt { sku: sku.clone(), title, outcome, restock })
    }

    /// Apply the restock rule to every item, placing orders where it holds.
    ///
    /// Returns the orders placed by this call, in item order.
    pub fn review_restocks(&mut self, now: Tick) -> LedgerResult<Vec<PendingRestock>> {
        let mut orders = Vec::new();
        for idx in 0..self.items.len() {
            orders.extend(self.order_if_needed(idx, now)?);
        }
        Ok(orders)
    }

    /// Apply every outstanding order with `delivery_tick <= now`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Overflow`] if a delivery would exceed `u32::MAX` units;
    /// that order stays pending.
    pub fn deliver_due(&mut self, now: Tick) -> LedgerResult<Vec<Delivery>> {
        let due: Vec<Sku> = self.pending
            .values()
            .filter(|p| p.is_due(now))
            .map(|p| p.sku.clone())
            .collect();

        let mut deliveries = Vec::with_capacity(due.len());
        for sku in due {
            let idx = self.position(&sku)?;
            let Some(order) = self.pending.get(&sku) else { continue };
            let item = &mut self.items[idx];
            item.on_hand = item.on_hand
                .checked_add(order.amount)
                .ok_or_else(|| LedgerError::Overflow(sku.clone()))?;
            info!(%sku, amount = order.amount, on_hand = item.on_hand, %now, "restock delivered");

            deliveries.push(Delivery {
                sku:           sku.clone(),
                title:         item.title.clone(),
                amount:        order.amount,
                on_hand:       item.on_hand,
                ordered_tick:  order.ordered_tick,
                delivery_tick: order.delivery_tick,
            });
            self.pending.remove(&sku);
        }
        Ok(deliveries)
    }

    // ── Snapshots ─────────────────────────────────────────────────────────

    pub fn inventory_snapshot(&self) -> Vec<InventorySnapshot> {
        self.items
            .iter()
            .map(|i| InventorySnapshot {
                sku:            i.sku.clone(),
                title:          i.title.clone(),
                on_hand:        i.on_hand,
                threshold:      i.threshold,
                restock_amount: i.restock_amount,
                price:          i.price(),
            })
            .collect()
    }

    pub fn pending_snapshot(&self, now: Tick) -> Vec<PendingRestockSnapshot> {
        self.pending
            .values()
            .map(|p| PendingRestockSnapshot {
                sku:             p.sku.clone(),
                title:           self.get(&p.sku).map(|i| i.title.clone()).unwrap_or_default(),
                amount:          p.amount,
                ordered_tick:    p.ordered_tick,
                delivery_tick:   p.delivery_tick,
                ticks_remaining: now.until(p.delivery_tick),
            })
            .collect()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn position(&self, sku: &Sku) -> LedgerResult<usize> {
        self.index
            .get(sku)
            .copied()
            .ok_or_else(|| LedgerError::UnknownSku(sku.clone()))
    }

    fn order_if_needed(&mut self, idx: usize, now: Tick) -> LedgerResult<Option<PendingRestock>> {
        let item = &self.items[idx];
        if !needs_restock(item.on_hand, item.threshold, self.pending.contains_key(&item.sku)) {
            return Ok(None);
        }
        let delivery_tick = now
            .checked_add(self.restock_delay)
            .ok_or_else(|| LedgerError::Overflow(item.sku.clone()))?;
        let order = PendingRestock {
            sku:           item.sku.clone(),
            amount:        item.restock_amount,
            ordered_tick:  now,
            delivery_tick,
        };
        info!(
            sku = %order.sku,
            amount = order.amount,
            on_hand = item.on_hand,
            delivery = %order.delivery_tick,
            "restock ordered"
        );
        self.pending.insert(order.sku.clone(), order.clone());
        Ok(Some(order))
    }
}
