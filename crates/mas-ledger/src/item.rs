//! Inventory item configuration and live stock records.

use serde::{Deserialize, Serialize};

use mas_core::Sku;

use crate::{LedgerError, LedgerResult};

/// One entry of the `inventory` configuration array.
///
/// Every field is required; an incomplete entry fails at load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemSpec {
    pub sku:            Sku,
    pub title:          String,
    pub price:          f64,
    pub on_hand:        u32,
    pub threshold:      u32,
    pub restock_amount: u32,
}

/// Largest accepted unit price, in currency units.
pub const MAX_PRICE: f64 = 1e9;

/// Prices and revenue are held in millionths of a currency unit.
pub const MICROS_PER_UNIT: u64 = 1_000_000;

const MICROS_PER_CENT: u64 = MICROS_PER_UNIT / 100;

/// Live stock record.  Mutated only through [`InventoryLedger`](crate::InventoryLedger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub sku:            Sku,
    pub title:          String,
    pub price_micros:   u64,
    pub on_hand:        u32,
    pub threshold:      u32,
    pub restock_amount: u32,
}

impl InventoryItem {
    /// Validate a configuration entry.
    ///
    /// Prices must be finite and within `0..=MAX_PRICE`; they are kept to six
    /// decimals.
    pub fn from_spec(spec: ItemSpec) -> LedgerResult<Self> {
        if spec.sku.as_str().is_empty() {
            return Err(LedgerError::Validation("item with empty sku".into()));
        }
        if spec.restock_amount == 0 {
            return Err(LedgerError::Validation(format!(
                "{}: restockAmount must be positive",
                spec.sku
            )));
        }
        Ok(Self {
            price_micros:   price_to_micros(&spec.sku, spec.price)?,
            sku:            spec.sku,
            title:          spec.title,
            on_hand:        spec.on_hand,
            threshold:      spec.threshold,
            restock_amount: spec.restock_amount,
        })
    }

    /// Unit price in currency units.
    pub fn price(&self) -> f64 {
        micros_to_amount(self.price_micros)
    }
}

pub fn micros_to_amount(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_UNIT as f64
}

/// Round to whole cents, halves away from zero.
pub fn micros_to_cents(micros: u64) -> u64 {
    micros / MICROS_PER_CENT + u64::from(micros % MICROS_PER_CENT >= MICROS_PER_CENT / 2)
}

/// Convert integer cents to a currency amount with two decimals.
pub fn cents_to_amount(cents: u64) -> f64 {
    cents as f64 / 100.0
}

fn price_to_micros(sku: &Sku, price: f64) -> LedgerResult<u64> {
    if !price.is_finite() || price < 0.0 {
        return Err(LedgerError::Validation(format!("{sku}: invalid price {price}")));
    }
    if price > MAX_PRICE {
        return Err(LedgerError::Validation(format!(
            "{sku}: price {price} exceeds the maximum of {MAX_PRICE}"
        )));
    }
    Ok((price * MICROS_PER_UNIT as f64).round() as u64)
}
