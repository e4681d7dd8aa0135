//! `MetricsCollector` — folds each tick's frozen event snapshot into running
//! counters.

use serde::{Serialize, Serializer};

use mas_agent::{CustomerBehavior, Event, EventPayload, InventoryEvent};
use mas_ledger::item::{cents_to_amount, micros_to_cents};

use crate::{SimError, SimResult};

/// Running counters.  Monotone; never reset during a run.
///
/// Revenue is summed exactly in millionths of a currency unit and reported
/// rounded to two decimals, so after `n` sales at price `p` it reads
/// `round(n * p, 2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub purchases:      u64,
    pub stockouts:      u64,
    /// Restock deliveries applied.
    pub restocks:       u64,
    pub complaints:     u64,
    pub silence:        u64,
    #[serde(rename = "revenue", serialize_with = "micros_as_cents")]
    pub revenue_micros: u64,
    pub restock_orders: u64,
    pub inferences:     u64,
}

impl Metrics {
    pub fn revenue_cents(&self) -> u64 {
        micros_to_cents(self.revenue_micros)
    }

    /// Revenue in currency units, rounded to two decimals.
    pub fn revenue(&self) -> f64 {
        cents_to_amount(self.revenue_cents())
    }
}

fn micros_as_cents<S: Serializer>(micros: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(cents_to_amount(micros_to_cents(*micros)))
}

/// Owns the run's [`Metrics`].  The only writer of the counters.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics:          Metrics,
    complaint_symbol: String,
    silence_symbol:   String,
}

impl MetricsCollector {
    pub fn new(complaint_symbol: impl Into<String>, silence_symbol: impl Into<String>) -> Self {
        Self {
            metrics:          Metrics::default(),
            complaint_symbol: complaint_symbol.into(),
            silence_symbol:   silence_symbol.into(),
        }
    }

    pub fn from_behavior(behavior: &CustomerBehavior) -> Self {
        Self::new(behavior.complaint_symbol.clone(), behavior.silence_symbol.clone())
    }

    /// Add one tick's events to the counters.
    ///
    /// Takes a shared slice: the collector reads the snapshot and can never
    /// append to the log it is counting.  On error the counters are left as
    /// they were before the call.
    ///
    /// # Errors
    ///
    /// [`SimError::Overflow`] if revenue would exceed `u64::MAX` micros.
    pub fn fold(&mut self, events: &[Event]) -> SimResult<()> {
        let mut next = self.metrics;
        let m = &mut next;
        for event in events {
            match &event.payload {
                EventPayload::Observation(obs) => {
                    if obs.symbol == self.complaint_symbol {
                        m.complaints += 1;
                    } else if obs.symbol == self.silence_symbol {
                        m.silence += 1;
                    }
                }
                EventPayload::Inventory(inv) => match inv {
                    InventoryEvent::Purchase { qty, unit_price_micros, .. } => {
                        let revenue = u64::from(*qty)
                            .checked_mul(*unit_price_micros)
                            .and_then(|sale| m.revenue_micros.checked_add(sale))
                            .ok_or(SimError::Overflow("revenue"))?;
                        m.purchases += 1;
                        m.revenue_micros = revenue;
                    }
                    InventoryEvent::Stockout { .. }         => m.stockouts += 1,
                    InventoryEvent::RestockOrdered { .. }   => m.restock_orders += 1,
                    InventoryEvent::RestockDelivered { .. } => m.restocks += 1,
                },
                EventPayload::Inference(_) => m.inferences += 1,
                EventPayload::Message(_) => {}
            }
        }
        self.metrics = next;
        Ok(())
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }
}
