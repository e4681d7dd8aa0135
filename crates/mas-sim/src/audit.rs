//! Fire-and-forget fact export for external bookkeeping.
//!
//! After each tick the scheduler turns the frozen event snapshot into
//! `(subject, predicate, object)` facts and hands them to the configured
//! [`AuditSink`].  Nothing in the run waits on, or reads back from, the sink.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use mas_agent::{Event, EventPayload, InventoryEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub subject:   String,
    pub predicate: String,
    pub object:    String,
}

impl Fact {
    pub fn new(
        subject:   impl Into<String>,
        predicate: impl Into<String>,
        object:    impl Into<String>,
    ) -> Self {
        Self { subject: subject.into(), predicate: predicate.into(), object: object.into() }
    }
}

pub trait AuditSink: Send {
    fn record(&mut self, fact: Fact);
}

/// Discards every fact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&mut self, _fact: Fact) {}
}

/// Keeps facts in memory.  Clones share one buffer, so a test can keep a
/// handle while the simulation owns the sink.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
    facts: Arc<Mutex<Vec<Fact>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facts(&self) -> Vec<Fact> {
        self.facts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.facts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&mut self, fact: Fact) {
        self.facts.lock().push(fact);
    }
}

/// Facts describing one tick's events.  Messages and inferences produce none.
pub fn facts_for(events: &[Event]) -> Vec<Fact> {
    let mut facts = Vec::new();
    for event in events {
        let tick = event.tick.0;
        match &event.payload {
            EventPayload::Observation(obs) => {
                let subject = format!("obs/{}/{tick}", obs.agent.0);
                facts.push(Fact::new(&subject, "observedBy", format!("customer/{}", obs.agent.0)));
                facts.push(Fact::new(&subject, "observationType", &obs.symbol));
                facts.push(Fact::new(subject, "atTick", tick.to_string()));
            }
            EventPayload::Inventory(InventoryEvent::Purchase { customer, sku, remaining, .. }) => {
                facts.push(Fact::new(format!("customer/{}", customer.0), "purchased", sku.as_str()));
                facts.push(Fact::new(format!("item/{sku}"), "onHand", remaining.to_string()));
            }
            EventPayload::Inventory(InventoryEvent::Stockout { customer, sku, .. }) => {
                facts.push(Fact::new(format!("customer/{}", customer.0), "missed", sku.as_str()));
            }
            EventPayload::Inventory(InventoryEvent::RestockOrdered { sku, delivery_tick, .. }) => {
                facts.push(Fact::new(format!("item/{sku}"), "restockDueAt", delivery_tick.0.to_string()));
            }
            EventPayload::Inventory(InventoryEvent::RestockDelivered { sku, on_hand, .. }) => {
                facts.push(Fact::new(format!("item/{sku}"), "onHand", on_hand.to_string()));
            }
            EventPayload::Message(_) | EventPayload::Inference(_) => {}
        }
    }
    facts
}
