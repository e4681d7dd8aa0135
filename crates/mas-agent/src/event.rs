//! The per-tick event log.
//!
//! Events exist only between emission and the tick's aggregation step: the
//! scheduler takes the whole log at the end of a tick, hands the frozen
//! snapshot to the metrics collector and to observers, and starts the next
//! tick with an empty log.
//!
//! Serialized shape:
//!
//! ```json
//! { "tick": 4, "type": "inventory",
//!   "payload": { "category": "restock_delivered", "sku": "BK-1", ... } }
//! ```

use serde::{Serialize, Serializer};

use mas_bus::Message;
use mas_core::{AgentId, Sku, Tick};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub tick: Tick,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    Observation(ObservationEvent),
    Message(Message),
    Inventory(InventoryEvent),
    Inference(InferenceEvent),
}

impl EventPayload {
    /// The `type` tag this payload serializes under.
    pub fn type_name(&self) -> &'static str {
        match self {
            EventPayload::Observation(_) => "observation",
            EventPayload::Message(_)     => "message",
            EventPayload::Inventory(_)   => "inventory",
            EventPayload::Inference(_)   => "inference",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationEvent {
    pub agent:        AgentId,
    pub symbol:       String,
    /// Hidden state the symbol was sampled from.
    pub hidden_state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum InventoryEvent {
    #[serde(rename_all = "camelCase")]
    Purchase {
        customer:         AgentId,
        sku:              Sku,
        title:            String,
        qty:               u32,
        #[serde(rename = "unitPrice", serialize_with = "micros_as_amount")]
        unit_price_micros: u64,
        remaining:         u32,
    },
    #[serde(rename_all = "camelCase")]
    Stockout {
        customer:  AgentId,
        sku:       Sku,
        title:     String,
        available: u32,
    },
    #[serde(rename_all = "camelCase")]
    RestockOrdered {
        sku:             Sku,
        title:           String,
        amount:          u32,
        ordered_tick:    Tick,
        delivery_tick:   Tick,
        ticks_remaining: u64,
    },
    #[serde(rename_all = "camelCase")]
    RestockDelivered {
        sku:          Sku,
        title:        String,
        amount:       u32,
        on_hand:      u32,
        ordered_tick: Tick,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceEvent {
    pub customer:       AgentId,
    pub inferred_state: String,
    pub log_prob:       f64,
    /// History length the decode ran over.
    pub observations:   usize,
}

/// Append-only log for the tick in progress.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, tick: Tick, payload: EventPayload) {
        self.events.push(Event { tick, payload });
    }

    /// Hand over every event logged so far and leave the log empty.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn micros_as_amount<S: Serializer>(micros: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(mas_ledger::item::micros_to_amount(*micros))
}
