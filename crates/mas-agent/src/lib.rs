//! `mas-agent` — what agents are and what they may touch.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                          |
//! |--------------|-------------------------------------------------------------------|
//! | [`agent`]    | `Agent` trait, `AgentKind`                                        |
//! | [`context`]  | `AgentContext<'a>` — per-activation capability handle             |
//! | [`event`]    | `Event`, `EventPayload`, `InventoryEvent`, `EventLog`             |
//! | [`customer`] | `CustomerAgent`, `CustomerState`, `CustomerBehavior`, snapshots   |
//! | [`service`]  | `ServiceAgent` — serves purchase requests, places restock orders  |
//! | [`catalog`]  | `CatalogAgent` — passive per-SKU presence                         |
//! | [`error`]    | `AgentError`, `AgentResult<T>`                                    |
//!
//! # Ownership
//!
//! Agents never hold references to the scheduler or to each other.  For the
//! duration of one activation the scheduler lends an [`AgentContext`] that
//! borrows exactly the mailbox, the ledger, the state model, and the tick's
//! event log; the borrow ends when the activation returns.
//!
//! # Per-tick protocol
//!
//! ```text
//! step (permutation order)     Customer: drain own results → observe → maybe request → maybe transition
//!                              Service:  drain restock_done → serve purchase_request → review restocks
//! on_tick_end (id order)       Customer: decode history every `decodeInterval` ticks
//! ```

pub mod agent;
pub mod catalog;
pub mod context;
pub mod customer;
pub mod error;
pub mod event;
pub mod service;


pub use agent::{Agent, AgentKind};
pub use catalog::CatalogAgent;
pub use context::AgentContext;
pub use customer::{CustomerAgent, CustomerBehavior, CustomerSnapshot, CustomerState};
pub use error::{AgentError, AgentResult};
pub use event::{
    Event, EventLog, EventPayload, InferenceEvent, InventoryEvent, ObservationEvent,
};
pub use service::ServiceAgent;
