//! `mas-sim` — tick scheduler and run lifecycle for the retail marketplace
//! simulation.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 1..=config.ticks:
//!   ① Deliveries — supplier drains restock_request; due restocks applied,
//!                  restock_delivered events, restock_done messages.
//!   ② Order      — permutation of the roster from (seed, tick).
//!   ③ Step       — each agent acts once, in permutation order.
//!   ④ Inference  — on_tick_end per agent, ascending id (customers decode).
//!   ⑤ Aggregate  — event log taken, folded into Metrics, audit facts
//!                  recorded, TickReport returned.
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`config`]     | `SimulationConfig` — JSON configuration, validation          |
//! | [`builder`]    | `SimBuilder` — roster construction                           |
//! | [`sim`]        | `Sim` — the simulation context and tick loop                 |
//! | [`metrics`]    | `Metrics`, `MetricsCollector`                                |
//! | [`report`]     | `TickReport`                                                 |
//! | [`observer`]   | `SimObserver`, `NoopObserver`, `CollectingObserver`          |
//! | [`audit`]      | `Fact`, `AuditSink`, `NoopAuditSink`, `MemoryAuditSink`      |
//! | [`controller`] | `SimController` — configure/start/stop/step/metrics/status   |
//! | [`error`]      | `SimError`, `SimResult<T>`                                   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use mas_sim::{NoopObserver, SimBuilder, SimulationConfig};
//!
//! let config = SimulationConfig::from_path("bookstore.json")?;
//! let mut sim = SimBuilder::new(config).build()?;
//! let metrics = sim.run(&mut NoopObserver)?;
//! ```

pub mod audit;
pub mod builder;
pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod report;
pub mod sim;

#[cfg(test)]
mod tests;

pub use audit::{AuditSink, Fact, MemoryAuditSink, NoopAuditSink};
pub use builder::{AgentFactory, SimBuilder};
pub use config::SimulationConfig;
pub use controller::{ControllerStatus, RunPhase, SimController, DEFAULT_TICK_INTERVAL};
pub use error::{SimError, SimResult};
pub use metrics::{Metrics, MetricsCollector};
pub use observer::{CollectingObserver, NoopObserver, SimObserver};
pub use report::TickReport;
pub use sim::Sim;
