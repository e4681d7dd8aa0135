//! `mas-core` — foundational types for the retail marketplace simulation.
//!
//! This crate is a dependency of every other `mas-*` crate.  It intentionally
//! has no `mas-*` dependencies and minimal external ones (only `rand`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `StateId`, `SymbolId`, `ConversationId`, `Sku`     |
//! | [`time`]        | `Tick`, `SimClock`                                            |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (activation order)           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by the event log and per-tick reports.            |

pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{AgentId, ConversationId, Sku, StateId, SymbolId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, Tick};
