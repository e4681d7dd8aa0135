//! The `Agent` trait — one entry per roster slot.

use serde::Serialize;

use mas_core::AgentId;
use mas_hmm::StateModel;

use crate::{AgentContext, AgentResult, CustomerSnapshot};

/// Role of an agent in the roster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Customer,
    Service,
    Catalog,
    /// Externally supplied agent types.
    Other,
}

/// An actor driven by the scheduler.
///
/// The scheduler calls [`step`](Self::step) exactly once per tick, in that
/// tick's random activation order, then [`on_tick_end`](Self::on_tick_end)
/// once per agent in ascending id order.  Everything an agent may read or
/// change is reachable through the [`AgentContext`].
///
/// `Send` so a whole simulation can move onto a worker thread.
pub trait Agent: Send {
    fn id(&self) -> AgentId;

    fn kind(&self) -> AgentKind;

    /// The agent's per-tick action.
    fn step(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()>;

    /// Called after every agent has stepped this tick.
    ///
    /// Default: does nothing.
    fn on_tick_end(&mut self, _ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        Ok(())
    }

    /// Report view for customer-like agents.
    ///
    /// Default: `None` (not a customer).
    fn customer_snapshot(&self, _model: &StateModel) -> Option<CustomerSnapshot> {
        None
    }
}
