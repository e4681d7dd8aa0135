//! `CustomerAgent` — a shopper with a hidden mood.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use mas_bus::{MessagePayload, ResultStatus, Topic};
use mas_core::{AgentId, AgentRng, StateId, SymbolId};
use mas_hmm::{HmmError, StateModel};

use crate::{
    Agent, AgentContext, AgentError, AgentKind, AgentResult, EventPayload, InferenceEvent,
    ObservationEvent,
};

// ── Configuration ─────────────────────────────────────────────────────────────

/// The `behavior` configuration section.  Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerBehavior {
    /// Observation that may turn into a purchase request.
    pub purchase_symbol:        String,
    /// Chance a purchase-symbol observation becomes a request.
    pub purchase_probability:   f64,
    /// Chance of a hidden-state transition per activation.
    pub transition_probability: f64,
    /// Observations tallied as complaints by the metrics collector.
    pub complaint_symbol:       String,
    /// Observations tallied as silence by the metrics collector.
    pub silence_symbol:         String,
    /// Decode every `decode_interval` ticks.
    pub decode_interval:        u64,
    /// Keep at most this many recent observations for decoding.
    pub history_cap:            Option<usize>,
}

impl Default for CustomerBehavior {
    fn default() -> Self {
        Self {
            purchase_symbol:        "Purchase".into(),
            purchase_probability:   0.5,
            transition_probability: 0.3,
            complaint_symbol:       "Complaint".into(),
            silence_symbol:         "Silence".into(),
            decode_interval:        1,
            history_cap:            None,
        }
    }
}

impl CustomerBehavior {
    /// Check probabilities, intervals, and that the purchase symbol exists in
    /// `model`'s alphabet.
    pub fn validate(&self, model: &StateModel) -> AgentResult<()> {
        for (name, p) in [
            ("purchaseProbability", self.purchase_probability),
            ("transitionProbability", self.transition_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(AgentError::Config(format!("{name} {p} outside [0, 1]")));
            }
        }
        if self.decode_interval == 0 {
            return Err(AgentError::Config("decodeInterval must be at least 1".into()));
        }
        if self.history_cap == Some(0) {
            return Err(AgentError::Config("historyCap must be at least 1".into()));
        }
        model
            .symbol_id(&self.purchase_symbol)
            .ok_or_else(|| HmmError::UnknownSymbol(self.purchase_symbol.clone()))?;
        Ok(())
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Everything a customer knows about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerState {
    pub hidden:            StateId,
    /// Oldest first.  Bounded by `historyCap` when one is configured.
    pub history:           VecDeque<SymbolId>,
    /// Observations ever made, including any dropped from `history`.
    pub observation_count: u64,
    pub inferred:          Option<StateId>,
    pub log_prob:          f64,
    pub purchases:         u64,
    pub stockouts:         u64,
}

impl CustomerState {
    fn new(hidden: StateId) -> Self {
        Self {
            hidden,
            history: VecDeque::new(),
            observation_count: 0,
            inferred: None,
            log_prob: 0.0,
            purchases: 0,
            stockouts: 0,
        }
    }
}

/// Report view of one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub cust_id:           AgentId,
    /// `"Unknown"` until the first decode.
    pub inferred_state:    String,
    #[serde(rename = "logprob")]
    pub log_prob:          f64,
    pub observation_count: u64,
}

// ── Agent ─────────────────────────────────────────────────────────────────────

pub struct CustomerAgent {
    id:              AgentId,
    rng:             AgentRng,
    behavior:        Arc<CustomerBehavior>,
    purchase_symbol: SymbolId,
    state:           CustomerState,
}

impl CustomerAgent {
    /// Create a customer whose initial hidden state is drawn from the
    /// model's start distribution with the agent's own RNG stream.
    pub fn new(
        id:          AgentId,
        global_seed: u64,
        model:       &StateModel,
        behavior:    Arc<CustomerBehavior>,
    ) -> AgentResult<Self> {
        let purchase_symbol = model
            .symbol_id(&behavior.purchase_symbol)
            .ok_or_else(|| HmmError::UnknownSymbol(behavior.purchase_symbol.clone()))?;
        let mut rng = AgentRng::new(global_seed, id);
        let hidden = model.sample_initial_state(&mut rng);
        Ok(Self {
            id,
            rng,
            behavior,
            purchase_symbol,
            state: CustomerState::new(hidden),
        })
    }

    pub fn state(&self) -> &CustomerState {
        &self.state
    }

    fn record(&mut self, symbol: SymbolId) {
        self.state.history.push_back(symbol);
        self.state.observation_count += 1;
        if let Some(cap) = self.behavior.history_cap {
            while self.state.history.len() > cap {
                self.state.history.pop_front();
            }
        }
    }

    fn collect_results(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        let topic = Topic::PurchaseResult(self.id);
        for message in ctx.drain(topic) {
            match message.payload {
                MessagePayload::PurchaseResult { status: ResultStatus::Success, .. } => {
                    self.state.purchases += 1;
                }
                MessagePayload::PurchaseResult { status: ResultStatus::Stockout, .. } => {
                    self.state.stockouts += 1;
                }
                other => {
                    return Err(AgentError::Protocol { topic, detail: format!("{other:?}") });
                }
            }
        }
        Ok(())
    }
}

impl Agent for CustomerAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Customer
    }

    /// Observe from the current mood, maybe ask to buy, then maybe change
    /// mood.  The observation always reflects the pre-transition state.
    fn step(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        self.collect_results(ctx)?;

        let model = ctx.model();
        let hidden = self.state.hidden;
        let symbol = model.sample_observation(hidden, &mut self.rng);
        self.record(symbol);
        ctx.emit(EventPayload::Observation(ObservationEvent {
            agent:        self.id,
            symbol:       model.symbol_name(symbol).to_owned(),
            hidden_state: model.state_name(hidden).to_owned(),
        }));

        if symbol == self.purchase_symbol && self.rng.gen_bool(self.behavior.purchase_probability) {
            let weights = ctx.ledger().stock_weights();
            if let Some(idx) = self.rng.choose_weighted(&weights) {
                let sku = ctx.ledger().items()[idx].sku.clone();
                trace!(agent = %self.id, %sku, tick = %ctx.tick(), "purchase request");
                ctx.publish(
                    Topic::PurchaseRequest,
                    MessagePayload::PurchaseRequest { customer: self.id, sku, qty: 1 },
                );
            }
        }

        if self.rng.gen_bool(self.behavior.transition_probability) {
            self.state.hidden = model.sample_next_state(hidden, &mut self.rng);
        }
        Ok(())
    }

    /// Re-decode the observation history on decode ticks.
    fn on_tick_end(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        if self.state.history.is_empty() || !ctx.tick().is_multiple_of(self.behavior.decode_interval) {
            return Ok(());
        }
        let model = ctx.model();
        let history = self.state.history.make_contiguous();
        let decoded = model.decode(history)?;
        let Some(last) = decoded.last_state() else {
            return Ok(());
        };
        self.state.inferred = Some(last);
        self.state.log_prob = decoded.log_prob;
        ctx.emit(EventPayload::Inference(InferenceEvent {
            customer:       self.id,
            inferred_state: model.state_name(last).to_owned(),
            log_prob:       decoded.log_prob,
            observations:   decoded.states.len(),
        }));
        Ok(())
    }

    fn customer_snapshot(&self, model: &StateModel) -> Option<CustomerSnapshot> {
        Some(CustomerSnapshot {
            cust_id:           self.id,
            inferred_state:    self.state
                .inferred
                .map_or_else(|| "Unknown".to_owned(), |s| model.state_name(s).to_owned()),
            log_prob:          self.state.log_prob,
            observation_count: self.state.observation_count,
        })
    }
}
