//! `StateModel` — validated HMM parameters plus precomputed samplers.

use std::collections::HashMap;

use rand::distributions::WeightedIndex;

use mas_core::{AgentRng, StateId, SymbolId};

use crate::viterbi::{self, Decoded};
use crate::{HmmError, HmmParams, HmmResult};

/// Allowed deviation of any distribution's sum from 1.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// A validated, immutable discrete hidden-Markov model.
///
/// Construction checks every invariant once; afterwards all operations are
/// pure reads apart from the caller-supplied RNG.  Log-probabilities and
/// per-row categorical samplers are computed up front so sampling and
/// decoding never re-derive them.
#[derive(Debug, Clone)]
pub struct StateModel {
    params: HmmParams,

    pub(crate) log_start:      Vec<f64>,
    pub(crate) log_transition: Vec<Vec<f64>>,
    pub(crate) log_emission:   Vec<Vec<f64>>,

    start_dist:      WeightedIndex<f64>,
    transition_dist: Vec<WeightedIndex<f64>>,
    emission_dist:   Vec<WeightedIndex<f64>>,

    state_index:  HashMap<String, StateId>,
    symbol_index: HashMap<String, SymbolId>,
}

impl StateModel {
    /// Validate `params` and build the model.
    ///
    /// # Errors
    ///
    /// [`HmmError::Validation`] if the state set or alphabet is empty or has
    /// duplicates, a table has the wrong shape, an entry is negative or not
    /// finite, or any distribution does not sum to 1 within
    /// [`SUM_TOLERANCE`].
    pub fn new(params: HmmParams) -> HmmResult<Self> {
        let n_states = params.states.len();
        let n_obs = params.observations.len();

        let state_index = index_names(&params.states, "state")?
            .into_iter()
            .map(|(name, i)| (name, StateId(i)))
            .collect();
        let symbol_index = index_names(&params.observations, "observation")?
            .into_iter()
            .map(|(name, i)| (name, SymbolId(i)))
            .collect();

        check_distribution("start", &params.start, n_states)?;

        if params.transition.len() != n_states {
            return Err(HmmError::Validation(format!(
                "transition has {} rows, expected {n_states}",
                params.transition.len()
            )));
        }
        for (i, row) in params.transition.iter().enumerate() {
            check_distribution(&format!("transition row {i}"), row, n_states)?;
        }

        if params.emission.len() != n_states {
            return Err(HmmError::Validation(format!(
                "emission has {} rows, expected {n_states}",
                params.emission.len()
            )));
        }
        for (i, row) in params.emission.iter().enumerate() {
            check_distribution(&format!("emission row {i}"), row, n_obs)?;
        }

        Ok(Self {
            log_start:       ln_row(&params.start),
            log_transition:  params.transition.iter().map(|r| ln_row(r)).collect(),
            log_emission:    params.emission.iter().map(|r| ln_row(r)).collect(),
            start_dist:      sampler("start", &params.start)?,
            transition_dist: rows_sampler("transition", &params.transition)?,
            emission_dist:   rows_sampler("emission", &params.emission)?,
            state_index,
            symbol_index,
            params,
        })
    }

    // ── Introspection ─────────────────────────────────────────────────────

    #[inline]
    pub fn state_count(&self) -> usize {
        self.params.states.len()
    }

    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.params.observations.len()
    }

    /// The parameters this model was built from.
    pub fn params(&self) -> &HmmParams {
        &self.params
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.state_index.get(name).copied()
    }

    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.symbol_index.get(name).copied()
    }

    /// # Panics
    /// Panics if `state` was not produced by this model.
    pub fn state_name(&self, state: StateId) -> &str {
        &self.params.states[state.index()]
    }

    /// # Panics
    /// Panics if `symbol` was not produced by this model.
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        &self.params.observations[symbol.index()]
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// Draw an initial hidden state from the start distribution.
    pub fn sample_initial_state(&self, rng: &mut AgentRng) -> StateId {
        StateId(rng.sample(&self.start_dist) as u16)
    }

    /// Categorical draw over `state`'s emission row.
    ///
    /// # Panics
    /// Panics if `state` was not produced by this model.
    pub fn sample_observation(&self, state: StateId, rng: &mut AgentRng) -> SymbolId {
        SymbolId(rng.sample(&self.emission_dist[state.index()]) as u16)
    }

    /// Categorical draw over `state`'s transition row.
    ///
    /// # Panics
    /// Panics if `state` was not produced by this model.
    pub fn sample_next_state(&self, state: StateId, rng: &mut AgentRng) -> StateId {
        StateId(rng.sample(&self.transition_dist[state.index()]) as u16)
    }

    // ── Decoding ──────────────────────────────────────────────────────────

    /// Most probable hidden-state path for `observations` (Viterbi, log space).
    ///
    /// An empty sequence decodes to `([], 0.0)`.
    ///
    /// # Errors
    ///
    /// [`HmmError::UnknownSymbol`] if any id is outside the alphabet.
    pub fn decode(&self, observations: &[SymbolId]) -> HmmResult<Decoded> {
        if let Some(bad) = observations.iter().find(|o| o.index() >= self.symbol_count()) {
            return Err(HmmError::UnknownSymbol(bad.to_string()));
        }
        Ok(viterbi::run(self, observations))
    }

    /// Like [`decode`](Self::decode) but takes observation names.
    pub fn decode_symbols<S: AsRef<str>>(&self, observations: &[S]) -> HmmResult<Decoded> {
        let ids = observations
            .iter()
            .map(|o| {
                self.symbol_id(o.as_ref())
                    .ok_or_else(|| HmmError::UnknownSymbol(o.as_ref().to_owned()))
            })
            .collect::<HmmResult<Vec<_>>>()?;
        self.decode(&ids)
    }

    /// State names for a decoded path.
    pub fn path_names(&self, decoded: &Decoded) -> Vec<String> {
        decoded.states.iter().map(|&s| self.state_name(s).to_owned()).collect()
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

fn index_names(names: &[String], what: &str) -> HmmResult<HashMap<String, u16>> {
    if names.is_empty() {
        return Err(HmmError::Validation(format!("{what} set is empty")));
    }
    if names.len() >= u16::MAX as usize {
        return Err(HmmError::Validation(format!(
            "{} {what}s exceed the supported maximum of {}",
            names.len(),
            u16::MAX
        )));
    }
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.clone(), i as u16).is_some() {
            return Err(HmmError::Validation(format!("duplicate {what} {name:?}")));
        }
    }
    Ok(index)
}

fn check_distribution(what: &str, row: &[f64], expected_len: usize) -> HmmResult<()> {
    if row.len() != expected_len {
        return Err(HmmError::Validation(format!(
            "{what} has {} entries, expected {expected_len}",
            row.len()
        )));
    }
    if let Some(p) = row.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(HmmError::Validation(format!(
            "{what} contains invalid probability {p}"
        )));
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(HmmError::Validation(format!(
            "{what} sums to {sum}, expected 1"
        )));
    }
    Ok(())
}

fn ln_row(row: &[f64]) -> Vec<f64> {
    // ln(0) = -inf, which the max-plus recursion handles naturally.
    row.iter().map(|p| p.ln()).collect()
}

fn sampler(what: &str, row: &[f64]) -> HmmResult<WeightedIndex<f64>> {
    WeightedIndex::new(row)
        .map_err(|e| HmmError::Validation(format!("{what}: {e}")))
}

fn rows_sampler(what: &str, rows: &[Vec<f64>]) -> HmmResult<Vec<WeightedIndex<f64>>> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| sampler(&format!("{what} row {i}"), r))
        .collect()
}
