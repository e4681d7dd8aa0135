//! Log-space Viterbi decoding.
//!
//! ```text
//! δ[s, 0] = ln start[s] + ln emission[s, o₀]
//! δ[s, t] = max_{s'} (δ[s', t-1] + ln transition[s', s]) + ln emission[s, oₜ]
//! ψ[s, t] = argmax_{s'} (δ[s', t-1] + ln transition[s', s])
//! ```
//!
//! The path is recovered by backtracking ψ from `argmax_s δ[s, T-1]`; the
//! reported log-probability is `δ[best, T-1]`.  Ties resolve to the lowest
//! state index.  Cost is O(T·|S|²) time and O(T·|S|) memory.

use mas_core::{StateId, SymbolId};

use crate::StateModel;

/// Result of a decode: the most probable state path and its joint
/// log-probability with the observations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decoded {
    pub states:   Vec<StateId>,
    pub log_prob: f64,
}

impl Decoded {
    /// Final state of the path, i.e. the current inferred state.
    pub fn last_state(&self) -> Option<StateId> {
        self.states.last().copied()
    }
}

/// Run the dynamic program.  `obs` must already be range-checked.
pub(crate) fn run(model: &StateModel, obs: &[SymbolId]) -> Decoded {
    if obs.is_empty() {
        return Decoded { states: Vec::new(), log_prob: 0.0 };
    }

    let n = model.state_count();
    let t_len = obs.len();

    // Row-major [t][s] tables.
    let mut delta = vec![f64::NEG_INFINITY; t_len * n];
    let mut psi = vec![0usize; t_len * n];

    let first = obs[0].index();
    for s in 0..n {
        delta[s] = model.log_start[s] + model.log_emission[s][first];
    }

    for t in 1..t_len {
        let o = obs[t].index();
        let (prev, cur) = delta.split_at_mut(t * n);
        let prev = &prev[(t - 1) * n..];
        for s in 0..n {
            let (best_prev, best_score) = argmax((0..n).map(|sp| prev[sp] + model.log_transition[sp][s]));
            cur[s] = best_score + model.log_emission[s][o];
            psi[t * n + s] = best_prev;
        }
    }

    let (mut state, log_prob) = argmax(delta[(t_len - 1) * n..].iter().copied());

    let mut states = vec![StateId(0); t_len];
    states[t_len - 1] = StateId(state as u16);
    for t in (1..t_len).rev() {
        state = psi[t * n + state];
        states[t - 1] = StateId(state as u16);
    }

    Decoded { states, log_prob }
}

/// Index and value of the first maximum; `(0, -inf)` if every score is -inf.
fn argmax(scores: impl Iterator<Item = f64>) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, v) in scores.enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}
