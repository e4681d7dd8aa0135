//! `mas-hmm` — the probabilistic state model behind customer moods.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`params`]    | `HmmParams` — raw start/transition/emission tables (serde)   |
//! | [`model`]     | `StateModel` — validated, immutable model; sampling          |
//! | [`viterbi`]   | `Decoded` and the log-space Viterbi dynamic program          |
//! | [`error`]     | `HmmError`, `HmmResult<T>`                                   |
//!
//! # Model
//!
//! A discrete HMM over an ordered state set `S` and an ordered observation
//! alphabet `O`:
//!
//! ```text
//! start       : |S|        start[s]         = P(x₀ = s)
//! transition  : |S| × |S|  transition[s][s'] = P(xₜ₊₁ = s' | xₜ = s)
//! emission    : |S| × |O|  emission[s][o]    = P(yₜ = o | xₜ = s)
//! ```
//!
//! Every distribution must sum to 1 within `1e-6`.  A `StateModel` is
//! validated once at construction and never changes afterwards, so it can be
//! shared freely by reference.
//!
//! There is exactly one decoder, [`StateModel::decode`]; the name-based
//! [`StateModel::decode_symbols`] resolves names and delegates to it.

pub mod error;
pub mod model;
pub mod params;
pub mod viterbi;


pub use error::{HmmError, HmmResult};
pub use model::StateModel;
pub use params::HmmParams;
pub use viterbi::Decoded;
