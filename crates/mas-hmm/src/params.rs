//! Raw model parameters as they appear in configuration.

use serde::{Deserialize, Serialize};

use crate::{HmmResult, StateModel};

/// Unvalidated HMM tables, deserialized from the `hmm` configuration section.
///
/// ```json
/// {
///   "states":       ["Happy", "Neutral", "Unhappy"],
///   "observations": ["Purchase", "Complaint", "Silence"],
///   "start":        [0.5, 0.3, 0.2],
///   "transition":   [[0.7, 0.2, 0.1], [0.2, 0.6, 0.2], [0.1, 0.3, 0.6]],
///   "emission":     [[0.6, 0.1, 0.3], [0.3, 0.2, 0.5], [0.1, 0.6, 0.3]]
/// }
/// ```
///
/// Call [`HmmParams::build`] (or [`StateModel::new`]) to validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HmmParams {
    pub states:       Vec<String>,
    pub observations: Vec<String>,
    pub start:        Vec<f64>,
    pub transition:   Vec<Vec<f64>>,
    pub emission:     Vec<Vec<f64>>,
}

impl HmmParams {
    /// Validate and freeze into a [`StateModel`].
    pub fn build(&self) -> HmmResult<StateModel> {
        StateModel::new(self.clone())
    }
}
