use mas_bus::Topic;
use mas_hmm::HmmError;
use mas_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("state model: {0}")]
    Hmm(#[from] HmmError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// A message whose payload does not belong on the topic it arrived on.
    #[error("unexpected payload on {topic}: {detail}")]
    Protocol { topic: Topic, detail: String },

    #[error("behavior configuration error: {0}")]
    Config(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
