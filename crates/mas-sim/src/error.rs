use mas_agent::AgentError;
use mas_hmm::HmmError;
use mas_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Incomplete or malformed configuration, including JSON decode failures.
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("state model: {0}")]
    Hmm(#[from] HmmError),

    #[error("inventory: {0}")]
    Ledger(#[from] LedgerError),

    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    /// A running counter would pass its integer range.
    #[error("{0} counter overflowed")]
    Overflow(&'static str),

    /// Operation not allowed in the current lifecycle phase.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// `true` for errors raised while checking a configuration.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SimError::Config(_)
                | SimError::Hmm(HmmError::Validation(_))
                | SimError::Ledger(LedgerError::Validation(_))
                | SimError::Agent(AgentError::Config(_))
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
