use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HmmError {
    /// Malformed model parameters.  Fatal to that construction attempt.
    #[error("invalid state model: {0}")]
    Validation(String),

    /// An observation token outside the configured alphabet.  Local to the
    /// decode call that hit it; the model is untouched.
    #[error("unknown observation symbol {0:?}")]
    UnknownSymbol(String),
}

pub type HmmResult<T> = Result<T, HmmError>;
