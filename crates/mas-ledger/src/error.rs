use mas_core::Sku;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("unknown sku {0}")]
    UnknownSku(Sku),

    /// Missing or malformed inventory configuration.
    #[error("invalid inventory: {0}")]
    Validation(String),

    /// A stock count or delivery tick for this SKU would overflow.
    #[error("stock count or delivery tick for {0} would overflow")]
    Overflow(Sku),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
