//! FX cache error types.

use freightquote_common::CurrencyPair;
use thiserror::Error;

/// Errors that can occur in the rate cache.
#[derive(Debug, Error)]
pub enum FxError {
    /// Provider request failed (network error or non-2xx status).
    #[error("Rate provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider responded but the payload could not be used.
    #[error("Malformed rate payload from {provider}: {detail}")]
    MalformedPayload { provider: String, detail: String },

    /// Target currency missing from a successfully fetched table.
    #[error("No rate for {0} in fetched table")]
    UnsupportedCurrency(CurrencyPair),

    /// Storage backend failure.
    #[error("Rate store error: {0}")]
    Store(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
