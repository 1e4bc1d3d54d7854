//! Quote engine error types.

use freightquote_fx::FxError;
use thiserror::Error;

/// Errors that can occur while computing or converting a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Malformed shipment input; the violated constraint is named.
    #[error("Invalid shipment input: {field} {constraint}")]
    Validation {
        field: &'static str,
        constraint: String,
    },

    /// Rate lookup failed during conversion. Never swallowed.
    #[error("Exchange rate lookup failed: {0}")]
    Fx(#[from] FxError),
}

impl QuoteError {
    pub(crate) fn validation(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::Validation {
            field,
            constraint: constraint.into(),
        }
    }
}

/// Result type for quoting operations.
pub type QuoteResult<T> = Result<T, QuoteError>;
