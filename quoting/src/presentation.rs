//! Customer-facing relabeling of internal error kinds.
//!
//! Pure presentation: a stateless mapping from result kinds to display
//! copy. The cache and engine never depend on this module.

use freightquote_fx::FxError;

use crate::error::QuoteError;

/// Map an internal error to customer-facing copy.
pub fn customer_message(error: &QuoteError) -> String {
    match error {
        QuoteError::Validation { field, constraint } => {
            format!("Please check the shipment details: {field} {constraint}.")
        }
        QuoteError::Fx(FxError::ProviderUnavailable(_))
        | QuoteError::Fx(FxError::MalformedPayload { .. }) => {
            "Live exchange rates are temporarily unavailable. Please try again in a few minutes."
                .to_string()
        }
        QuoteError::Fx(FxError::UnsupportedCurrency(pair)) => format!(
            "We can't show prices in {} yet. Please pick another display currency.",
            pair.quote
        ),
        QuoteError::Fx(FxError::Store(_)) => {
            "We couldn't prepare your quote just now. Please try again.".to_string()
        }
    }
}
