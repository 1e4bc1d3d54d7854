//! FreightQuote Quote Engine
//!
//! Deterministic, itemized freight quotes: a pure breakdown computation in a
//! base currency, re-expressed into a display currency through the rate
//! cache in `freightquote-fx`.
//!
//! # Example
//!
//! ```rust,ignore
//! use freightquote_quoting::{QuoteEngine, ShipmentInput, Tariff};
//! use freightquote_common::Currency;
//!
//! let engine = QuoteEngine::new(rates, Tariff::default(), Currency::usd());
//! let breakdown = engine.quote(&input, &Currency::eur()).await?;
//! ```

pub mod breakdown;
pub mod engine;
pub mod error;
pub mod format;
pub mod presentation;
pub mod shipment;
pub mod tariff;

pub use breakdown::QuoteBreakdown;
pub use engine::QuoteEngine;
pub use error::{QuoteError, QuoteResult};
pub use format::{format, format_money, Locale};
pub use presentation::customer_message;
pub use shipment::{ContainerKind, Incoterm, ShipmentInput, ShipmentMode};
pub use tariff::Tariff;
