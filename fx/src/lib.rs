//! FreightQuote FX
//!
//! Time-bounded exchange-rate cache backed by an external HTTP provider.
//!
//! # Features
//!
//! - Per-base-currency rate tables with a 24-hour freshness window
//! - Whole-table replacement on refresh (never merged)
//! - Coalesced refreshes: at most one in-flight provider call per base
//! - Pluggable storage backends (in-memory, JSON files on disk)
//!
//! # Example
//!
//! ```rust,ignore
//! use freightquote_fx::{HttpRateProvider, MemoryRateStore, RateCache, RateCacheConfig};
//! use freightquote_common::Currency;
//!
//! let provider = HttpRateProvider::new("https://api.example.com".parse()?);
//! let cache = RateCache::new(Arc::new(provider), Arc::new(MemoryRateStore::new()));
//!
//! let factor = cache.get_rate(&Currency::usd(), &Currency::eur()).await?;
//! ```

pub mod cache;
pub mod error;
pub mod provider;
pub mod store;
pub mod table;

pub use cache::{RateCache, RateCacheConfig, RateLookup, RateSource};
pub use error::{FxError, FxResult};
pub use provider::{HttpRateProvider, RateProvider};
pub use store::{JsonFileRateStore, MemoryRateStore, RateStore};
pub use table::RateTable;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
