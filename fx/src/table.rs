//! Per-base-currency exchange-rate tables.

use std::collections::HashMap;

use chrono::Duration;
use freightquote_common::{is_within_window, now, Currency, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The most recently fetched rate table for one base currency.
///
/// Maps target currency codes to conversion factors (units of target per one
/// unit of base). The base currency's own entry is implicit and never stored;
/// [`RateTable::factor`] short-circuits to 1 for it. Tables are replaced
/// wholesale on refresh, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// Base currency the factors are expressed against.
    pub base: Currency,
    /// When this table was fetched from the provider.
    #[serde(rename = "updatedAt")]
    pub fetched_at: Timestamp,
    /// Conversion factors keyed by target currency.
    pub rates: HashMap<Currency, Decimal>,
}

impl RateTable {
    /// Create a table fetched just now.
    ///
    /// Any entry for the base currency itself is stripped; it is implicit.
    pub fn new(base: Currency, mut rates: HashMap<Currency, Decimal>) -> Self {
        rates.remove(&base);
        Self {
            base,
            fetched_at: now(),
            rates,
        }
    }

    /// Create a table with an explicit fetch timestamp.
    pub fn with_fetched_at(
        base: Currency,
        fetched_at: Timestamp,
        mut rates: HashMap<Currency, Decimal>,
    ) -> Self {
        rates.remove(&base);
        Self {
            base,
            fetched_at,
            rates,
        }
    }

    /// Look up the conversion factor for a target currency.
    ///
    /// Returns 1 for the base currency without consulting the mapping.
    pub fn factor(&self, target: &Currency) -> Option<Decimal> {
        if *target == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(target).copied()
    }

    /// Whether this table is still within the freshness window.
    pub fn is_fresh(&self, window: Duration) -> bool {
        is_within_window(self.fetched_at, window)
    }

    /// Storage key for this table.
    pub fn storage_key(&self) -> String {
        Self::storage_key_for(&self.base)
    }

    /// Storage key for a base currency: `fx_<BASE>`, case-normalized upper.
    pub fn storage_key_for(base: &Currency) -> String {
        format!("fx_{}", base.code())
    }
}
