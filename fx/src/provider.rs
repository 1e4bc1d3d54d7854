//! Rate provider trait and implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use freightquote_common::{constants, Currency};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{FxError, FxResult};
use crate::table::RateTable;

/// Trait for exchange-rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch a rate table for a base currency.
    ///
    /// An empty `symbols` slice requests the provider's full table for the
    /// base; a non-empty slice may restrict the response to those targets.
    async fn fetch_table(&self, base: &Currency, symbols: &[Currency]) -> FxResult<RateTable>;
}

/// Payload shape of the provider's `latest` endpoint.
#[derive(Debug, Deserialize)]
struct LatestRatesPayload {
    base: String,
    rates: HashMap<String, Decimal>,
}

/// HTTP rate provider.
///
/// Issues `GET <base_url>/latest?base=<CODE>&symbols=<CODE,...>` and expects
/// a JSON body of `{ "base": string, "rates": { code: number } }`.
pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: Url,
    name: String,
}

impl HttpRateProvider {
    /// Create a provider with a default client and request timeout.
    pub fn new(base_url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(constants::provider_request_timeout())
            .build()
            .unwrap_or_default();
        Self::with_client(client, base_url)
    }

    /// Create a provider with a caller-supplied client.
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        let name = base_url.host_str().unwrap_or("fx-provider").to_string();
        Self {
            client,
            base_url,
            name,
        }
    }

    fn latest_url(&self, base: &Currency, symbols: &[Currency]) -> FxResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FxError::ProviderUnavailable("provider URL cannot be a base".into()))?
            .pop_if_empty()
            .push("latest");

        url.query_pairs_mut().append_pair("base", base.code());
        if !symbols.is_empty() {
            let joined = symbols
                .iter()
                .map(Currency::code)
                .collect::<Vec<_>>()
                .join(",");
            url.query_pairs_mut().append_pair("symbols", &joined);
        }
        Ok(url)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_table(&self, base: &Currency, symbols: &[Currency]) -> FxResult<RateTable> {
        let url = self.latest_url(base, symbols)?;
        debug!(provider = %self.name, %base, %url, "Fetching rate table");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FxError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::ProviderUnavailable(format!(
                "{} returned {}",
                self.name, status
            )));
        }

        let payload: LatestRatesPayload = response.json().await.map_err(|e| {
            FxError::MalformedPayload {
                provider: self.name.clone(),
                detail: e.to_string(),
            }
        })?;

        // A table echoed for another base would be stored under the wrong
        // key and must never be accepted.
        if payload.base.to_uppercase() != base.code() {
            return Err(FxError::MalformedPayload {
                provider: self.name.clone(),
                detail: format!("requested base {} but payload is for {}", base, payload.base),
            });
        }

        let mut rates = HashMap::with_capacity(payload.rates.len());
        for (code, factor) in payload.rates {
            if factor <= Decimal::ZERO {
                return Err(FxError::MalformedPayload {
                    provider: self.name.clone(),
                    detail: format!("non-positive factor {} for {}", factor, code),
                });
            }
            rates.insert(Currency::new(code), factor);
        }

        Ok(RateTable::new(base.clone(), rates))
    }
}

/// Mock rate provider for testing.
///
/// Records how many fetches were issued so tests can assert cache reuse and
/// refresh coalescing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    tables: dashmap::DashMap<String, HashMap<Currency, Decimal>>,
    fetch_count: std::sync::atomic::AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
    delay: std::sync::Mutex<Option<std::time::Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            fetch_count: std::sync::atomic::AtomicUsize::new(0),
            fail: std::sync::atomic::AtomicBool::new(false),
            delay: std::sync::Mutex::new(None),
        }
    }

    /// Set the full table served for a base currency.
    pub fn set_table(&self, base: Currency, rates: HashMap<Currency, Decimal>) {
        self.tables.insert(base.code().to_string(), rates);
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Make subsequent fetches fail with `ProviderUnavailable`.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Delay each fetch, for exercising concurrent lookups.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_table(&self, base: &Currency, symbols: &[Currency]) -> FxResult<RateTable> {
        self.fetch_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::ProviderUnavailable("mock failure".into()));
        }

        let full = self
            .tables
            .get(base.code())
            .map(|t| t.clone())
            .ok_or_else(|| FxError::ProviderUnavailable(format!("no table for {}", base)))?;

        let rates = if symbols.is_empty() {
            full
        } else {
            full.into_iter()
                .filter(|(code, _)| symbols.contains(code))
                .collect()
        };

        Ok(RateTable::new(base.clone(), rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;

    fn provider_for(server: &MockServer) -> HttpRateProvider {
        HttpRateProvider::new(server.base_url().parse().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_table() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/latest")
                    .query_param("base", "USD")
                    .query_param("symbols", "EUR,GBP");
                then.status(200)
                    .json_body(serde_json::json!({
                        "base": "USD",
                        "rates": { "EUR": 0.92, "GBP": 0.79 }
                    }));
            })
            .await;

        let provider = provider_for(&server);
        let table = provider
            .fetch_table(&Currency::usd(), &[Currency::eur(), Currency::gbp()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(table.base, Currency::usd());
        assert_eq!(table.factor(&Currency::eur()), Some(dec!(0.92)));
        assert_eq!(table.factor(&Currency::gbp()), Some(dec!(0.79)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_hard_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest");
                then.status(503);
            })
            .await;

        let provider = provider_for(&server);
        let result = provider.fetch_table(&Currency::usd(), &[]).await;

        assert!(matches!(result, Err(FxError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest");
                then.status(200).body("not json");
            })
            .await;

        let provider = provider_for(&server);
        let result = provider.fetch_table(&Currency::usd(), &[]).await;

        assert!(matches!(result, Err(FxError::MalformedPayload { .. })));
    }

    #[tokio::test]
    async fn test_mismatched_base_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest");
                then.status(200).json_body(serde_json::json!({
                    "base": "EUR",
                    "rates": { "USD": 1.09 }
                }));
            })
            .await;

        let provider = provider_for(&server);
        let result = provider.fetch_table(&Currency::usd(), &[]).await;

        assert!(matches!(result, Err(FxError::MalformedPayload { .. })));
    }

    #[tokio::test]
    async fn test_non_positive_factor_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest");
                then.status(200).json_body(serde_json::json!({
                    "base": "USD",
                    "rates": { "EUR": 0 }
                }));
            })
            .await;

        let provider = provider_for(&server);
        let result = provider.fetch_table(&Currency::usd(), &[]).await;

        assert!(matches!(result, Err(FxError::MalformedPayload { .. })));
    }
}
