//! Time utilities and constants for the FreightQuote pricing subsystem.

use chrono::{DateTime, Duration, Utc};

/// Pricing subsystem timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched exchange-rate table stays fresh (24 hours).
    pub fn rate_freshness_window() -> Duration {
        Duration::hours(24)
    }

    /// Default timeout for one FX provider request (10 seconds).
    pub fn provider_request_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(10)
    }
}

/// A timestamp with timezone (always UTC for FreightQuote).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check whether a fetch timestamp is still within a freshness window.
pub fn is_within_window(fetched_at: Timestamp, window: Duration) -> bool {
    now().signed_duration_since(fetched_at) < window
}
