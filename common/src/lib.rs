//! FreightQuote Common Types
//!
//! Shared types used across the FreightQuote pricing subsystem:
//! currency codes, monetary amounts and time helpers.

pub mod monetary;
pub mod time;

pub use monetary::*;
pub use time::*;
