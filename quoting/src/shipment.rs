//! Shipment input types and validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{QuoteError, QuoteResult};

/// Freight mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentMode {
    /// Full container load.
    #[serde(rename = "FCL")]
    Fcl,
    /// Less than container load.
    #[serde(rename = "LCL")]
    Lcl,
    /// Non-containerized cargo.
    BreakBulk,
}

impl ShipmentMode {
    /// Whether this mode ships full containers.
    pub fn is_containerized(&self) -> bool {
        matches!(self, ShipmentMode::Fcl)
    }
}

impl fmt::Display for ShipmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentMode::Fcl => write!(f, "FCL"),
            ShipmentMode::Lcl => write!(f, "LCL"),
            ShipmentMode::BreakBulk => write!(f, "BreakBulk"),
        }
    }
}

/// Container kind for FCL shipments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    #[serde(rename = "20ft-standard")]
    TwentyFtStandard,
    #[serde(rename = "40ft-standard")]
    FortyFtStandard,
    #[serde(rename = "40ft-high-cube")]
    FortyFtHighCube,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::TwentyFtStandard => write!(f, "20ft-standard"),
            ContainerKind::FortyFtStandard => write!(f, "40ft-standard"),
            ContainerKind::FortyFtHighCube => write!(f, "40ft-high-cube"),
        }
    }
}

/// Standardized shipping-terms code.
///
/// Accepted and validated for enum membership, but it does not discriminate
/// in the current pricing model; see [`crate::engine::QuoteEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Incoterm {
    Fob,
    Cif,
    Cfr,
    Dap,
    Ddp,
}

impl Incoterm {
    /// All supported incoterms.
    pub const ALL: [Incoterm; 5] = [
        Incoterm::Fob,
        Incoterm::Cif,
        Incoterm::Cfr,
        Incoterm::Dap,
        Incoterm::Ddp,
    ];
}

/// Parameters of one shipment to be quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    /// Freight mode.
    pub mode: ShipmentMode,
    /// Container kind; required iff `mode` is FCL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_kind: Option<ContainerKind>,
    /// Number of containers; positive, defaults to 1 for FCL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_count: Option<u32>,
    /// Gross weight in kilograms, non-negative.
    pub weight_kg: Decimal,
    /// Volume in cubic meters, non-negative.
    pub volume_cbm: Decimal,
    /// Shipping terms.
    pub incoterm: Incoterm,
    /// Whether cargo insurance is requested.
    pub insured: bool,
    /// Declared cargo value; required iff `insured`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_value: Option<Decimal>,
}

impl ShipmentInput {
    /// Validate the input, failing fast with the violated constraint named.
    pub fn validate(&self) -> QuoteResult<()> {
        if self.mode.is_containerized() && self.container_kind.is_none() {
            return Err(QuoteError::validation(
                "containerKind",
                "is required when mode is FCL",
            ));
        }
        if self.container_count == Some(0) {
            return Err(QuoteError::validation(
                "containerCount",
                "must be a positive integer",
            ));
        }
        if self.weight_kg < Decimal::ZERO {
            return Err(QuoteError::validation("weightKg", "must be non-negative"));
        }
        if self.volume_cbm < Decimal::ZERO {
            return Err(QuoteError::validation("volumeCbm", "must be non-negative"));
        }
        if self.insured && self.declared_value.is_none() {
            return Err(QuoteError::validation(
                "declaredValue",
                "is required when insured",
            ));
        }
        if matches!(self.declared_value, Some(v) if v < Decimal::ZERO) {
            return Err(QuoteError::validation(
                "declaredValue",
                "must be non-negative",
            ));
        }
        Ok(())
    }

    /// Effective container count for pricing (at least 1).
    pub fn effective_container_count(&self) -> u32 {
        self.container_count.unwrap_or(1).max(1)
    }
}
