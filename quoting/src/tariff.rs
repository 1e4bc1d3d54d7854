//! Pricing tariff configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::shipment::{ContainerKind, ShipmentMode};

/// Pricing constants for the quote engine.
///
/// All amounts are expressed in the engine's computation currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    /// Per-container base rate for a 20ft standard container.
    pub rate_20ft_standard: Decimal,
    /// Per-container base rate for a 40ft standard container.
    pub rate_40ft_standard: Decimal,
    /// Per-container base rate for a 40ft high-cube container.
    pub rate_40ft_high_cube: Decimal,
    /// Per-cbm rate for LCL and break-bulk cargo.
    pub volume_rate: Decimal,
    /// Per-kg rate for LCL and break-bulk cargo.
    pub weight_rate: Decimal,
    /// Minimum freight charge for non-containerized cargo.
    pub floor_charge: Decimal,
    /// Origin handling fee for FCL shipments.
    pub fcl_origin_handling: Decimal,
    /// Destination handling fee for FCL shipments.
    pub fcl_destination_handling: Decimal,
    /// Origin handling fee for non-FCL shipments.
    pub lcl_origin_handling: Decimal,
    /// Destination handling fee for non-FCL shipments.
    pub lcl_destination_handling: Decimal,
    /// Surcharge as a fraction of the freight charge.
    pub surcharge_rate: Decimal,
    /// Insurance premium as a fraction of declared value.
    pub insurance_rate: Decimal,
    /// Minimum insurance premium.
    pub minimum_premium: Decimal,
    /// Fixed documentation fee.
    pub documentation_fee: Decimal,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            rate_20ft_standard: dec!(1100),
            rate_40ft_standard: dec!(1600),
            rate_40ft_high_cube: dec!(1800),
            volume_rate: dec!(55),
            weight_rate: dec!(0.18),
            floor_charge: dec!(90),
            fcl_origin_handling: dec!(250),
            fcl_destination_handling: dec!(220),
            lcl_origin_handling: dec!(120),
            lcl_destination_handling: dec!(100),
            surcharge_rate: dec!(0.12),
            insurance_rate: dec!(0.005),
            minimum_premium: dec!(25),
            documentation_fee: dec!(45),
        }
    }
}

impl Tariff {
    /// Per-container base rate for a container kind.
    pub fn container_rate(&self, kind: ContainerKind) -> Decimal {
        match kind {
            ContainerKind::TwentyFtStandard => self.rate_20ft_standard,
            ContainerKind::FortyFtStandard => self.rate_40ft_standard,
            ContainerKind::FortyFtHighCube => self.rate_40ft_high_cube,
        }
    }

    /// Origin and destination handling fees for a mode.
    pub fn handling_fees(&self, mode: ShipmentMode) -> (Decimal, Decimal) {
        if mode.is_containerized() {
            (self.fcl_origin_handling, self.fcl_destination_handling)
        } else {
            (self.lcl_origin_handling, self.lcl_destination_handling)
        }
    }

    /// Validate the tariff.
    pub fn validate(&self) -> Result<(), String> {
        let amounts = [
            self.rate_20ft_standard,
            self.rate_40ft_standard,
            self.rate_40ft_high_cube,
            self.volume_rate,
            self.weight_rate,
            self.floor_charge,
            self.fcl_origin_handling,
            self.fcl_destination_handling,
            self.lcl_origin_handling,
            self.lcl_destination_handling,
            self.surcharge_rate,
            self.insurance_rate,
            self.minimum_premium,
            self.documentation_fee,
        ];
        if amounts.iter().any(|a| *a < Decimal::ZERO) {
            return Err("Tariff amounts cannot be negative".to_string());
        }

        // Container rates must rise with capacity
        if !(self.rate_40ft_high_cube > self.rate_40ft_standard
            && self.rate_40ft_standard > self.rate_20ft_standard)
        {
            return Err("Container rates must increase with container size".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tariff_is_valid() {
        assert!(Tariff::default().validate().is_ok());
    }

    #[test]
    fn test_container_rate_ordering() {
        let tariff = Tariff::default();
        assert!(
            tariff.container_rate(ContainerKind::FortyFtHighCube)
                > tariff.container_rate(ContainerKind::FortyFtStandard)
        );
        assert!(
            tariff.container_rate(ContainerKind::FortyFtStandard)
                > tariff.container_rate(ContainerKind::TwentyFtStandard)
        );
    }

    #[test]
    fn test_handling_fees_differ_by_mode() {
        let tariff = Tariff::default();
        let (fcl_origin, fcl_dest) = tariff.handling_fees(ShipmentMode::Fcl);
        let (lcl_origin, lcl_dest) = tariff.handling_fees(ShipmentMode::Lcl);

        assert!(lcl_origin < fcl_origin);
        assert!(lcl_dest < fcl_dest);
        assert_eq!(
            tariff.handling_fees(ShipmentMode::BreakBulk),
            (lcl_origin, lcl_dest)
        );
    }

    #[test]
    fn test_inverted_container_rates_rejected() {
        let tariff = Tariff {
            rate_40ft_high_cube: dec!(1000),
            ..Tariff::default()
        };
        assert!(tariff.validate().is_err());
    }
}
