//! Itemized quote breakdowns.

use freightquote_common::{round_display, Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An itemized price quote in a single currency.
///
/// Computed once in the engine's computation currency; immutable afterwards
/// except for re-expression into another currency. `total` is always the
/// rounded sum of the six line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBreakdown {
    /// Currency every amount below is expressed in.
    pub currency: Currency,
    pub freight_charge: Decimal,
    pub origin_handling: Decimal,
    pub destination_handling: Decimal,
    pub surcharge: Decimal,
    pub insurance_premium: Decimal,
    pub documentation_fee: Decimal,
    /// Sum of all line items, rounded as the final step.
    pub total: Decimal,
}

impl QuoteBreakdown {
    /// Assemble a breakdown from its line items.
    ///
    /// Line items may carry sub-unit precision; the total is rounded to the
    /// nearest whole currency unit last, for reproducibility.
    pub(crate) fn assemble(
        currency: Currency,
        freight_charge: Decimal,
        origin_handling: Decimal,
        destination_handling: Decimal,
        surcharge: Decimal,
        insurance_premium: Decimal,
        documentation_fee: Decimal,
    ) -> Self {
        let total = round_display(
            freight_charge
                + origin_handling
                + destination_handling
                + surcharge
                + insurance_premium
                + documentation_fee,
            0,
        );
        Self {
            currency,
            freight_charge,
            origin_handling,
            destination_handling,
            surcharge,
            insurance_premium,
            documentation_fee,
            total,
        }
    }

    /// The six line items in presentation order.
    pub fn line_items(&self) -> [(&'static str, Decimal); 6] {
        [
            ("freightCharge", self.freight_charge),
            ("originHandling", self.origin_handling),
            ("destinationHandling", self.destination_handling),
            ("surcharge", self.surcharge),
            ("insurancePremium", self.insurance_premium),
            ("documentationFee", self.documentation_fee),
        ]
    }

    /// Unrounded sum of the line items.
    pub fn items_sum(&self) -> Decimal {
        self.line_items().iter().map(|(_, v)| *v).sum()
    }

    /// The total as a `Money` amount.
    pub fn total_money(&self) -> Money {
        Money::new(self.total, self.currency.clone())
    }

    /// Re-express every amount in `target`, applying `factor` uniformly.
    ///
    /// Every field is re-rounded to 2 decimal places with standard rounding.
    /// Round-tripping may drift by up to one cent per line item per hop.
    pub(crate) fn re_expressed(&self, factor: Decimal, target: Currency) -> Self {
        let convert = |value: Decimal| round_display(value * factor, 2);
        Self {
            currency: target,
            freight_charge: convert(self.freight_charge),
            origin_handling: convert(self.origin_handling),
            destination_handling: convert(self.destination_handling),
            surcharge: convert(self.surcharge),
            insurance_premium: convert(self.insurance_premium),
            documentation_fee: convert(self.documentation_fee),
            total: convert(self.total),
        }
    }
}
