//! Quote engine: pure breakdown computation plus currency re-expression.

use std::sync::Arc;

use freightquote_common::{round_display, Currency};
use freightquote_fx::RateCache;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::breakdown::QuoteBreakdown;
use crate::error::{QuoteError, QuoteResult};
use crate::shipment::{ShipmentInput, ShipmentMode};
use crate::tariff::Tariff;

/// The quote engine.
///
/// Owns an explicitly constructed rate cache rather than ambient process
/// state, so each caller (and each test) controls its own cache instance.
pub struct QuoteEngine {
    rates: Arc<RateCache>,
    tariff: Tariff,
    computation_currency: Currency,
}

impl QuoteEngine {
    /// Create an engine pricing in `computation_currency`.
    pub fn new(rates: Arc<RateCache>, tariff: Tariff, computation_currency: Currency) -> Self {
        Self {
            rates,
            tariff,
            computation_currency,
        }
    }

    /// The currency breakdowns are computed in before conversion.
    pub fn computation_currency(&self) -> &Currency {
        &self.computation_currency
    }

    /// Compute an itemized breakdown in the computation currency.
    ///
    /// Pure: no I/O, no clock, identical input yields an identical
    /// breakdown. The incoterm is validated for membership but does not
    /// alter any line item; this mirrors the booking system this engine
    /// replaces and is guarded by a regression test.
    pub fn compute_breakdown(&self, input: &ShipmentInput) -> QuoteResult<QuoteBreakdown> {
        input.validate()?;

        let freight_charge = self.freight_charge(input)?;
        let (origin_handling, destination_handling) = self.tariff.handling_fees(input.mode);
        let surcharge = round_display(freight_charge * self.tariff.surcharge_rate, 0);
        let insurance_premium = self.insurance_premium(input)?;

        debug!(
            mode = %input.mode,
            freight = %freight_charge,
            "Computed freight charge"
        );

        Ok(QuoteBreakdown::assemble(
            self.computation_currency.clone(),
            freight_charge,
            origin_handling,
            destination_handling,
            surcharge,
            insurance_premium,
            self.tariff.documentation_fee,
        ))
    }

    /// Re-express a breakdown in `target` via the rate cache.
    ///
    /// One rate lookup; the factor is applied uniformly to every line item
    /// and the total. Rate errors propagate to the caller.
    #[instrument(skip(self, breakdown), fields(from = %breakdown.currency, to = %target))]
    pub async fn convert(
        &self,
        breakdown: &QuoteBreakdown,
        target: &Currency,
    ) -> QuoteResult<QuoteBreakdown> {
        let lookup = self.rates.lookup(&breakdown.currency, target).await?;
        let converted = breakdown.re_expressed(lookup.factor, target.clone());

        info!(
            factor = %lookup.factor,
            source = ?lookup.source,
            total = %converted.total,
            "Converted quote"
        );

        Ok(converted)
    }

    /// Compute and convert in one step.
    pub async fn quote(
        &self,
        input: &ShipmentInput,
        display_currency: &Currency,
    ) -> QuoteResult<QuoteBreakdown> {
        let breakdown = self.compute_breakdown(input)?;
        self.convert(&breakdown, display_currency).await
    }

    fn freight_charge(&self, input: &ShipmentInput) -> QuoteResult<Decimal> {
        match input.mode {
            ShipmentMode::Fcl => {
                let kind = input.container_kind.ok_or_else(|| {
                    QuoteError::validation("containerKind", "is required when mode is FCL")
                })?;
                let count = Decimal::from(input.effective_container_count());
                Ok(self.tariff.container_rate(kind) * count)
            }
            ShipmentMode::Lcl | ShipmentMode::BreakBulk => {
                // Per-cbm dominates light cargo, per-kg dominates dense
                // cargo; the floor covers degenerate near-zero inputs.
                let metric = self.tariff.volume_rate * input.volume_cbm
                    + self.tariff.weight_rate * input.weight_kg;
                Ok(metric.max(self.tariff.floor_charge))
            }
        }
    }

    fn insurance_premium(&self, input: &ShipmentInput) -> QuoteResult<Decimal> {
        if !input.insured {
            return Ok(Decimal::ZERO);
        }
        let declared = input.declared_value.ok_or_else(|| {
            QuoteError::validation("declaredValue", "is required when insured")
        })?;
        Ok((declared * self.tariff.insurance_rate).max(self.tariff.minimum_premium))
    }
}
