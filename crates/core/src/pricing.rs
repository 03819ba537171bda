use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::document::{Pricing, QuoteDocument};

pub const CURRENCY_KRW: &str = "KRW";

/// Pure business rule recomputing the pricing block from the configured
/// minimum subtotal and VAT rate. The generated vat/total are discarded and
/// re-derived unconditionally; there is no failure mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingPolicy {
    min_subtotal: i64,
    vat_rate: Decimal,
}

impl PricingPolicy {
    pub fn new(min_subtotal: i64, vat_rate: Decimal) -> Self {
        Self { min_subtotal, vat_rate }
    }

    pub fn min_subtotal(&self) -> i64 {
        self.min_subtotal
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    /// `subtotal' = max(subtotal, min_subtotal)`, `vat = floor(subtotal' * rate)`,
    /// `total = subtotal' + vat`, currency fixed to KRW.
    ///
    /// The subtotal arrives from generated JSON, so the arithmetic saturates
    /// instead of trusting it to stay in range.
    pub fn apply(&self, pricing: &Pricing) -> Pricing {
        let subtotal = pricing.subtotal.max(self.min_subtotal);
        let vat = (Decimal::from(subtotal) * self.vat_rate)
            .floor()
            .to_i64()
            .unwrap_or(i64::MAX);
        Pricing {
            subtotal,
            vat,
            total: subtotal.saturating_add(vat),
            currency: CURRENCY_KRW.to_owned(),
        }
    }

    pub fn enforce(&self, document: &mut QuoteDocument) {
        document.pricing = self.apply(&document.pricing);
    }
}
