//! Cart totals.
//!
//! One pure function turns lines, the active promo and the pricing rules into
//! [`CartTotals`]. Every view (cart page, checkout summary, order request)
//! reads the same numbers from it.
//!
//! Order of operations:
//!
//! 1. `subtotal = Σ unit_price × quantity`
//! 2. `discount` rounded to whole units
//! 3. `discounted_subtotal = subtotal − discount`
//! 4. shipping from the discounted subtotal
//! 5. `tax = round(discounted_subtotal × tax_rate)`
//! 6. `grand_total = discounted_subtotal + shipping_fee + tax`

use gaojie_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line::CartLine;
use super::promo::{PromoKind, PromoState};

/// A flat-fee shipping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRule {
    /// Fee charged below the threshold.
    pub fee: Amount,
    /// Discounted subtotal from which shipping is free, if any.
    pub free_threshold: Option<Amount>,
}

/// Shipping method offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    /// Parse a form value.
    #[must_use]
    pub fn from_form(value: &str) -> Option<Self> {
        match value.trim() {
            "standard" | "" => Some(Self::Standard),
            "express" => Some(Self::Express),
            _ => None,
        }
    }
}

/// Tax rate and shipping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub standard: ShippingRule,
    pub express: ShippingRule,
}

impl PricingConfig {
    /// Rule for a shipping method.
    #[must_use]
    pub const fn rule(&self, method: ShippingMethod) -> ShippingRule {
        match method {
            ShippingMethod::Standard => self.standard,
            ShippingMethod::Express => self.express,
        }
    }
}

/// Derived monetary totals. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Amount,
    pub discount: Amount,
    pub discounted_subtotal: Amount,
    pub shipping_fee: Amount,
    pub tax: Amount,
    pub grand_total: Amount,
    pub item_count: u32,
}

/// How far the cart is from free shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeShippingProgress {
    pub threshold: Amount,
    pub remaining: Amount,
    /// Whole percent, 0-100.
    pub percent: u8,
    pub qualifies: bool,
}

/// Compute totals.
///
/// Deterministic: the same inputs always give the same output.
#[must_use]
pub fn compute_totals(
    lines: &[CartLine],
    promo: Option<&PromoState>,
    rule: ShippingRule,
    tax_rate: Decimal,
) -> CartTotals {
    let subtotal: Amount = lines.iter().map(CartLine::line_total).sum();
    let item_count = lines
        .iter()
        .fold(0_u32, |count, line| count.saturating_add(line.quantity));

    let kind = promo.map(|p| p.kind);
    let discount = match kind {
        Some(PromoKind::PercentageOff(fraction)) => {
            Amount::from_decimal_rounded(subtotal.to_decimal() * fraction).min(subtotal)
        }
        Some(PromoKind::FixedAmountOff(amount)) => amount.min(subtotal),
        Some(PromoKind::FreeShipping) | None => Amount::ZERO,
    };
    let discounted_subtotal = subtotal.saturating_sub(discount);

    let free_by_threshold = rule
        .free_threshold
        .is_some_and(|threshold| discounted_subtotal >= threshold);
    let shipping_fee = if free_by_threshold || matches!(kind, Some(PromoKind::FreeShipping)) {
        Amount::ZERO
    } else {
        rule.fee
    };

    let tax = Amount::from_decimal_rounded(discounted_subtotal.to_decimal() * tax_rate);
    let grand_total = discounted_subtotal + shipping_fee + tax;

    CartTotals {
        subtotal,
        discount,
        discounted_subtotal,
        shipping_fee,
        tax,
        grand_total,
        item_count,
    }
}

/// Progress toward the rule's free-shipping threshold.
///
/// `None` when the rule has no threshold.
#[must_use]
pub fn free_shipping_progress(
    discounted_subtotal: Amount,
    rule: ShippingRule,
) -> Option<FreeShippingProgress> {
    let threshold = rule.free_threshold?;
    let qualifies = discounted_subtotal >= threshold;
    let percent = if threshold.is_zero() || qualifies {
        100
    } else {
        // discounted_subtotal < threshold, so the quotient is below 100.
        u8::try_from(discounted_subtotal.units() * 100 / threshold.units()).unwrap_or(100)
    };

    Some(FreeShippingProgress {
        threshold,
        remaining: threshold.saturating_sub(discounted_subtotal),
        percent,
        qualifies,
    })
}
