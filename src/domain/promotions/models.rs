//! Pricing Models

use serde::Serialize;

use crate::domain::promotions::records::PromotionRuleUuid;

/// One rule's contribution to the quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedRule {
    pub uuid: PromotionRuleUuid,
    pub name: String,
    pub kind: &'static str,
    pub discount: u64,
}

/// The final quote. Computed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub subtotal: u64,
    pub discount_amount: u64,
    pub final_total: u64,
    pub applied_rules: Vec<AppliedRule>,
}

impl PricingResult {
    /// Aggregate per-rule discounts, clamping the total to `[0, subtotal]`.
    #[must_use]
    pub fn from_applied(subtotal: u64, applied_rules: Vec<AppliedRule>) -> Self {
        let discount_amount = applied_rules
            .iter()
            .fold(0u64, |acc, rule| acc.saturating_add(rule.discount))
            .min(subtotal);

        Self {
            subtotal,
            discount_amount,
            final_total: subtotal - discount_amount,
            applied_rules,
        }
    }

    /// A quote with no discount applied.
    #[must_use]
    pub fn undiscounted(subtotal: u64) -> Self {
        Self::from_applied(subtotal, Vec::new())
    }
}
