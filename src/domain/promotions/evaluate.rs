//! Automatic promotion evaluation.
//!
//! Pure functions over cart lines and rule records. Callers are expected to
//! pass rules that are already active for the point in time being priced
//! (the catalog reader filters on activity and date window); only the
//! per-kind applicability conditions are decided here.

use jiff::civil::Time;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::domain::{
    carts::models::{CartLine, percent_of, subtotal},
    promotions::{
        models::{AppliedRule, PricingResult},
        records::{ComboRequirement, PromotionRuleRecord, RuleKind},
    },
};

/// Price the cart against the given rules.
///
/// Every applicable rule contributes its discount; rules stack additively
/// and the total is clamped to the subtotal by [`PricingResult`]. Rules
/// contributing nothing are omitted from the result.
pub(crate) fn evaluate_rules(
    lines: &[CartLine],
    rules: &[PromotionRuleRecord],
    time_of_day: Time,
) -> PricingResult {
    let cart_subtotal = subtotal(lines);

    let applied = rules
        .iter()
        .filter_map(|rule| {
            let discount = rule_discount(rule, lines, cart_subtotal, time_of_day);

            (discount > 0).then(|| AppliedRule {
                uuid: rule.uuid,
                name: rule.name.clone(),
                kind: rule.kind.as_str(),
                discount,
            })
        })
        .collect();

    PricingResult::from_applied(cart_subtotal, applied)
}

/// A single rule's discount, clamped to its `max_discount`.
///
/// Threshold, flash-sale, and combo discounts are computed on the whole cart
/// subtotal; category-bundle discounts only on the matching lines' subtotal.
fn rule_discount(
    rule: &PromotionRuleRecord,
    lines: &[CartLine],
    cart_subtotal: u64,
    time_of_day: Time,
) -> u64 {
    let base = match &rule.kind {
        RuleKind::OrderThreshold { min_order_value } => {
            if cart_subtotal >= *min_order_value {
                cart_subtotal
            } else {
                return 0;
            }
        }
        RuleKind::FlashSale { window } => {
            if window.is_none_or(|window| window.contains(time_of_day)) {
                cart_subtotal
            } else {
                return 0;
            }
        }
        RuleKind::CategoryBundle { category_uuid } => category_subtotal(lines, *category_uuid),
        RuleKind::Combo { requirements } => {
            if combo_satisfied(lines, requirements) {
                cart_subtotal
            } else {
                return 0;
            }
        }
    };

    let discount = percent_of(base, rule.percent);

    match rule.max_discount {
        Some(cap) => discount.min(cap),
        None => discount,
    }
}

/// Whether the cart satisfies every requirement of a combo rule.
///
/// Quantities are aggregated per product across all lines first, so a
/// product split over several lines still counts. All-or-nothing: a rule
/// with an unsatisfied (or empty) requirement set contributes nothing.
pub(crate) fn combo_satisfied(lines: &[CartLine], requirements: &[ComboRequirement]) -> bool {
    if requirements.is_empty() {
        return false;
    }

    let mut quantities: FxHashMap<Uuid, u64> = FxHashMap::default();

    for line in lines {
        *quantities.entry(line.product_uuid).or_default() += u64::from(line.quantity);
    }

    requirements.iter().all(|requirement| {
        quantities
            .get(&requirement.product_uuid)
            .copied()
            .unwrap_or(0)
            >= u64::from(requirement.required_quantity)
    })
}

fn category_subtotal(lines: &[CartLine], category_uuid: Uuid) -> u64 {
    lines
        .iter()
        .filter(|line| line.category_uuid == Some(category_uuid))
        .fold(0u64, |acc, line| acc.saturating_add(line.line_total()))
}
