//! Cart Models
//!
//! Cart lines are supplied per request by the order aggregate and are never
//! persisted by this engine. Amounts are integer minor units.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single line of the cart being priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_uuid: Uuid,
    pub quantity: u32,
    pub unit_price: u64,
    pub category_uuid: Option<Uuid>,
}

impl CartLine {
    /// Total for this line, `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// Sum of all line totals, before any discount.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> u64 {
    lines
        .iter()
        .fold(0u64, |acc, line| acc.saturating_add(line.line_total()))
}

/// Floor of `amount × percent / 100`, exact over the full u64 range.
#[must_use]
pub fn percent_of(amount: u64, percent: u16) -> u64 {
    let scaled = u128::from(amount) * u128::from(percent) / 100;

    u64::try_from(scaled).unwrap_or(u64::MAX)
}
