//! Coupon Quote Models

use serde::Serialize;

use crate::domain::coupons::records::CouponUuid;

/// The result of validating or redeeming a coupon. Computed, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponQuote {
    pub coupon_uuid: CouponUuid,
    pub kind: &'static str,
    pub discount_amount: u64,
    pub final_amount: u64,
}
