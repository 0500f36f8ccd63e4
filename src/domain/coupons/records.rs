//! Coupon Records

use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    domain::{carts::models::percent_of, coupons::errors::CouponsServiceError},
    uuids::TypedUuid,
};

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// A coupon as read from the store. `used_count` is the only field this
/// engine ever mutates, and only through the conditional increment at
/// commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub code: String,
    pub kind: CouponKind,
    pub min_order_amount: Option<u64>,
    pub usage_limit: Option<u64>,
    pub used_count: u64,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
}

/// The two coupon types. Only percentage coupons carry a discount cap;
/// fixed coupons are bounded by the order amount itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponKind {
    Percentage {
        percent: u16,
        max_discount: Option<u64>,
    },
    Fixed {
        amount: u64,
    },
}

impl CouponKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::Fixed { .. } => "fixed",
        }
    }
}

impl CouponRecord {
    /// Every redeemability condition except per-user history, in order:
    /// validity window, usage limit, minimum order amount.
    ///
    /// `exhausted` and `expired` are terminal independently of each other;
    /// the window is checked first so an expired coupon reports `Expired`
    /// even when it is also exhausted.
    pub fn check_redeemable(
        &self,
        at: Timestamp,
        order_amount: u64,
    ) -> Result<(), CouponsServiceError> {
        if at < self.valid_from || at > self.valid_until {
            return Err(CouponsServiceError::Expired);
        }

        if let Some(limit) = self.usage_limit
            && self.used_count >= limit
        {
            return Err(CouponsServiceError::UsageLimitExceeded);
        }

        if let Some(min_order_amount) = self.min_order_amount
            && order_amount < min_order_amount
        {
            return Err(CouponsServiceError::MinOrderNotMet {
                shortfall: min_order_amount - order_amount,
            });
        }

        Ok(())
    }

    /// The discount this coupon grants on `order_amount`. Never exceeds the
    /// order amount.
    #[must_use]
    pub fn discount_for(&self, order_amount: u64) -> u64 {
        match self.kind {
            CouponKind::Percentage {
                percent,
                max_discount,
            } => {
                let discount = percent_of(order_amount, percent);

                match max_discount {
                    Some(cap) => discount.min(cap),
                    None => discount,
                }
            }
            CouponKind::Fixed { amount } => amount.min(order_amount),
        }
    }
}

/// Redemption row to insert at commit. `created_at` is assigned by the
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRedemption {
    pub coupon_uuid: CouponUuid,
    pub user_uuid: Uuid,
    pub order_uuid: Uuid,
    pub discount_amount: u64,
}

/// Coupon codes are case-insensitive; trimmed upper-case is the canonical
/// form, both in the store and at lookup.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(kind: CouponKind) -> CouponRecord {
        CouponRecord {
            uuid: CouponUuid::new(),
            code: "SAVE20".to_string(),
            kind,
            min_order_amount: None,
            usage_limit: None,
            used_count: 0,
            valid_from: Timestamp::UNIX_EPOCH,
            valid_until: Timestamp::MAX,
        }
    }

    fn percentage(percent: u16, max_discount: Option<u64>) -> CouponKind {
        CouponKind::Percentage {
            percent,
            max_discount,
        }
    }

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("  save20 \n"), "SAVE20");
        assert_eq!(normalize_code("Save20"), "SAVE20");
    }

    #[test]
    fn percentage_discount_floors_and_caps() {
        let coupon = coupon(percentage(20, Some(30_000)));

        // Raw 20% of 500_000 is 100_000, capped to 30_000.
        assert_eq!(coupon.discount_for(500_000), 30_000);

        let uncapped = self::coupon(percentage(20, None));
        assert_eq!(uncapped.discount_for(500_000), 100_000);
        assert_eq!(uncapped.discount_for(999), 199);
    }

    #[test]
    fn fixed_discount_is_bounded_by_the_order_amount() {
        let coupon = coupon(CouponKind::Fixed { amount: 5_000 });

        assert_eq!(coupon.discount_for(20_000), 5_000);
        assert_eq!(coupon.discount_for(3_000), 3_000);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let mut coupon = coupon(percentage(10, None));
        coupon.valid_from = Timestamp::from_second(1_000).unwrap();
        coupon.valid_until = Timestamp::from_second(2_000).unwrap();

        assert!(
            coupon
                .check_redeemable(Timestamp::from_second(1_000).unwrap(), 100)
                .is_ok()
        );
        assert!(
            coupon
                .check_redeemable(Timestamp::from_second(2_000).unwrap(), 100)
                .is_ok()
        );

        assert!(matches!(
            coupon.check_redeemable(Timestamp::from_second(999).unwrap(), 100),
            Err(CouponsServiceError::Expired)
        ));
        assert!(matches!(
            coupon.check_redeemable(Timestamp::from_second(2_001).unwrap(), 100),
            Err(CouponsServiceError::Expired)
        ));
    }

    #[test]
    fn exhausted_coupon_reports_usage_limit() {
        let mut coupon = coupon(percentage(10, None));
        coupon.usage_limit = Some(5);
        coupon.used_count = 5;

        assert!(matches!(
            coupon.check_redeemable(Timestamp::UNIX_EPOCH, 100),
            Err(CouponsServiceError::UsageLimitExceeded)
        ));
    }

    #[test]
    fn min_order_shortfall_is_reported_exactly() {
        let mut coupon = coupon(percentage(10, None));
        coupon.min_order_amount = Some(50_000);

        let result = coupon.check_redeemable(Timestamp::UNIX_EPOCH, 30_000);

        assert!(
            matches!(
                result,
                Err(CouponsServiceError::MinOrderNotMet { shortfall: 20_000 })
            ),
            "expected MinOrderNotMet with shortfall 20_000, got {result:?}"
        );

        assert!(coupon.check_redeemable(Timestamp::UNIX_EPOCH, 50_000).is_ok());
    }

    #[test]
    fn expiry_is_checked_before_exhaustion() {
        let mut coupon = coupon(percentage(10, None));
        coupon.valid_until = Timestamp::from_second(1_000).unwrap();
        coupon.usage_limit = Some(1);
        coupon.used_count = 1;

        assert!(matches!(
            coupon.check_redeemable(Timestamp::from_second(2_000).unwrap(), 100),
            Err(CouponsServiceError::Expired)
        ));
    }
}
