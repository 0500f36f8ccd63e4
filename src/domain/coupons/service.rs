//! Coupons Service

use async_trait::async_trait;
use jiff::Zoned;
use mockall::automock;
use tracing::{Span, info};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::coupons::{
        CouponsServiceError,
        models::CouponQuote,
        records::{CouponRecord, NewRedemption, normalize_code},
        repositories::{PgCouponsRepository, PgRedemptionsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    coupons: PgCouponsRepository,
    redemptions: PgRedemptionsRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            coupons: PgCouponsRepository::new(),
            redemptions: PgRedemptionsRepository::new(),
        }
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(
        name = "coupons.service.validate_coupon",
        skip(self, code, point_in_time),
        fields(coupon_uuid = tracing::field::Empty, discount_amount = tracing::field::Empty),
        err
    )]
    async fn validate_coupon(
        &self,
        code: &str,
        order_amount: u64,
        user: Option<Uuid>,
        point_in_time: Zoned,
    ) -> Result<CouponQuote, CouponsServiceError> {
        let code = normalize_code(code);
        let at = point_in_time.timestamp();

        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.coupons.find_by_code(&mut tx, &code).await?;

        Span::current().record("coupon_uuid", tracing::field::display(coupon.uuid));

        coupon.check_redeemable(at, order_amount)?;

        if let Some(user_uuid) = user {
            if self
                .redemptions
                .redemption_exists(&mut tx, coupon.uuid, user_uuid)
                .await?
            {
                return Err(CouponsServiceError::AlreadyRedeemed);
            }
        }

        tx.commit().await?;

        Ok(quote(&coupon, order_amount))
    }

    #[tracing::instrument(
        name = "coupons.service.redeem_coupon",
        skip(self, code, point_in_time),
        fields(coupon_uuid = tracing::field::Empty, discount_amount = tracing::field::Empty),
        err
    )]
    async fn redeem_coupon(
        &self,
        code: &str,
        order_uuid: Uuid,
        user_uuid: Uuid,
        order_amount: u64,
        point_in_time: Zoned,
    ) -> Result<CouponQuote, CouponsServiceError> {
        let code = normalize_code(code);
        let at = point_in_time.timestamp();

        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.coupons.find_by_code(&mut tx, &code).await?;

        Span::current().record("coupon_uuid", tracing::field::display(coupon.uuid));

        coupon.check_redeemable(at, order_amount)?;

        let quote = quote(&coupon, order_amount);

        let inserted = self
            .redemptions
            .insert_redemption(
                &mut tx,
                NewRedemption {
                    coupon_uuid: coupon.uuid,
                    user_uuid,
                    order_uuid,
                    discount_amount: quote.discount_amount,
                },
            )
            .await?;

        if inserted == 0 {
            return Err(CouponsServiceError::AlreadyRedeemed);
        }

        // The conditional increment is the authoritative capacity check.
        // Zero rows means a concurrent commit took the last slot; the
        // transaction drops unfinished, so the redemption row above is
        // rolled back with it.
        let advanced = self.coupons.increment_used_count(&mut tx, coupon.uuid).await?;

        if advanced == 0 {
            return Err(CouponsServiceError::UsageLimitExceeded);
        }

        tx.commit().await?;

        info!(
            coupon_uuid = %coupon.uuid,
            order_uuid = %order_uuid,
            discount_amount = quote.discount_amount,
            "redeemed coupon"
        );

        Ok(quote)
    }
}

fn quote(coupon: &CouponRecord, order_amount: u64) -> CouponQuote {
    let discount_amount = coupon.discount_for(order_amount);

    Span::current().record("discount_amount", discount_amount);

    CouponQuote {
        coupon_uuid: coupon.uuid,
        kind: coupon.kind.as_str(),
        discount_amount,
        final_amount: order_amount - discount_amount,
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Check a user-entered code against the current store state and quote
    /// its discount. Pure read; mutates nothing. `user` is optional at
    /// validation time; without it the per-user redemption history is not
    /// consulted.
    async fn validate_coupon(
        &self,
        code: &str,
        order_amount: u64,
        user: Option<Uuid>,
        point_in_time: Zoned,
    ) -> Result<CouponQuote, CouponsServiceError>;

    /// Durably record the redemption at checkout commit: one transaction
    /// inserting the redemption row and advancing `used_count`, both as
    /// conditional writes. Not idempotent; callers retrying must key on
    /// `order_uuid`.
    async fn redeem_coupon(
        &self,
        code: &str,
        order_uuid: Uuid,
        user_uuid: Uuid,
        order_amount: u64,
        point_in_time: Zoned,
    ) -> Result<CouponQuote, CouponsServiceError>;
}
