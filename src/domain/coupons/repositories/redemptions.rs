//! Coupon Redemptions Repository

use sqlx::{Postgres, Transaction, query, query_scalar};
use uuid::Uuid;

use crate::domain::coupons::records::{CouponUuid, NewRedemption};

const REDEMPTION_EXISTS_SQL: &str = include_str!("../sql/redemption_exists.sql");
const INSERT_REDEMPTION_SQL: &str = include_str!("../sql/insert_redemption.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRedemptionsRepository;

impl PgRedemptionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn redemption_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        user: Uuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(REDEMPTION_EXISTS_SQL)
            .bind(coupon.into_uuid())
            .bind(user)
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert-if-absent keyed on `(coupon_uuid, user_uuid)`. Returns the
    /// number of rows inserted: zero means this user already redeemed the
    /// coupon.
    pub(crate) async fn insert_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: NewRedemption,
    ) -> Result<u64, sqlx::Error> {
        let discount_amount =
            i64::try_from(redemption.discount_amount).map_err(|e| sqlx::Error::ColumnDecode {
                index: "discount_amount".to_string(),
                source: Box::new(e),
            })?;

        let rows_affected = query(INSERT_REDEMPTION_SQL)
            .bind(redemption.coupon_uuid.into_uuid())
            .bind(redemption.user_uuid)
            .bind(redemption.order_uuid)
            .bind(discount_amount)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
