//! Coupons Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::coupons::records::{CouponKind, CouponRecord, CouponUuid};

const FIND_COUPON_BY_CODE_SQL: &str = include_str!("../sql/find_coupon_by_code.sql");
const INCREMENT_USED_COUNT_SQL: &str = include_str!("../sql/increment_used_count.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Look up an active coupon by its canonical code. Inactive and unknown
    /// codes are indistinguishable to the caller: both are `RowNotFound`.
    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    /// Advance `used_count` by one, conditioned on remaining capacity. The
    /// condition and the increment are a single statement so concurrent
    /// commits can never push the counter past the limit. Returns the number
    /// of rows updated: zero means the limit was already reached.
    pub(crate) async fn increment_used_count(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(INCREMENT_USED_COUNT_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("kind")?;
        let value = try_get_amount(row, "value")?;
        let max_discount = try_get_optional_amount(row, "max_discount")?;

        let kind = match kind.as_str() {
            "percentage" => CouponKind::Percentage {
                percent: u16::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "value".to_string(),
                    source: Box::new(e),
                })?,
                max_discount,
            },
            "fixed" => CouponKind::Fixed { amount: value },
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "kind".to_string(),
                    source: format!("unknown coupon kind `{other}`").into(),
                });
            }
        };

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            kind,
            min_order_amount: try_get_optional_amount(row, "min_order_amount")?,
            usage_limit: try_get_optional_amount(row, "usage_limit")?,
            used_count: try_get_amount(row, "used_count")?,
            valid_from: row.try_get::<SqlxTimestamp, _>("valid_from")?.to_jiff(),
            valid_until: row.try_get::<SqlxTimestamp, _>("valid_until")?.to_jiff(),
        })
    }
}

fn try_get_amount(row: &PgRow, column: &'static str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_get_optional_amount(row: &PgRow, column: &'static str) -> sqlx::Result<Option<u64>> {
    let value: Option<i64> = row.try_get(column)?;

    value
        .map(|v| {
            u64::try_from(v).map_err(|e| sqlx::Error::ColumnDecode {
                index: column.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}
