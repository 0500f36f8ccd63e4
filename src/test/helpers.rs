//! Test Helpers
//!
//! Rules and coupons are authored by an external administrative system in
//! production; tests seed them with plain SQL.

use jiff::{Timestamp, Zoned, civil::Time, tz::TimeZone};
use jiff_sqlx::{Time as SqlxTime, Timestamp as SqlxTimestamp};
use uuid::Uuid;

use crate::test::TestContext;

/// A fixed point in time for deterministic window tests, in UTC.
pub(crate) fn zoned(year: i16, month: i8, day: i8, hour: i8, minute: i8) -> Zoned {
    jiff::civil::date(year, month, day)
        .at(hour, minute, 0, 0)
        .to_zoned(TimeZone::UTC)
        .expect("valid civil datetime")
}

pub(crate) fn now_zoned() -> Zoned {
    Zoned::now()
}

pub(crate) struct RuleFixture {
    pub name: &'static str,
    pub kind: &'static str,
    pub percent: i16,
    pub code: Option<&'static str>,
    pub is_active: bool,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub min_order_value: Option<i64>,
    pub daily_start: Option<Time>,
    pub daily_end: Option<Time>,
    pub category_uuid: Option<Uuid>,
    pub max_discount: Option<i64>,
}

impl Default for RuleFixture {
    fn default() -> Self {
        Self {
            name: "Promotion",
            kind: "order_threshold",
            percent: 10,
            code: None,
            is_active: true,
            starts_at: Timestamp::UNIX_EPOCH,
            ends_at: Timestamp::MAX,
            min_order_value: Some(0),
            daily_start: None,
            daily_end: None,
            category_uuid: None,
            max_discount: None,
        }
    }
}

pub(crate) async fn seed_rule(ctx: &TestContext, fixture: RuleFixture) -> Uuid {
    let uuid = Uuid::now_v7();

    sqlx::query(
        "INSERT INTO promotion_rules
           (uuid, name, kind, code, is_active, starts_at, ends_at,
            min_order_value, discount_percent, daily_start, daily_end,
            category_uuid, max_discount)
         VALUES ($1, $2, $3::rule_kind, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(uuid)
    .bind(fixture.name)
    .bind(fixture.kind)
    .bind(fixture.code)
    .bind(fixture.is_active)
    .bind(SqlxTimestamp::from(fixture.starts_at))
    .bind(SqlxTimestamp::from(fixture.ends_at))
    .bind(fixture.min_order_value)
    .bind(fixture.percent)
    .bind(fixture.daily_start.map(SqlxTime::from))
    .bind(fixture.daily_end.map(SqlxTime::from))
    .bind(fixture.category_uuid)
    .bind(fixture.max_discount)
    .execute(ctx.db.pool())
    .await
    .expect("Failed to seed promotion rule");

    uuid
}

pub(crate) async fn seed_combo_requirement(
    ctx: &TestContext,
    rule_uuid: Uuid,
    product_uuid: Uuid,
    required_quantity: i32,
) {
    sqlx::query(
        "INSERT INTO combo_requirements (rule_uuid, product_uuid, required_quantity)
         VALUES ($1, $2, $3)",
    )
    .bind(rule_uuid)
    .bind(product_uuid)
    .bind(required_quantity)
    .execute(ctx.db.pool())
    .await
    .expect("Failed to seed combo requirement");
}

pub(crate) struct CouponFixture {
    pub code: &'static str,
    pub kind: &'static str,
    pub value: i64,
    pub min_order_amount: Option<i64>,
    pub max_discount: Option<i64>,
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub is_active: bool,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
}

impl Default for CouponFixture {
    fn default() -> Self {
        Self {
            code: "SAVE10",
            kind: "percentage",
            value: 10,
            min_order_amount: None,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            is_active: true,
            valid_from: Timestamp::UNIX_EPOCH,
            valid_until: Timestamp::MAX,
        }
    }
}

pub(crate) async fn seed_coupon(ctx: &TestContext, fixture: CouponFixture) -> Uuid {
    let uuid = Uuid::now_v7();

    sqlx::query(
        "INSERT INTO coupons
           (uuid, code, kind, value, min_order_amount, max_discount,
            usage_limit, used_count, is_active, valid_from, valid_until)
         VALUES ($1, $2, $3::coupon_kind, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(uuid)
    .bind(fixture.code)
    .bind(fixture.kind)
    .bind(fixture.value)
    .bind(fixture.min_order_amount)
    .bind(fixture.max_discount)
    .bind(fixture.usage_limit)
    .bind(fixture.used_count)
    .bind(fixture.is_active)
    .bind(SqlxTimestamp::from(fixture.valid_from))
    .bind(SqlxTimestamp::from(fixture.valid_until))
    .execute(ctx.db.pool())
    .await
    .expect("Failed to seed coupon");

    uuid
}

pub(crate) async fn coupon_used_count(ctx: &TestContext, code: &str) -> i64 {
    sqlx::query_scalar("SELECT used_count FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to read used_count")
}

pub(crate) async fn redemption_count(ctx: &TestContext, code: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM coupon_redemptions cr
         JOIN coupons c ON c.uuid = cr.coupon_uuid
         WHERE c.code = $1",
    )
    .bind(code)
    .fetch_one(ctx.db.pool())
    .await
    .expect("Failed to count redemptions")
}
