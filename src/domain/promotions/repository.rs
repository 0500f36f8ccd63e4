//! Promotion Rule Catalog Repository

use jiff::Timestamp;
use jiff_sqlx::{Time as SqlxTime, Timestamp as SqlxTimestamp};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::promotions::records::{
    ComboRequirement, DailyWindow, PromotionRuleRecord, PromotionRuleUuid, RuleKind,
};

const ACTIVE_RULES_SQL: &str = include_str!("sql/active_rules.sql");
const ACTIVE_COMBO_REQUIREMENTS_SQL: &str = include_str!("sql/active_combo_requirements.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromotionRulesRepository;

impl PgPromotionRulesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// All rules eligible for automatic evaluation at `at`: active, within
    /// their date window, and carrying no code. Combo rules come back with
    /// their requirement sets stitched in.
    pub(crate) async fn active_rules(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        at: Timestamp,
    ) -> Result<Vec<PromotionRuleRecord>, sqlx::Error> {
        let rows: Vec<RuleRow> = query_as(ACTIVE_RULES_SQL)
            .bind(SqlxTimestamp::from(at))
            .fetch_all(&mut **tx)
            .await?;

        let requirement_rows: Vec<(Uuid, Uuid, i32)> = query_as(ACTIVE_COMBO_REQUIREMENTS_SQL)
            .bind(SqlxTimestamp::from(at))
            .fetch_all(&mut **tx)
            .await?;

        let mut requirements: FxHashMap<Uuid, SmallVec<[ComboRequirement; 4]>> =
            FxHashMap::default();

        for (rule_uuid, product_uuid, required_quantity) in requirement_rows {
            requirements
                .entry(rule_uuid)
                .or_default()
                .push(ComboRequirement {
                    product_uuid,
                    required_quantity: try_u32_from_i32(required_quantity, "required_quantity")?,
                });
        }

        rows.into_iter()
            .map(|row| row.into_record(&mut requirements))
            .collect()
    }
}

/// Raw `promotion_rules` row, before the kind-specific fields are folded
/// into a [`RuleKind`].
#[derive(Debug)]
struct RuleRow {
    uuid: Uuid,
    name: String,
    kind: String,
    discount_percent: i16,
    min_order_value: Option<i64>,
    daily_start: Option<jiff::civil::Time>,
    daily_end: Option<jiff::civil::Time>,
    category_uuid: Option<Uuid>,
    max_discount: Option<i64>,
}

impl<'r> FromRow<'r, PgRow> for RuleRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            discount_percent: row.try_get("discount_percent")?,
            min_order_value: row.try_get("min_order_value")?,
            daily_start: row
                .try_get::<Option<SqlxTime>, _>("daily_start")?
                .map(SqlxTime::to_jiff),
            daily_end: row
                .try_get::<Option<SqlxTime>, _>("daily_end")?
                .map(SqlxTime::to_jiff),
            category_uuid: row.try_get("category_uuid")?,
            max_discount: row.try_get("max_discount")?,
        })
    }
}

impl RuleRow {
    fn into_record(
        self,
        requirements: &mut FxHashMap<Uuid, SmallVec<[ComboRequirement; 4]>>,
    ) -> Result<PromotionRuleRecord, sqlx::Error> {
        let kind = match self.kind.as_str() {
            "order_threshold" => RuleKind::OrderThreshold {
                min_order_value: try_u64_from_i64(
                    required(self.min_order_value, "min_order_value")?,
                    "min_order_value",
                )?,
            },
            "flash_sale" => RuleKind::FlashSale {
                // A window needs both bounds; a half-set window is treated
                // as absent, i.e. always within.
                window: match (self.daily_start, self.daily_end) {
                    (Some(start), Some(end)) => Some(DailyWindow { start, end }),
                    _ => None,
                },
            },
            "category_bundle" => RuleKind::CategoryBundle {
                category_uuid: required(self.category_uuid, "category_uuid")?,
            },
            "combo" => RuleKind::Combo {
                requirements: requirements.remove(&self.uuid).unwrap_or_default(),
            },
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "kind".to_string(),
                    source: format!("unknown rule kind `{other}`").into(),
                });
            }
        };

        Ok(PromotionRuleRecord {
            uuid: PromotionRuleUuid::from_uuid(self.uuid),
            name: self.name,
            percent: try_u16_from_i16(self.discount_percent, "discount_percent")?,
            max_discount: self
                .max_discount
                .map(|value| try_u64_from_i64(value, "max_discount"))
                .transpose()?,
            kind,
        })
    }
}

fn required<T>(value: Option<T>, column: &'static str) -> Result<T, sqlx::Error> {
    value.ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: "missing value".into(),
    })
}

fn try_u64_from_i64(value: i64, column: &'static str) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_u32_from_i32(value: i32, column: &'static str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_u16_from_i16(value: i16, column: &'static str) -> Result<u16, sqlx::Error> {
    u16::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
