//! Promotion Rule Records

use jiff::civil::Time;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::uuids::TypedUuid;

/// Promotion Rule UUID
pub type PromotionRuleUuid = TypedUuid<PromotionRuleRecord>;

/// An active promotion rule as read from the catalog.
///
/// Rules are authored by an external administrative collaborator and are
/// read-only here. `percent` is the discount percentage in `[0, 100]`;
/// `max_discount` caps the resulting amount when present.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRuleRecord {
    pub uuid: PromotionRuleUuid,
    pub name: String,
    pub percent: u16,
    pub max_discount: Option<u64>,
    pub kind: RuleKind,
}

/// The four rule types, each carrying only the fields it evaluates.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    OrderThreshold {
        min_order_value: u64,
    },
    FlashSale {
        window: Option<DailyWindow>,
    },
    CategoryBundle {
        category_uuid: Uuid,
    },
    Combo {
        requirements: SmallVec<[ComboRequirement; 4]>,
    },
}

impl RuleKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OrderThreshold { .. } => "order_threshold",
            Self::FlashSale { .. } => "flash_sale",
            Self::CategoryBundle { .. } => "category_bundle",
            Self::Combo { .. } => "combo",
        }
    }
}

/// Inclusive daily clock-time window for flash sales.
///
/// A window whose `start` is later than its `end` (an overnight range such
/// as 22:00–02:00) never matches; wrap-around windows are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    pub start: Time,
    pub end: Time,
}

impl DailyWindow {
    #[must_use]
    pub fn contains(&self, time_of_day: Time) -> bool {
        self.start <= time_of_day && time_of_day <= self.end
    }
}

/// One product quantity a combo rule demands. A rule's requirements combine
/// with AND semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboRequirement {
    pub product_uuid: Uuid,
    pub required_quantity: u32,
}
