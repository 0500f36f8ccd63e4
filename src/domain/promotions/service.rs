//! Promotions Service

use async_trait::async_trait;
use jiff::{Timestamp, Zoned};
use mockall::automock;
use tracing::{Span, warn};

use crate::{
    database::Db,
    domain::{
        carts::models::{CartLine, subtotal},
        promotions::{
            PromotionsServiceError, evaluate::evaluate_rules, models::PricingResult,
            records::PromotionRuleRecord, repository::PgPromotionRulesRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgPromotionsService {
    db: Db,
    rules: PgPromotionRulesRepository,
}

impl PgPromotionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            rules: PgPromotionRulesRepository::new(),
        }
    }

    async fn load_active_rules(
        &self,
        at: Timestamp,
    ) -> Result<Vec<PromotionRuleRecord>, sqlx::Error> {
        let mut tx = self.db.begin_transaction().await?;

        let rules = self.rules.active_rules(&mut tx, at).await?;

        tx.commit().await?;

        Ok(rules)
    }
}

#[async_trait]
impl PromotionsService for PgPromotionsService {
    #[tracing::instrument(
        name = "promotions.service.evaluate_automatic_promotions",
        skip(self, lines, point_in_time),
        fields(
            line_count = lines.len(),
            subtotal = tracing::field::Empty,
            rule_count = tracing::field::Empty,
            discount_amount = tracing::field::Empty
        ),
        err
    )]
    async fn evaluate_automatic_promotions(
        &self,
        lines: Vec<CartLine>,
        point_in_time: Zoned,
    ) -> Result<PricingResult, PromotionsServiceError> {
        validate_lines(&lines)?;

        let cart_subtotal = subtotal(&lines);

        let span = Span::current();

        span.record("subtotal", cart_subtotal);

        let rules = match self.load_active_rules(point_in_time.timestamp()).await {
            Ok(rules) => rules,
            Err(error) => {
                // Pricing infrastructure failures must never block checkout;
                // degrade to an undiscounted quote instead.
                warn!(error = %error, "promotion catalog read failed; quoting without discounts");

                return Ok(PricingResult::undiscounted(cart_subtotal));
            }
        };

        span.record("rule_count", rules.len());

        let result = evaluate_rules(&lines, &rules, point_in_time.time());

        span.record("discount_amount", result.discount_amount);

        Ok(result)
    }
}

fn validate_lines(lines: &[CartLine]) -> Result<(), PromotionsServiceError> {
    for line in lines {
        if line.quantity == 0 {
            return Err(PromotionsServiceError::ZeroQuantity {
                product_uuid: line.product_uuid,
            });
        }
    }

    Ok(())
}

#[automock]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    /// Price the cart against every active, code-less promotion rule.
    ///
    /// Pure and idempotent. Fail-open: when the rule catalog cannot be
    /// read, the quote comes back with a zero discount rather than an
    /// error. Only malformed cart input is rejected.
    async fn evaluate_automatic_promotions(
        &self,
        lines: Vec<CartLine>,
        point_in_time: Zoned,
    ) -> Result<PricingResult, PromotionsServiceError>;
}
