//! Promotions service errors.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PromotionsServiceError {
    /// A cart line carried a zero quantity. Malformed input is rejected
    /// outright, never coerced.
    #[error("cart line for product {product_uuid} has zero quantity")]
    ZeroQuantity { product_uuid: Uuid },
}
