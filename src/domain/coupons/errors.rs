//! Coupons service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// User-facing coupon failures are distinguishable kinds so the caller can
/// render a precise message; only `Sql` is opaque.
#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon not found")]
    NotFound,

    #[error("coupon is outside its validity window")]
    Expired,

    #[error("coupon usage limit reached")]
    UsageLimitExceeded,

    #[error("order amount below coupon minimum, short by {shortfall}")]
    MinOrderNotMet { shortfall: u64 },

    #[error("coupon already redeemed by this user")]
    AlreadyRedeemed,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CouponsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            // The redemption table's (coupon, user) primary key.
            Some(ErrorKind::UniqueViolation) => Self::AlreadyRedeemed,
            // The used_count <= usage_limit check on coupons.
            Some(ErrorKind::CheckViolation) => Self::UsageLimitExceeded,
            _ => Self::Sql(error),
        }
    }
}
