//! Promo code validation seam.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    currencies::{Price, StoreCurrency},
    products::ProductId,
};

use super::PromoCode;

/// A request to validate a promo code against a priced cart.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoRequest {
    /// Normalised code
    pub code: PromoCode,

    /// Current cart subtotal
    pub subtotal: Price,

    /// Currency the subtotal is in
    pub currency: StoreCurrency,

    /// Ids of every product in the cart
    pub product_ids: Vec<ProductId>,
}

/// The validator's answer.
#[derive(Debug, Clone, PartialEq)]
pub enum PromoVerdict {
    /// The code applies, with an absolute discount in the request currency.
    Valid {
        /// Discount amount
        discount: Price,
    },

    /// The code does not apply.
    Invalid {
        /// Why not
        reason: String,
    },
}

/// Errors talking to a promo validator.
#[derive(Debug, Error)]
pub enum PromoValidatorError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The validator returned a non-2xx response or unexpected body.
    #[error("unexpected response from promo validator: {0}")]
    UnexpectedResponse(String),
}

/// External promo code validation.
#[automock]
#[async_trait]
pub trait PromoValidator: Send + Sync {
    /// Validate a code against the cart described by `request`.
    async fn validate(&self, request: PromoRequest) -> Result<PromoVerdict, PromoValidatorError>;
}
