//! Promotions
//!
//! Promo codes are validated by an external service against a specific subtotal, currency and
//! set of products. The resulting [`PromoApplication`] is only honoured while the cart still
//! prices to that same subtotal in that same currency.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    currencies::{CurrencyError, Price, StoreCurrency},
    pricing::{PricingResolver, TotalPriceError},
    products::ProductId,
};

pub mod validator;

pub use validator::{
    MockPromoValidator, PromoRequest, PromoValidator, PromoValidatorError, PromoVerdict,
};

/// Errors raised while applying a promo code.
#[derive(Debug, Error)]
pub enum PromoError {
    /// The code was empty after trimming.
    #[error("promo code is empty")]
    EmptyCode,

    /// There is nothing in the cart to discount.
    #[error("cannot apply a promo code to an empty cart")]
    EmptyCart,

    /// The validator rejected the code.
    #[error("promo code {code} was rejected: {reason}")]
    Rejected {
        /// The normalised code that was sent
        code: PromoCode,

        /// Reason given by the validator
        reason: String,
    },

    /// The validator returned a discount below zero.
    #[error("promo code {0} returned a negative discount")]
    NegativeDiscount(PromoCode),

    /// The validator returned an amount that cannot be represented.
    #[error(transparent)]
    InvalidAmount(#[from] CurrencyError),

    /// The validator could not be reached or answered unexpectedly.
    #[error(transparent)]
    Validator(#[from] PromoValidatorError),

    /// The cart could not be priced.
    #[error(transparent)]
    Pricing(#[from] TotalPriceError),
}

/// A promo code, trimmed and uppercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    /// Normalise user input; blank input is not a code.
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let normalised = raw.as_ref().trim().to_uppercase();

        if normalised.is_empty() {
            None
        } else {
            Some(Self(normalised))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated discount, scoped to the subtotal and currency it was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoApplication {
    /// Normalised code
    pub code: PromoCode,

    /// Absolute discount, in `currency`
    pub discount: Price,

    /// Subtotal the discount was validated against
    pub subtotal: Price,

    /// Currency the discount was validated in
    pub currency: StoreCurrency,

    /// When the validator accepted the code
    pub validated_at: Timestamp,
}

impl PromoApplication {
    /// Whether the discount still applies to a cart pricing to `subtotal` in `currency`.
    #[must_use]
    pub fn is_valid_for(&self, subtotal: &Price, currency: StoreCurrency) -> bool {
        self.currency == currency && self.subtotal == *subtotal
    }
}

/// Where a cart's promo code is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PromoState {
    /// No code applied.
    #[default]
    Unapplied,

    /// A code has been sent for validation.
    Pending(PromoCode),

    /// A code was accepted.
    Applied(PromoApplication),
}

impl PromoState {
    /// The applied promo, if any.
    #[must_use]
    pub fn applied(&self) -> Option<&PromoApplication> {
        match self {
            PromoState::Applied(application) => Some(application),
            PromoState::Unapplied | PromoState::Pending(_) => None,
        }
    }

    /// Drop any applied or pending code. Returns the code that was dropped.
    pub fn invalidate(&mut self) -> Option<PromoCode> {
        match std::mem::take(self) {
            PromoState::Applied(application) => Some(application.code),
            PromoState::Pending(code) => Some(code),
            PromoState::Unapplied => None,
        }
    }
}

impl PricingResolver {
    /// Validate `code` against a priced cart.
    ///
    /// Empty codes and empty carts are rejected without contacting the validator.
    ///
    /// # Errors
    ///
    /// - [`PromoError::EmptyCode`] / [`PromoError::EmptyCart`]: rejected locally.
    /// - [`PromoError::Rejected`]: the validator refused the code.
    /// - [`PromoError::NegativeDiscount`]: the validator answered with a negative discount.
    /// - [`PromoError::Validator`]: the validator failed.
    pub async fn apply_promo(
        &self,
        validator: &dyn PromoValidator,
        code: &str,
        subtotal: Price,
        product_ids: &[ProductId],
        currency: StoreCurrency,
    ) -> Result<PromoApplication, PromoError> {
        let code = PromoCode::parse(code).ok_or(PromoError::EmptyCode)?;

        if product_ids.is_empty() {
            return Err(PromoError::EmptyCart);
        }

        debug!(%code, %subtotal, %currency, "validating promo code");

        let verdict = validator
            .validate(PromoRequest {
                code: code.clone(),
                subtotal,
                currency,
                product_ids: product_ids.to_vec(),
            })
            .await?;

        match verdict {
            PromoVerdict::Valid { discount } if discount.to_minor_units() < 0 => {
                Err(PromoError::NegativeDiscount(code))
            }
            PromoVerdict::Valid { discount } => Ok(PromoApplication {
                code,
                discount,
                subtotal,
                currency,
                validated_at: Timestamp::now(),
            }),
            PromoVerdict::Invalid { reason } => Err(PromoError::Rejected { code, reason }),
        }
    }
}
