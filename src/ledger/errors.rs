//! Cart ledger errors.

use thiserror::Error;

use crate::{
    ledger::remote::{CustomerUuid, RemoteCartError},
    orders::OrderSubmitError,
    pricing::TotalPriceError,
    products::ProductId,
    promotions::PromoError,
};

/// Errors returned by [`CartLedger`](crate::ledger::CartLedger) operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantities must be between 1 and `u32::MAX`.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The product cannot be ordered right now.
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    /// Adding to the line would overflow its quantity.
    #[error("line quantity overflowed")]
    QuantityOverflow,

    /// The ledger already belongs to a customer.
    #[error("cart already belongs to customer {0}")]
    AlreadyAuthenticated(CustomerUuid),

    /// There is nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// The server-side cart could not be updated or read.
    #[error(transparent)]
    Remote(#[from] RemoteCartError),

    /// A promo code could not be applied.
    #[error(transparent)]
    Promo(#[from] PromoError),

    /// Totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] TotalPriceError),

    /// The order could not be submitted.
    #[error(transparent)]
    Order(#[from] OrderSubmitError),
}
