//! Pricing

use rusty_money::{Money, MoneyError};
use thiserror::Error;

use crate::{
    currencies::{Price, StoreCurrency},
    items::LineItem,
    products::Product,
    promotions::PromoApplication,
};

/// Errors that can occur while calculating totals.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A line total or sum does not fit in minor units.
    #[error("total overflowed")]
    Overflow,
}

/// A price resolved for display. Derived on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    /// Currency the quote is in
    pub currency: StoreCurrency,

    /// Price of one unit
    pub unit_price: Price,

    /// Unit price times quantity
    pub line_total: Price,
}

/// Resolves per-currency prices, line totals and order totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingResolver;

impl PricingResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// The product's price in `currency`.
    ///
    /// Products without a price in `currency` are shown and charged at their base price.
    #[must_use]
    pub fn price_for(&self, product: &Product, currency: StoreCurrency) -> Price {
        let minor = product
            .prices
            .field(currency)
            .unwrap_or(product.prices.base);

        currency.minor(minor)
    }

    /// Quote a line item in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the line total overflows.
    pub fn quote(&self, item: &LineItem, currency: StoreCurrency) -> Result<PriceQuote, TotalPriceError> {
        let unit_price = self.price_for(&item.product, currency);

        let line_total = unit_price
            .to_minor_units()
            .checked_mul(i64::from(item.quantity))
            .ok_or(TotalPriceError::Overflow)?;

        Ok(PriceQuote {
            currency,
            unit_price,
            line_total: currency.minor(line_total),
        })
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the line total overflows.
    pub fn line_total(&self, item: &LineItem, currency: StoreCurrency) -> Result<Price, TotalPriceError> {
        Ok(self.quote(item, currency)?.line_total)
    }

    /// Sum of line totals. An empty cart totals zero.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if a line total overflows.
    pub fn cart_subtotal(&self, items: &[LineItem], currency: StoreCurrency) -> Result<Price, TotalPriceError> {
        items.iter().try_fold(currency.zero(), |acc, item| {
            Ok(acc.add(self.line_total(item, currency)?)?)
        })
    }

    /// Subtotal less the promo discount, never below zero.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Money`] if the promo is in a different currency to the subtotal.
    pub fn order_total(
        &self,
        subtotal: Price,
        promo: Option<&PromoApplication>,
    ) -> Result<Price, TotalPriceError> {
        let Some(promo) = promo else {
            return Ok(subtotal);
        };

        let total = subtotal.sub(promo.discount)?;

        if total.to_minor_units() < 0 {
            return Ok(Money::from_minor(0, subtotal.currency()));
        }

        Ok(total)
    }
}
