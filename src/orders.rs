//! Orders
//!
//! The checkout hands an [`OrderSnapshot`] to the order service: every line priced in the
//! checkout currency, the discount actually honoured, the delivery fee and the final total.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    currencies::{Price, StoreCurrency, to_major_units},
    items::{LineItem, VariantKey},
    pricing::{PricingResolver, TotalPriceError},
    products::ProductId,
    promotions::{PromoApplication, PromoCode},
};

/// Errors submitting an order.
#[derive(Debug, Error)]
pub enum OrderSubmitError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The order service returned a non-2xx response or unexpected body.
    #[error("unexpected response from order service: {0}")]
    UnexpectedResponse(String),
}

/// One priced order line.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// Product id
    pub product_id: ProductId,

    /// Product name at checkout
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Resolved unit price
    pub unit_price: Price,

    /// Unit price times quantity
    pub line_total: Price,

    /// Selected variant
    pub variant: Option<VariantKey>,
}

/// Everything the order service needs to price an order, fixed at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    /// Lines in cart order
    pub lines: Vec<OrderLine>,

    /// Sum of line totals
    pub subtotal: Price,

    /// Discount honoured; never more than the subtotal
    pub discount: Price,

    /// Delivery fee supplied by the caller
    pub delivery_fee: Price,

    /// `subtotal - discount + delivery_fee`
    pub total: Price,

    /// Checkout currency
    pub currency: StoreCurrency,

    /// Promo code honoured, if any
    pub promo_code: Option<PromoCode>,

    /// When the snapshot was taken
    pub assembled_at: Timestamp,
}

impl OrderSnapshot {
    /// Price `items` in `currency` and fold in the promo and delivery fee.
    ///
    /// `promo` must already be known to match the cart; it is applied as given.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if a total overflows or the delivery fee is in another
    /// currency.
    pub fn assemble(
        items: &[LineItem],
        currency: StoreCurrency,
        resolver: &PricingResolver,
        promo: Option<&PromoApplication>,
        delivery_fee: Price,
    ) -> Result<Self, TotalPriceError> {
        let lines = items
            .iter()
            .map(|item| {
                let quote = resolver.quote(item, currency)?;

                Ok(OrderLine {
                    product_id: item.product.id.clone(),
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    unit_price: quote.unit_price,
                    line_total: quote.line_total,
                    variant: item.variant.clone(),
                })
            })
            .collect::<Result<Vec<_>, TotalPriceError>>()?;

        let subtotal = resolver.cart_subtotal(items, currency)?;
        let discounted = resolver.order_total(subtotal, promo)?;
        let discount = subtotal.sub(discounted)?;
        let total = discounted.add(delivery_fee)?;

        Ok(Self {
            lines,
            subtotal,
            discount,
            delivery_fee,
            total,
            currency,
            promo_code: promo.map(|promo| promo.code.clone()),
            assembled_at: Timestamp::now(),
        })
    }

    /// The wire form of this snapshot.
    #[must_use]
    pub fn to_payload(&self) -> OrderPayload {
        OrderPayload {
            lines: self
                .lines
                .iter()
                .map(|line| OrderLinePayload {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: to_major_units(line.unit_price.to_minor_units()),
                    line_total: to_major_units(line.line_total.to_minor_units()),
                    variant: line.variant.clone(),
                })
                .collect(),
            subtotal: to_major_units(self.subtotal.to_minor_units()),
            discount: to_major_units(self.discount.to_minor_units()),
            delivery_fee: to_major_units(self.delivery_fee.to_minor_units()),
            total: to_major_units(self.total.to_minor_units()),
            currency: self.currency,
            promo_code: self.promo_code.clone(),
            assembled_at: self.assembled_at,
        }
    }
}

/// Order line as sent to the order service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    /// Product id
    pub product_id: ProductId,

    /// Product name
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price in major units
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub unit_price: Decimal,

    /// Line total in major units
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub line_total: Decimal,

    /// Selected variant
    pub variant: Option<VariantKey>,
}

/// Order as sent to the order service. Amounts are in major units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// Lines
    pub lines: Vec<OrderLinePayload>,

    /// Subtotal
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,

    /// Discount
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub discount: Decimal,

    /// Delivery fee
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub delivery_fee: Decimal,

    /// Total
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,

    /// ISO currency code
    pub currency: StoreCurrency,

    /// Promo code honoured
    pub promo_code: Option<PromoCode>,

    /// When the snapshot was taken
    pub assembled_at: Timestamp,
}

/// The order service's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    /// Order id assigned by the order service
    #[serde(alias = "id", alias = "_id", alias = "order_id")]
    pub order_id: String,
}

/// External order creation.
#[automock]
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Create an order from `order`.
    async fn submit(&self, order: OrderPayload) -> Result<OrderConfirmation, OrderSubmitError>;
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use serde_json::json;
    use testresult::TestResult;

    use crate::products::{Product, ProductPrices};

    use super::*;

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new(
                Product::new(
                    "7",
                    "Lemon Haze",
                    ProductPrices {
                        base: 1500_00,
                        currency_b: Some(3200_00),
                        currency_c: Some(45_00),
                    },
                ),
                2,
                VariantKey::parse("sativa"),
            ),
            LineItem::new(Product::new("9", "Gummies", ProductPrices::base_only(350_00)), 1, None),
        ]
    }

    #[test]
    fn assembles_lines_and_totals() -> TestResult {
        let resolver = PricingResolver::new();

        let snapshot = OrderSnapshot::assemble(
            &items(),
            StoreCurrency::Usd,
            &resolver,
            None,
            Money::from_minor(5_00, USD),
        )?;

        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines.first().map(|l| l.line_total), Some(Money::from_minor(90_00, USD)));
        // Gummies have no USD price and fall back to the base amount.
        assert_eq!(snapshot.lines.get(1).map(|l| l.unit_price), Some(Money::from_minor(350_00, USD)));
        assert_eq!(snapshot.subtotal, Money::from_minor(440_00, USD));
        assert_eq!(snapshot.discount, Money::from_minor(0, USD));
        assert_eq!(snapshot.total, Money::from_minor(445_00, USD));
        assert_eq!(snapshot.promo_code, None);

        Ok(())
    }

    #[test]
    fn discount_is_capped_at_subtotal() -> TestResult {
        let resolver = PricingResolver::new();
        let items = items();
        let subtotal = resolver.cart_subtotal(&items, StoreCurrency::Usd)?;

        let promo = PromoApplication {
            code: PromoCode::parse("everything").unwrap_or_default(),
            discount: Money::from_minor(1_000_00, USD),
            subtotal,
            currency: StoreCurrency::Usd,
            validated_at: Timestamp::now(),
        };

        let snapshot = OrderSnapshot::assemble(
            &items,
            StoreCurrency::Usd,
            &resolver,
            Some(&promo),
            Money::from_minor(5_00, USD),
        )?;

        assert_eq!(snapshot.discount, subtotal);
        assert_eq!(snapshot.total, Money::from_minor(5_00, USD));
        assert_eq!(snapshot.promo_code.as_ref().map(PromoCode::as_str), Some("EVERYTHING"));

        Ok(())
    }

    #[test]
    fn delivery_fee_in_another_currency_is_rejected() {
        let result = OrderSnapshot::assemble(
            &items(),
            StoreCurrency::Usd,
            &PricingResolver::new(),
            None,
            StoreCurrency::Thb.minor(100_00),
        );

        assert!(matches!(result, Err(TotalPriceError::Money(_))), "got {result:?}");
    }

    #[test]
    fn payload_uses_major_units_and_camel_case() -> TestResult {
        let snapshot = OrderSnapshot::assemble(
            &items(),
            StoreCurrency::Usd,
            &PricingResolver::new(),
            None,
            Money::from_minor(5_50, USD),
        )?;

        let payload = serde_json::to_value(snapshot.to_payload())?;

        assert_eq!(payload.pointer("/currency"), Some(&json!("USD")));
        assert_eq!(payload.pointer("/deliveryFee"), Some(&json!(5.5)));
        assert_eq!(payload.pointer("/total"), Some(&json!(445.5)));
        assert_eq!(payload.pointer("/lines/0/unitPrice"), Some(&json!(45.0)));
        assert_eq!(payload.pointer("/lines/0/variant"), Some(&json!("sativa")));
        assert_eq!(payload.pointer("/promoCode"), Some(&json!(null)));

        Ok(())
    }

    #[test]
    fn confirmation_accepts_id_aliases() -> TestResult {
        let confirmation: OrderConfirmation = serde_json::from_str(r#"{"_id": "ord_1"}"#)?;

        assert_eq!(confirmation.order_id, "ord_1");

        Ok(())
    }
}
