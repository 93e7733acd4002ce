//! Products

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::currencies::StoreCurrency;

/// Catalog product id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Per-currency product prices, in minor units.
///
/// The base price is always present; the others are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPrices {
    /// Price in the base currency.
    pub base: i64,

    /// Price in roubles, if set.
    #[serde(default)]
    pub currency_b: Option<i64>,

    /// Price in US dollars, if set.
    #[serde(default)]
    pub currency_c: Option<i64>,
}

impl ProductPrices {
    /// Prices with only a base price.
    #[must_use]
    pub fn base_only(base: i64) -> Self {
        Self {
            base,
            currency_b: None,
            currency_c: None,
        }
    }

    /// The price field stored for `currency`, without fallback.
    #[must_use]
    pub fn field(&self, currency: StoreCurrency) -> Option<i64> {
        match currency {
            StoreCurrency::Thb => Some(self.base),
            StoreCurrency::Rub => self.currency_b,
            StoreCurrency::Usd => self.currency_c,
        }
    }
}

/// Product as seen by the cart: a snapshot of the catalog's display fields and price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product image URL
    #[serde(default)]
    pub image: Option<String>,

    /// Product category
    #[serde(default)]
    pub category: Option<String>,

    /// Product prices
    pub prices: ProductPrices,

    /// Whether the product can currently be ordered
    pub in_stock: bool,

    /// Size/strain options the customer can pick from
    #[serde(default)]
    pub sizes: SmallVec<[String; 4]>,
}

impl Product {
    /// Create an in-stock product with the given prices and no options.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, prices: ProductPrices) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
            category: None,
            prices,
            in_stock: true,
            sizes: SmallVec::new(),
        }
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn price_fields_map_to_currencies() {
        let prices = ProductPrices {
            base: 1500_00,
            currency_b: Some(3200_00),
            currency_c: None,
        };

        assert_eq!(prices.field(StoreCurrency::Thb), Some(1500_00));
        assert_eq!(prices.field(StoreCurrency::Rub), Some(3200_00));
        assert_eq!(prices.field(StoreCurrency::Usd), None);
    }

    #[test]
    fn snapshot_round_trips_through_json() -> TestResult {
        let mut product = Product::new("7", "Northern Lights", ProductPrices::base_only(900_00));
        product.sizes.push("sativa".to_string());

        let json = serde_json::to_string(&product)?;
        let parsed: Product = serde_json::from_str(&json)?;

        assert_eq!(parsed, product);

        Ok(())
    }
}
