//! Catalog
//!
//! Reads products from the storefront catalog and normalises them into [`Product`]s. Catalog
//! documents come from more than one producer, so the same field may arrive under several
//! names (`productCategory`, `product_category`, ...); every alias is resolved here so nothing
//! downstream has to care.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    currencies::{CurrencyError, to_minor_units},
    products::{Product, ProductId, ProductPrices},
};

/// Catalog loading and lookup errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse YAML catalog: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// JSON parsing error
    #[error("failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// A record has no base price to fall back to
    #[error("product {0} has no base price")]
    MissingBasePrice(ProductId),

    /// A price could not be converted to minor units
    #[error("product {0} has an invalid price")]
    InvalidPrice(ProductId, #[source] CurrencyError),

    /// Product not found
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
}

/// Product id as it appears on the wire: catalogs emit both strings and integers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Text(String),
    Number(u64),
}

/// A single size, or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordSizes {
    One(String),
    Many(Vec<String>),
}

/// Product record as read from a catalog document.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    #[serde(alias = "_id", alias = "productId", alias = "product_id")]
    id: RecordId,

    #[serde(alias = "title")]
    name: String,

    #[serde(default, alias = "img", alias = "imageUrl", alias = "image_url")]
    image: Option<String>,

    #[serde(default, alias = "productCategory", alias = "product_category")]
    category: Option<String>,

    #[serde(default, alias = "priceBase", alias = "price_base", alias = "price")]
    base_price: Option<Decimal>,

    #[serde(default, alias = "priceCurrencyB", alias = "price_currency_b")]
    currency_b_price: Option<Decimal>,

    #[serde(default, alias = "priceCurrencyC", alias = "price_currency_c")]
    currency_c_price: Option<Decimal>,

    #[serde(default = "default_in_stock", alias = "inStock")]
    in_stock: bool,

    #[serde(default, alias = "size", alias = "strains")]
    sizes: Option<RecordSizes>,
}

fn default_in_stock() -> bool {
    true
}

impl TryFrom<CatalogRecord> for Product {
    type Error = CatalogError;

    fn try_from(record: CatalogRecord) -> Result<Self, Self::Error> {
        let id = match record.id {
            RecordId::Text(id) => ProductId::new(id.trim()),
            RecordId::Number(id) => ProductId::new(id.to_string()),
        };

        let Some(base) = record.base_price else {
            return Err(CatalogError::MissingBasePrice(id));
        };

        let minor = |amount: Decimal| {
            to_minor_units(amount).map_err(|err| CatalogError::InvalidPrice(id.clone(), err))
        };

        let prices = ProductPrices {
            base: minor(base)?,
            currency_b: record.currency_b_price.map(minor).transpose()?,
            currency_c: record.currency_c_price.map(minor).transpose()?,
        };

        let sizes: SmallVec<[String; 4]> = match record.sizes {
            Some(RecordSizes::One(size)) => [size].into_iter().collect(),
            Some(RecordSizes::Many(sizes)) => sizes.into_iter().collect(),
            None => SmallVec::new(),
        };

        Ok(Product {
            id,
            name: record.name,
            image: record.image.filter(|image| !image.is_empty()),
            category: record.category.filter(|category| !category.is_empty()),
            prices,
            in_stock: record.in_stock,
            sizes: sizes
                .into_iter()
                .map(|size| size.trim().to_string())
                .filter(|size| !size.is_empty())
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped { products: Vec<CatalogRecord> },
    Bare(Vec<CatalogRecord>),
}

impl CatalogDocument {
    fn into_records(self) -> Vec<CatalogRecord> {
        match self {
            CatalogDocument::Wrapped { products } | CatalogDocument::Bare(products) => products,
        }
    }
}

/// The product catalog, indexed by product id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from already-normalised products. Later duplicates replace earlier ones.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Catalog::default();

        for product in products {
            if let Some(&existing) = catalog.index.get(&product.id) {
                if let Some(slot) = catalog.products.get_mut(existing) {
                    *slot = product;
                }
            } else {
                catalog.index.insert(product.id.clone(), catalog.products.len());
                catalog.products.push(product);
            }
        }

        catalog
    }

    /// Build a catalog from raw records.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if any record cannot be normalised.
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Result<Self, CatalogError> {
        let products = records
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(products))
    }

    /// Parse a YAML catalog: either a list of records or a `products:` list.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the document or any record is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_norway::from_str(yaml)?;

        Self::from_records(document.into_records())
    }

    /// Parse a JSON catalog: either an array of records or a `{"products": [...]}` object.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the document or any record is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;

        Self::from_records(document.into_records())
    }

    /// Load a catalog file, picking the format from its extension (`.json`, otherwise YAML).
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Look up a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if the id is unknown.
    pub fn get(&self, id: &ProductId) -> Result<&Product, CatalogError> {
        self.index
            .get(id)
            .and_then(|&idx| self.products.get(idx))
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    /// Iterate over products in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn aliased_fields_normalise_to_one_shape() -> TestResult {
        let json = r#"[
            {"id": "7", "name": "Lemon Haze", "productCategory": "flower", "priceBase": 1500, "priceCurrencyB": 3200, "priceCurrencyC": 45, "inStock": true, "size": ["sativa", "indica"]},
            {"_id": 9, "title": "Gummies", "product_category": "edibles", "price": "350.50", "in_stock": false}
        ]"#;

        let catalog = Catalog::from_json_str(json)?;

        let haze = catalog.get(&ProductId::new("7"))?;
        assert_eq!(haze.category.as_deref(), Some("flower"));
        assert_eq!(haze.prices.base, 1500_00);
        assert_eq!(haze.prices.currency_b, Some(3200_00));
        assert_eq!(haze.prices.currency_c, Some(45_00));
        assert_eq!(haze.sizes.as_slice(), ["sativa", "indica"]);

        let gummies = catalog.get(&ProductId::new("9"))?;
        assert_eq!(gummies.name, "Gummies");
        assert_eq!(gummies.category.as_deref(), Some("edibles"));
        assert_eq!(gummies.prices, ProductPrices::base_only(350_50));
        assert!(!gummies.in_stock);

        Ok(())
    }

    #[test]
    fn yaml_catalog_with_products_key() -> TestResult {
        let yaml = "
products:
  - id: '1'
    name: OG Kush
    priceBase: 800
    priceCurrencyC: 24
    size: hybrid
";

        let catalog = Catalog::from_yaml_str(yaml)?;
        let product = catalog.get(&ProductId::new("1"))?;

        assert_eq!(catalog.len(), 1);
        assert_eq!(product.prices.currency_b, None);
        assert_eq!(product.sizes.as_slice(), ["hybrid"]);
        assert!(product.in_stock, "stock flag defaults to true");

        Ok(())
    }

    #[test]
    fn record_without_base_price_is_rejected() {
        let result = Catalog::from_json_str(r#"[{"id": "3", "name": "Pre-roll", "priceCurrencyC": 5}]"#);

        assert!(
            matches!(result, Err(CatalogError::MissingBasePrice(ref id)) if id.as_str() == "3"),
            "expected MissingBasePrice, got {result:?}"
        );
    }

    #[test]
    fn unknown_product_is_not_found() {
        let catalog = Catalog::default();

        let result = catalog.get(&ProductId::new("404"));

        assert!(matches!(result, Err(CatalogError::ProductNotFound(_))));
    }

    #[test]
    fn later_duplicates_replace_earlier_ones() -> TestResult {
        let catalog = Catalog::from_json_str(
            r#"[{"id": "1", "name": "Old", "price": 1}, {"id": "1", "name": "New", "price": 2}]"#,
        )?;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&ProductId::new("1"))?.name, "New");

        Ok(())
    }
}
