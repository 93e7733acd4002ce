//! Fixtures

use std::path::PathBuf;

use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogError},
    items::{LineItem, VariantKey},
    products::{Product, ProductId, ProductPrices},
};

pub mod remote;

pub use remote::InMemoryRemoteCart;

/// Fixture Loading Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Catalog could not be read or parsed
    #[error("failed to load catalog fixture: {0}")]
    Catalog(#[from] CatalogError),

    /// No catalog loaded yet
    #[error("no catalog loaded")]
    NoCatalog,

    /// Product not found
    #[error("product not found in fixture: {0}")]
    ProductNotFound(String),
}

/// A named catalog read from `./fixtures/catalogs`.
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    catalog: Option<Catalog>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create an empty fixture with the default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create an empty fixture with a custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: None,
        }
    }

    /// Load `catalogs/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogs").join(format!("{name}.yml"));

        self.catalog = Some(Catalog::load(file_path)?);

        Ok(self)
    }

    /// Load a fixture set by name
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalog(name)?;

        Ok(fixture)
    }

    /// The loaded catalog
    ///
    /// # Errors
    ///
    /// Returns an error if no catalog has been loaded.
    pub fn catalog(&self) -> Result<&Catalog, FixtureError> {
        self.catalog.as_ref().ok_or(FixtureError::NoCatalog)
    }

    /// Get a product by id
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, id: &str) -> Result<&Product, FixtureError> {
        self.catalog()?
            .get(&ProductId::new(id))
            .map_err(|_err| FixtureError::ProductNotFound(id.to_string()))
    }

    /// Build a line for the product with `id`
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn line(&self, id: &str, quantity: u32, variant: &str) -> Result<LineItem, FixtureError> {
        let product = self.product(id)?.clone();

        Ok(LineItem::new(product, quantity, VariantKey::parse(variant)))
    }
}

/// Lemon Haze flower, priced in every currency, with two strains.
#[must_use]
pub fn lemon_haze() -> Product {
    let mut product = Product::new(
        "7",
        "Lemon Haze",
        ProductPrices {
            base: 1500_00,
            currency_b: Some(3200_00),
            currency_c: Some(45_00),
        },
    );

    product.category = Some("flower".to_string());
    product.sizes.push("sativa".to_string());
    product.sizes.push("indica".to_string());

    product
}

/// Mango gummies, priced in the base currency only.
#[must_use]
pub fn gummies() -> Product {
    let mut product = Product::new("9", "Mango Gummies", ProductPrices::base_only(350_00));

    product.category = Some("edibles".to_string());

    product
}

/// An out-of-stock tincture.
#[must_use]
pub fn sold_out_tincture() -> Product {
    let mut product = Product::new(
        "15",
        "CBD Tincture",
        ProductPrices {
            base: 1890_00,
            currency_b: None,
            currency_c: Some(55_00),
        },
    );

    product.in_stock = false;

    product
}
