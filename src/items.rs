//! Items

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Unexpected},
};

use crate::{
    products::{Product, ProductId},
    uuids::TypedUuid,
};

/// Line Item UUID
pub type LineItemUuid = TypedUuid<LineItem>;

/// Optional discriminator between otherwise identical selections of one product (a strain,
/// flavour or size).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VariantKey(String);

impl VariantKey {
    /// Normalise a raw selection; blank input means "no variant".
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();

        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for VariantKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        Self::parse(&raw)
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Str(&raw), &"a non-blank variant"))
    }
}

/// Stored carts and server echoes may carry `""` where they mean no variant.
fn deserialize_variant<'de, D>(deserializer: D) -> Result<Option<VariantKey>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(VariantKey::parse))
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a cart: a product, an optional variant and a quantity of at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line id, unique within the cart
    pub uuid: LineItemUuid,

    /// Snapshot of the product's display fields and price list
    pub product: Product,

    /// Quantity
    pub quantity: u32,

    /// Selected variant
    #[serde(default, deserialize_with = "deserialize_variant")]
    pub variant: Option<VariantKey>,
}

impl LineItem {
    /// Create a line with a fresh id.
    #[must_use]
    pub fn new(product: Product, quantity: u32, variant: Option<VariantKey>) -> Self {
        Self {
            uuid: LineItemUuid::now_v7(),
            product,
            quantity,
            variant,
        }
    }

    /// The catalog id of the line's product.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Whether this line holds `product` with `variant`.
    #[must_use]
    pub fn matches(&self, product: &ProductId, variant: Option<&VariantKey>) -> bool {
        self.product.id == *product && self.variant.as_ref() == variant
    }
}

/// Find the line holding `product` with `variant`.
pub fn find_line<'a>(
    items: &'a [LineItem],
    product: &ProductId,
    variant: Option<&VariantKey>,
) -> Option<&'a LineItem> {
    items.iter().find(|item| item.matches(product, variant))
}
