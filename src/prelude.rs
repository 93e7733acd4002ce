//! Storefront cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, CatalogError},
    currencies::{CurrencyError, Price, StoreCurrency},
    http::{ApiConfig, HttpOrderSubmitter, HttpPromoValidator, HttpRemoteCart},
    items::{LineItem, LineItemUuid, VariantKey},
    ledger::{
        CART_STORAGE_KEY, CartError, CartLedger, CartMode, CartStore, CustomerUuid,
        FileCartStore, MemoryCartStore, RemoteCart, RemoteCartError, StoreError,
    },
    orders::{OrderConfirmation, OrderSnapshot, OrderSubmitError, OrderSubmitter},
    pricing::{PriceQuote, PricingResolver, TotalPriceError},
    products::{Product, ProductId, ProductPrices},
    promotions::{
        PromoApplication, PromoCode, PromoError, PromoState, PromoValidator, PromoValidatorError,
        PromoVerdict,
    },
    receipt::{Receipt, ReceiptError},
};
