//! Storefront Cart
//!
//! Cart and checkout core for the storefront: a ledger of line items that survives the move from
//! an anonymous, client-held cart to an authenticated, server-held cart, plus multi-currency
//! pricing and promo-code discounts applied against a priced snapshot.

pub mod catalog;
pub mod currencies;
pub mod fixtures;
pub mod http;
pub mod items;
pub mod ledger;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod receipt;
pub mod uuids;
