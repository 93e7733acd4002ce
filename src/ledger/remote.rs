//! Server-side cart persistence seam.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    items::{LineItem, LineItemUuid},
    uuids::TypedUuid,
};

/// Marker for customer ids.
#[derive(Debug)]
pub enum Customer {}

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// Errors from the server-side cart.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx response or unexpected body.
    #[error("unexpected response from cart service: {0}")]
    UnexpectedResponse(String),
}

/// The authenticated customer's server-held cart.
///
/// Mutations answer with the server's copy of the whole cart, which replaces whatever the client
/// held.
#[automock]
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Fetch the customer's cart.
    async fn fetch_cart(&self, customer: CustomerUuid) -> Result<Vec<LineItem>, RemoteCartError>;

    /// Insert or replace a line, keyed on its product and variant.
    async fn upsert_item(
        &self,
        customer: CustomerUuid,
        item: LineItem,
    ) -> Result<Vec<LineItem>, RemoteCartError>;

    /// Delete a line.
    async fn delete_item(
        &self,
        customer: CustomerUuid,
        item: LineItemUuid,
    ) -> Result<Vec<LineItem>, RemoteCartError>;

    /// Delete every line.
    async fn clear_cart(&self, customer: CustomerUuid) -> Result<(), RemoteCartError>;
}
