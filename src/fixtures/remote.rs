//! In-memory server cart

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::{
    items::{LineItem, LineItemUuid},
    ledger::{CustomerUuid, RemoteCart, RemoteCartError},
};

/// [`RemoteCart`] holding carts in memory, keyed on customer, with optional failure injection.
///
/// Upserts are matched on product and variant, as the cart service does, so a line sent with a
/// client-generated id takes over the id of the line it replaces.
#[derive(Debug, Default)]
pub struct InMemoryRemoteCart {
    carts: Mutex<FxHashMap<CustomerUuid, Vec<LineItem>>>,
    writes: AtomicUsize,
    fail_after: Option<usize>,
}

impl InMemoryRemoteCart {
    /// Create a service with no carts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `customer`'s cart.
    #[must_use]
    pub fn with_cart(self, customer: CustomerUuid, items: Vec<LineItem>) -> Self {
        if let Ok(mut carts) = self.carts.lock() {
            carts.insert(customer, items);
        }

        self
    }

    /// Accept `writes` successful writes, then fail every write after.
    #[must_use]
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// A copy of `customer`'s cart.
    pub fn cart(&self, customer: CustomerUuid) -> Vec<LineItem> {
        self.carts
            .lock()
            .map(|carts| carts.get(&customer).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Number of writes attempted, including failed ones.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) -> Result<(), RemoteCartError> {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst);

        match self.fail_after {
            Some(limit) if attempt >= limit => Err(RemoteCartError::UnexpectedResponse(
                "cart write failed with status 503 Service Unavailable".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn with_cart_mut<R>(
        &self,
        customer: CustomerUuid,
        f: impl FnOnce(&mut Vec<LineItem>) -> R,
    ) -> Result<R, RemoteCartError> {
        let mut carts = self
            .carts
            .lock()
            .map_err(|_err| RemoteCartError::UnexpectedResponse("cart store poisoned".to_string()))?;

        Ok(f(carts.entry(customer).or_default()))
    }
}

#[async_trait]
impl RemoteCart for InMemoryRemoteCart {
    async fn fetch_cart(&self, customer: CustomerUuid) -> Result<Vec<LineItem>, RemoteCartError> {
        Ok(self.cart(customer))
    }

    async fn upsert_item(
        &self,
        customer: CustomerUuid,
        item: LineItem,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        self.record_write()?;

        self.with_cart_mut(customer, |cart| {
            let existing = cart
                .iter_mut()
                .find(|line| line.uuid == item.uuid || line.matches(&item.product.id, item.variant.as_ref()));

            match existing {
                Some(line) => {
                    line.product = item.product;
                    line.quantity = item.quantity;
                }
                None => cart.push(item),
            }

            cart.clone()
        })
    }

    async fn delete_item(
        &self,
        customer: CustomerUuid,
        item: LineItemUuid,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        self.record_write()?;

        self.with_cart_mut(customer, |cart| {
            cart.retain(|line| line.uuid != item);
            cart.clone()
        })
    }

    async fn clear_cart(&self, customer: CustomerUuid) -> Result<(), RemoteCartError> {
        self.record_write()?;

        self.with_cart_mut(customer, Vec::clear)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{fixtures::lemon_haze, items::VariantKey};

    use super::*;

    #[tokio::test]
    async fn upsert_keeps_the_server_line_id() -> TestResult {
        let customer = CustomerUuid::now_v7();
        let seeded = LineItem::new(lemon_haze(), 1, VariantKey::parse("sativa"));
        let remote = InMemoryRemoteCart::new().with_cart(customer, vec![seeded.clone()]);

        let echo = remote
            .upsert_item(customer, LineItem::new(lemon_haze(), 4, VariantKey::parse("sativa")))
            .await?;

        assert_eq!(echo.len(), 1);
        assert_eq!(echo.first().map(|line| (line.uuid, line.quantity)), Some((seeded.uuid, 4)));

        Ok(())
    }

    #[tokio::test]
    async fn writes_fail_after_the_limit() -> TestResult {
        let customer = CustomerUuid::now_v7();
        let remote = InMemoryRemoteCart::new().fail_after(1);

        remote.upsert_item(customer, LineItem::new(lemon_haze(), 1, None)).await?;

        let result = remote.clear_cart(customer).await;

        assert!(matches!(result, Err(RemoteCartError::UnexpectedResponse(_))), "got {result:?}");
        assert_eq!(remote.cart(customer).len(), 1);
        assert_eq!(remote.writes(), 2);

        Ok(())
    }
}
