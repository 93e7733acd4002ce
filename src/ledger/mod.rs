//! Cart Ledger
//!
//! The single source of truth for one shopping session's cart. An anonymous ledger keeps its
//! lines in client-local storage; once the shopper signs in the ledger merges those lines into
//! the customer's server-held cart and from then on the server is the system of record: every
//! write goes to the server first and the ledger adopts the server's echo, so a failed write
//! leaves the ledger untouched.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    currencies::{Price, StoreCurrency},
    items::{LineItem, LineItemUuid, VariantKey, find_line},
    orders::{OrderConfirmation, OrderSnapshot, OrderSubmitter},
    pricing::{PriceQuote, PricingResolver, TotalPriceError},
    products::{Product, ProductId},
    promotions::{PromoApplication, PromoCode, PromoState, PromoValidator},
};

pub mod errors;
pub mod remote;
pub mod storage;

pub use errors::CartError;
pub use remote::{CustomerUuid, RemoteCart, RemoteCartError};
pub use storage::{CART_STORAGE_KEY, CartStore, FileCartStore, MemoryCartStore, StoreError};

/// Where the cart is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMode {
    /// Held by this client only.
    Anonymous,

    /// Held by the server for a signed-in customer.
    Authenticated(CustomerUuid),
}

#[derive(Debug, Serialize)]
struct StoredCartRef<'a> {
    items: &'a [LineItem],
}

#[derive(Debug, Deserialize)]
struct StoredCart {
    items: Vec<LineItem>,
}

/// A shopping session's cart.
pub struct CartLedger {
    items: Vec<LineItem>,
    mode: CartMode,
    currency: StoreCurrency,
    promo: PromoState,
    resolver: PricingResolver,
    store: Arc<dyn CartStore>,
    remote: Arc<dyn RemoteCart>,
}

impl fmt::Debug for CartLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartLedger")
            .field("items", &self.items)
            .field("mode", &self.mode)
            .field("currency", &self.currency)
            .field("promo", &self.promo)
            .finish_non_exhaustive()
    }
}

impl CartLedger {
    /// Create an empty, anonymous ledger. Call [`CartLedger::load`] to pick up a stored cart.
    pub fn new(
        store: Arc<dyn CartStore>,
        remote: Arc<dyn RemoteCart>,
        currency: StoreCurrency,
    ) -> Self {
        Self {
            items: Vec::new(),
            mode: CartMode::Anonymous,
            currency,
            promo: PromoState::Unapplied,
            resolver: PricingResolver::new(),
            store,
            remote,
        }
    }

    /// Lines in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line.
    #[must_use]
    pub fn get_item(&self, line: LineItemUuid) -> Option<&LineItem> {
        self.items.iter().find(|item| item.uuid == line)
    }

    /// Current persistence mode.
    #[must_use]
    pub fn mode(&self) -> CartMode {
        self.mode
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Checkout currency.
    #[must_use]
    pub fn currency(&self) -> StoreCurrency {
        self.currency
    }

    /// Change the checkout currency. A promo validated in another currency no longer applies.
    pub fn set_currency(&mut self, currency: StoreCurrency) {
        if self.currency != currency {
            self.currency = currency;
            self.invalidate_promo("currency changed");
        }
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line totals in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if a total overflows.
    pub fn total_price(&self, currency: StoreCurrency) -> Result<Price, TotalPriceError> {
        self.resolver.cart_subtotal(&self.items, currency)
    }

    /// One quote per line, in display order.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if a line total overflows.
    pub fn quotes(&self, currency: StoreCurrency) -> Result<Vec<PriceQuote>, TotalPriceError> {
        self.items
            .iter()
            .map(|item| self.resolver.quote(item, currency))
            .collect()
    }

    /// Where the promo code is in its lifecycle.
    #[must_use]
    pub fn promo_state(&self) -> &PromoState {
        &self.promo
    }

    /// The applied promo, if it still matches the cart's subtotal and currency.
    #[must_use]
    pub fn applied_promo(&self) -> Option<&PromoApplication> {
        let application = self.promo.applied()?;
        let subtotal = self.total_price(self.currency).ok()?;

        application
            .is_valid_for(&subtotal, self.currency)
            .then_some(application)
    }

    /// Drop any applied promo.
    pub fn remove_promo(&mut self) {
        self.invalidate_promo("promo removed");
    }

    /// Add `quantity` of `product`, merging into the existing line for the same variant.
    ///
    /// Returns the id of the line that now holds the product.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is below one; nothing is sent anywhere.
    /// - [`CartError::OutOfStock`] if the product cannot be ordered.
    /// - [`CartError::QuantityOverflow`] if the merged quantity overflows.
    /// - [`CartError::Remote`] if the server rejects the write; the ledger is unchanged.
    pub async fn add_item(
        &mut self,
        product: &Product,
        quantity: i64,
        variant: Option<VariantKey>,
    ) -> Result<LineItemUuid, CartError> {
        let quantity = validate_quantity(quantity)?;

        if !product.in_stock {
            return Err(CartError::OutOfStock(product.id.clone()));
        }

        let line = match find_line(&self.items, &product.id, variant.as_ref()) {
            Some(existing) => LineItem {
                uuid: existing.uuid,
                product: product.clone(),
                quantity: existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::QuantityOverflow)?,
                variant,
            },
            None => LineItem::new(product.clone(), quantity, variant),
        };

        let fallback = line.uuid;
        let product_id = line.product.id.clone();
        let variant = line.variant.clone();

        debug!(product = %product_id, quantity = line.quantity, "adding to cart");

        self.write_line(line).await?;

        Ok(find_line(&self.items, &product_id, variant.as_ref()).map_or(fallback, |item| item.uuid))
    }

    /// Overwrite a line's quantity. Zero or less removes the line; an unknown line is ignored.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` exceeds `u32::MAX`.
    /// - [`CartError::Remote`] if the server rejects the write; the ledger is unchanged.
    pub async fn set_quantity(&mut self, line: LineItemUuid, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(line).await;
        }

        let quantity = validate_quantity(quantity)?;

        let Some(existing) = self.get_item(line) else {
            debug!(%line, "ignoring quantity change for unknown line");
            return Ok(());
        };

        let updated = LineItem {
            quantity,
            ..existing.clone()
        };

        self.write_line(updated).await
    }

    /// Remove a line. Removing an unknown line does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Remote`] if the server rejects the delete; the ledger is unchanged.
    pub async fn remove_item(&mut self, line: LineItemUuid) -> Result<(), CartError> {
        if self.get_item(line).is_none() {
            return Ok(());
        }

        debug!(%line, "removing from cart");

        match self.mode {
            CartMode::Anonymous => {
                self.items.retain(|item| item.uuid != line);
                self.persist_local();
            }
            CartMode::Authenticated(customer) => {
                self.items = self.remote.delete_item(customer, line).await?;
            }
        }

        self.invalidate_promo("line removed");

        Ok(())
    }

    /// Empty the cart and its persisted copy.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Remote`] if the server cart cannot be cleared; the ledger is
    /// unchanged.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        match self.mode {
            CartMode::Anonymous => {
                if let Err(err) = self.store.remove(CART_STORAGE_KEY) {
                    warn!(%err, "failed to clear stored cart");
                }
            }
            CartMode::Authenticated(customer) => {
                self.remote.clear_cart(customer).await?;
            }
        }

        self.items.clear();
        self.invalidate_promo("cart cleared");

        Ok(())
    }

    /// Replace the ledger's lines with the persisted cart.
    ///
    /// A stored anonymous cart that can't be parsed is discarded and the ledger starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Remote`] if the server cart cannot be fetched.
    pub async fn load(&mut self) -> Result<(), CartError> {
        self.items = match self.mode {
            CartMode::Anonymous => self.read_local(),
            CartMode::Authenticated(customer) => self.remote.fetch_cart(customer).await?,
        };

        if self.promo.applied().is_some() && self.applied_promo().is_none() {
            self.invalidate_promo("cart changed on reload");
        }

        Ok(())
    }

    /// Sign `customer` in, merging the anonymous cart into their server cart.
    ///
    /// Every anonymous line is added to the server cart, on top of whatever quantity the server
    /// already holds for the same product and variant. If the server fails part-way, lines that
    /// were already merged are dropped from the anonymous cart so a retry does not add them
    /// twice, and the ledger stays anonymous.
    ///
    /// # Errors
    ///
    /// - [`CartError::AlreadyAuthenticated`] if a customer is already signed in.
    /// - [`CartError::Remote`] if the server cart cannot be read or written.
    /// - [`CartError::QuantityOverflow`] if a merged quantity overflows.
    pub async fn authenticate(&mut self, customer: CustomerUuid) -> Result<(), CartError> {
        if let CartMode::Authenticated(current) = self.mode {
            return Err(CartError::AlreadyAuthenticated(current));
        }

        let mut server_items = self.remote.fetch_cart(customer).await?;
        let anonymous = std::mem::take(&mut self.items);

        let mut failure = None;

        for (merged, line) in anonymous.iter().enumerate() {
            match self.merge_line(customer, &server_items, line).await {
                Ok(echo) => server_items = echo,
                Err(err) => {
                    failure = Some((merged, err));
                    break;
                }
            }
        }

        if let Some((merged, err)) = failure {
            warn!(%customer, %err, merged, "cart merge failed part-way");

            self.items = anonymous.into_iter().skip(merged).collect();

            if merged > 0 {
                self.persist_local();
                self.invalidate_promo("cart partially merged");
            }

            return Err(err);
        }

        self.mode = CartMode::Authenticated(customer);
        self.items = server_items;

        if let Err(err) = self.store.remove(CART_STORAGE_KEY) {
            warn!(%err, "failed to clear stored anonymous cart after sign-in");
        }

        self.invalidate_promo("signed in");

        info!(%customer, merged = anonymous.len(), lines = self.items.len(), "cart reconciled");

        Ok(())
    }

    /// Sign out, leaving an empty anonymous cart. The server cart is left as it is.
    pub fn sign_out(&mut self) {
        if let CartMode::Authenticated(customer) = self.mode {
            info!(%customer, "signed out");
        }

        self.mode = CartMode::Anonymous;
        self.items.clear();
        self.invalidate_promo("signed out");

        if let Err(err) = self.store.remove(CART_STORAGE_KEY) {
            warn!(%err, "failed to clear stored cart on sign-out");
        }
    }

    /// Validate `code` against the cart as it is priced now, in the checkout currency.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Promo`] if the code is empty, the cart is empty, the validator
    /// rejects the code or can't be reached. The promo is left unapplied.
    pub async fn apply_promo(
        &mut self,
        code: &str,
        validator: &dyn PromoValidator,
    ) -> Result<PromoApplication, CartError> {
        let subtotal = self.total_price(self.currency)?;

        let mut product_ids: Vec<ProductId> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !product_ids.contains(&item.product.id) {
                product_ids.push(item.product.id.clone());
            }
        }

        self.promo = PromoCode::parse(code).map_or(PromoState::Unapplied, PromoState::Pending);

        let result = self
            .resolver
            .apply_promo(validator, code, subtotal, &product_ids, self.currency)
            .await;

        match result {
            Ok(application) => {
                info!(code = %application.code, discount = %application.discount, "promo applied");

                self.promo = PromoState::Applied(application.clone());

                Ok(application)
            }
            Err(err) => {
                self.promo = PromoState::Unapplied;

                Err(err.into())
            }
        }
    }

    /// Price the cart for checkout in the checkout currency.
    ///
    /// A promo that no longer matches the cart is dropped rather than honoured.
    ///
    /// # Errors
    ///
    /// - [`CartError::EmptyCart`] if there is nothing to order.
    /// - [`CartError::Pricing`] if a total overflows or `delivery_fee` is in another currency.
    pub fn order_snapshot(&mut self, delivery_fee: Price) -> Result<OrderSnapshot, CartError> {
        if self.items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        if self.promo.applied().is_some() && self.applied_promo().is_none() {
            self.invalidate_promo("promo no longer matches cart");
        }

        Ok(OrderSnapshot::assemble(
            &self.items,
            self.currency,
            &self.resolver,
            self.applied_promo(),
            delivery_fee,
        )?)
    }

    /// Submit the cart as an order and empty it.
    ///
    /// Once the order service has accepted the order the cart is emptied locally even if the
    /// server cart can't be cleared; that failure is logged.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the snapshot cannot be built or the order service refuses it.
    /// The cart is unchanged.
    pub async fn submit_order(
        &mut self,
        delivery_fee: Price,
        submitter: &dyn OrderSubmitter,
    ) -> Result<OrderConfirmation, CartError> {
        let snapshot = self.order_snapshot(delivery_fee)?;

        let confirmation = submitter.submit(snapshot.to_payload()).await?;

        info!(
            order = %confirmation.order_id,
            total = %snapshot.total,
            lines = snapshot.lines.len(),
            "order submitted"
        );

        if let Err(err) = self.clear().await {
            warn!(%err, order = %confirmation.order_id, "order placed but cart could not be cleared");

            self.items.clear();
            self.invalidate_promo("order placed");
        }

        Ok(confirmation)
    }

    async fn merge_line(
        &self,
        customer: CustomerUuid,
        server_items: &[LineItem],
        line: &LineItem,
    ) -> Result<Vec<LineItem>, CartError> {
        let upsert = match find_line(server_items, line.product_id(), line.variant.as_ref()) {
            Some(existing) => LineItem {
                uuid: existing.uuid,
                product: line.product.clone(),
                quantity: existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(CartError::QuantityOverflow)?,
                variant: line.variant.clone(),
            },
            None => line.clone(),
        };

        Ok(self.remote.upsert_item(customer, upsert).await?)
    }

    async fn write_line(&mut self, line: LineItem) -> Result<(), CartError> {
        match self.mode {
            CartMode::Anonymous => {
                if let Some(existing) = self.items.iter_mut().find(|item| item.uuid == line.uuid) {
                    *existing = line;
                } else {
                    self.items.push(line);
                }

                self.persist_local();
            }
            CartMode::Authenticated(customer) => {
                self.items = self.remote.upsert_item(customer, line).await?;
            }
        }

        self.invalidate_promo("cart changed");

        Ok(())
    }

    fn invalidate_promo(&mut self, reason: &str) {
        if let Some(code) = self.promo.invalidate() {
            debug!(%code, reason, "promo code no longer applied");
        }
    }

    fn persist_local(&self) {
        let result = serde_json::to_string(&StoredCartRef { items: &self.items })
            .map_err(StoreError::from)
            .and_then(|json| self.store.write(CART_STORAGE_KEY, &json));

        if let Err(err) = result {
            warn!(%err, "failed to persist cart locally; keeping changes for this session");
        }
    }

    fn read_local(&self) -> Vec<LineItem> {
        let raw = match self.store.read(CART_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(%err, "failed to read stored cart; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<StoredCart>(&raw) {
            Ok(stored) => normalise(stored.items),
            Err(err) => {
                warn!(%err, "stored cart is corrupt; starting empty");

                if let Err(err) = self.store.remove(CART_STORAGE_KEY) {
                    warn!(%err, "failed to discard corrupt stored cart");
                }

                Vec::new()
            }
        }
    }
}

/// Quantities must be at least one and fit in a `u32`.
fn validate_quantity(quantity: i64) -> Result<u32, CartError> {
    u32::try_from(quantity)
        .ok()
        .filter(|&quantity| quantity >= 1)
        .ok_or(CartError::InvalidQuantity(quantity))
}

/// Restore the line invariants on a cart read from storage: no empty lines, one line per
/// product and variant.
fn normalise(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut normalised: Vec<LineItem> = Vec::with_capacity(items.len());

    for item in items.into_iter().filter(|item| item.quantity > 0) {
        let existing = normalised
            .iter_mut()
            .find(|line| line.matches(&item.product.id, item.variant.as_ref()));

        match existing {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => normalised.push(item),
        }
    }

    normalised
}
