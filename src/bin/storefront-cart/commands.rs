//! Cart commands

use std::{
    io::{self, Write},
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use storefront_cart::prelude::*;

use crate::config::{CliConfig, Command};

const NO_API: &str = "no storefront API configured; set STOREFRONT_API_URL";

/// Errors running a command.
#[derive(Debug, Error)]
pub(crate) enum CommandError {
    /// Catalog could not be loaded or the product is unknown
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Cart operation failed
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Amount could not be represented in the checkout currency
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// Receipt could not be written
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// Output could not be written
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Stand-in for the storefront API when none is configured: every call fails.
#[derive(Debug, Clone, Copy)]
struct Offline;

#[async_trait]
impl RemoteCart for Offline {
    async fn fetch_cart(&self, _customer: CustomerUuid) -> Result<Vec<LineItem>, RemoteCartError> {
        Err(RemoteCartError::UnexpectedResponse(NO_API.to_string()))
    }

    async fn upsert_item(
        &self,
        _customer: CustomerUuid,
        _item: LineItem,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        Err(RemoteCartError::UnexpectedResponse(NO_API.to_string()))
    }

    async fn delete_item(
        &self,
        _customer: CustomerUuid,
        _item: LineItemUuid,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        Err(RemoteCartError::UnexpectedResponse(NO_API.to_string()))
    }

    async fn clear_cart(&self, _customer: CustomerUuid) -> Result<(), RemoteCartError> {
        Err(RemoteCartError::UnexpectedResponse(NO_API.to_string()))
    }
}

#[async_trait]
impl PromoValidator for Offline {
    async fn validate(
        &self,
        _request: storefront_cart::promotions::PromoRequest,
    ) -> Result<PromoVerdict, PromoValidatorError> {
        Err(PromoValidatorError::UnexpectedResponse(NO_API.to_string()))
    }
}

#[async_trait]
impl OrderSubmitter for Offline {
    async fn submit(
        &self,
        _order: storefront_cart::orders::OrderPayload,
    ) -> Result<OrderConfirmation, OrderSubmitError> {
        Err(OrderSubmitError::UnexpectedResponse(NO_API.to_string()))
    }
}

/// Load the cart, sign in if a customer is configured, then run the command.
pub(crate) async fn run(config: CliConfig, out: &mut impl Write) -> Result<(), CommandError> {
    let catalog = Catalog::load(&config.storage.catalog)?;
    let api = config.api.api_config();

    let store = Arc::new(FileCartStore::new(&config.storage.cart_dir));
    let remote: Arc<dyn RemoteCart> = match &api {
        Some(api) => Arc::new(HttpRemoteCart::new(api.clone())),
        None => Arc::new(Offline),
    };
    let validator: Box<dyn PromoValidator> = match &api {
        Some(api) => Box::new(HttpPromoValidator::new(api.clone())),
        None => Box::new(Offline),
    };
    let submitter: Box<dyn OrderSubmitter> = match &api {
        Some(api) => Box::new(HttpOrderSubmitter::new(api.clone())),
        None => Box::new(Offline),
    };

    let mut ledger = CartLedger::new(store, remote, config.currency);
    ledger.load().await?;

    if let Some(customer) = config.api.customer {
        ledger.authenticate(CustomerUuid::from_uuid(customer)).await?;
    }

    match config.command {
        Command::Add {
            product,
            quantity,
            variant,
        } => {
            let product = catalog.get(&ProductId::new(product))?;
            let variant = variant.and_then(VariantKey::parse);

            let line = ledger.add_item(product, quantity, variant).await?;

            writeln!(out, "Added {} to line {line}", product.name)?;
            Receipt::from_ledger(&ledger)?.write_to(out)?;
        }
        Command::Set { line, quantity } => {
            ledger
                .set_quantity(LineItemUuid::from_uuid(line), quantity)
                .await?;

            Receipt::from_ledger(&ledger)?.write_to(out)?;
        }
        Command::Remove { line } => {
            ledger.remove_item(LineItemUuid::from_uuid(line)).await?;

            Receipt::from_ledger(&ledger)?.write_to(out)?;
        }
        Command::Clear => {
            ledger.clear().await?;

            writeln!(out, "Cart cleared")?;
        }
        Command::Show => {
            write_lines(out, &ledger)?;
            Receipt::from_ledger(&ledger)?.write_to(out)?;
        }
        Command::Promo { code } => {
            let application = ledger.apply_promo(&code, validator.as_ref()).await?;

            writeln!(out, "Promo {} applied: -{}", application.code, application.discount)?;
            Receipt::from_ledger(&ledger)?.write_to(out)?;
        }
        Command::Checkout {
            promo,
            delivery_fee,
        } => {
            if let Some(code) = promo {
                ledger.apply_promo(&code, validator.as_ref()).await?;
            }

            let delivery_fee = ledger.currency().major(delivery_fee)?;
            let snapshot = ledger.order_snapshot(delivery_fee)?;

            Receipt::from_snapshot(&snapshot).write_to(&mut *out)?;

            let confirmation = ledger.submit_order(delivery_fee, submitter.as_ref()).await?;

            info!(order = %confirmation.order_id, "checkout complete");
            writeln!(out, "Order {} placed", confirmation.order_id)?;
        }
    }

    Ok(())
}

/// Line ids, so `set` and `remove` have something to refer to.
fn write_lines(out: &mut impl Write, ledger: &CartLedger) -> io::Result<()> {
    for item in ledger.items() {
        match &item.variant {
            Some(variant) => writeln!(out, "{}  {} ({variant}) x{}", item.uuid, item.product.name, item.quantity)?,
            None => writeln!(out, "{}  {} x{}", item.uuid, item.product.name, item.quantity)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    fn config(cart_dir: &std::path::Path, args: &[&str]) -> Result<CliConfig, clap::Error> {
        let mut argv = vec![
            "storefront-cart".to_string(),
            "--catalog".to_string(),
            "fixtures/catalogs/storefront.yml".to_string(),
            "--cart-dir".to_string(),
            cart_dir.display().to_string(),
        ];
        argv.extend(args.iter().map(ToString::to_string));

        CliConfig::try_parse_from(argv)
    }

    #[tokio::test]
    async fn add_then_show_reads_the_stored_cart() -> TestResult {
        let tmp = tempfile::tempdir()?;

        let mut out = Vec::new();
        run(config(tmp.path(), &["add", "7", "-q", "2", "-v", "sativa"])?, &mut out).await?;
        run(config(tmp.path(), &["add", "9"])?, &mut out).await?;

        let mut shown = Vec::new();
        run(config(tmp.path(), &["show"])?, &mut shown).await?;

        let shown = String::from_utf8(shown)?;
        assert!(shown.contains("Lemon Haze (sativa) x2"), "{shown}");
        assert!(shown.contains("Mango Gummies x1"), "{shown}");
        assert!(shown.contains("3,350.00"), "{shown}");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_products_are_reported() -> TestResult {
        let tmp = tempfile::tempdir()?;

        let result = run(config(tmp.path(), &["add", "404"])?, &mut Vec::new()).await;

        assert!(
            matches!(result, Err(CommandError::Catalog(CatalogError::ProductNotFound(_)))),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn promo_without_an_api_fails_cleanly() -> TestResult {
        let tmp = tempfile::tempdir()?;

        run(config(tmp.path(), &["add", "9"])?, &mut Vec::new()).await?;

        let result = run(config(tmp.path(), &["promo", "welcome"])?, &mut Vec::new()).await;

        assert!(
            matches!(result, Err(CommandError::Cart(CartError::Promo(PromoError::Validator(_))))),
            "got {result:?}"
        );

        Ok(())
    }
}
