//! Command line configuration

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront_cart::currencies::StoreCurrency;

use crate::config::{api::ApiArgs, logging::LoggingConfig, storage::StorageConfig};

pub(crate) mod api;
pub(crate) mod logging;
pub(crate) mod storage;

/// Storefront cart configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-cart", about = "Storefront cart and checkout", long_about = None)]
pub struct CliConfig {
    /// Cart and catalog storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Storefront API settings.
    #[command(flatten)]
    pub api: ApiArgs,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Checkout currency (THB, RUB, USD)
    #[arg(long, env = "STOREFRONT_CURRENCY", value_enum, default_value_t = StoreCurrency::Thb)]
    pub currency: StoreCurrency,

    /// What to do with the cart.
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Cart commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a catalog product to the cart
    Add {
        /// Catalog product id
        product: String,

        /// How many to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,

        /// Size or strain
        #[arg(short, long)]
        variant: Option<String>,
    },

    /// Overwrite a line's quantity; zero or less removes it
    Set {
        /// Line id
        line: Uuid,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove a line
    Remove {
        /// Line id
        line: Uuid,
    },

    /// Empty the cart
    Clear,

    /// Print the cart
    Show,

    /// Validate a promo code against the cart and print the discounted cart
    Promo {
        /// Promo code
        code: String,
    },

    /// Place an order for the cart
    Checkout {
        /// Promo code to apply first
        #[arg(long)]
        promo: Option<String>,

        /// Delivery fee in the checkout currency
        #[arg(long, default_value = "0")]
        delivery_fee: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_flattened_groups_and_subcommand() -> TestResult {
        let config = CliConfig::try_parse_from([
            "storefront-cart",
            "--catalog",
            "catalog.yml",
            "--currency",
            "usd",
            "--log-format",
            "json",
            "add",
            "7",
            "--quantity",
            "2",
            "--variant",
            "sativa",
        ])?;

        assert_eq!(config.currency, StoreCurrency::Usd);
        assert!(matches!(config.logging.log_format, logging::LogFormat::Json));
        assert!(matches!(
            config.command,
            Command::Add { ref product, quantity: 2, ref variant }
                if product == "7" && variant.as_deref() == Some("sativa")
        ));

        Ok(())
    }

    #[test]
    fn checkout_reads_a_decimal_delivery_fee() -> TestResult {
        let config = CliConfig::try_parse_from([
            "storefront-cart",
            "--catalog",
            "catalog.yml",
            "checkout",
            "--promo",
            "welcome",
            "--delivery-fee",
            "40.50",
        ])?;

        assert!(matches!(
            config.command,
            Command::Checkout { ref promo, delivery_fee }
                if promo.as_deref() == Some("welcome") && delivery_fee == Decimal::new(40_50, 2)
        ));

        Ok(())
    }

    #[test]
    fn set_accepts_negative_quantities() -> TestResult {
        let line = Uuid::now_v7();
        let config = CliConfig::try_parse_from([
            "storefront-cart".to_string(),
            "--catalog".to_string(),
            "catalog.yml".to_string(),
            "set".to_string(),
            line.to_string(),
            "-1".to_string(),
        ])?;

        assert!(matches!(config.command, Command::Set { quantity: -1, .. }));

        Ok(())
    }
}
