//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Where the anonymous cart and the catalog live.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory the anonymous cart is kept in
    #[arg(long, env = "STOREFRONT_CART_DIR", default_value = ".storefront")]
    pub cart_dir: PathBuf,

    /// Product catalog, YAML or JSON
    #[arg(long, env = "STOREFRONT_CATALOG")]
    pub catalog: PathBuf,
}
