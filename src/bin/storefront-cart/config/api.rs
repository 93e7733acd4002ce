//! API Config

use clap::Args;
use uuid::Uuid;

use storefront_cart::http::ApiConfig;

/// Storefront API settings.
#[derive(Debug, Args)]
pub struct ApiArgs {
    /// Storefront API base URL; without it the cart stays on this machine
    #[arg(long, env = "STOREFRONT_API_URL")]
    pub api_url: Option<String>,

    /// Storefront API bearer token
    #[arg(long, env = "STOREFRONT_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Signed-in customer; the local cart is merged into theirs
    #[arg(long, env = "STOREFRONT_CUSTOMER", requires = "api_url")]
    pub customer: Option<Uuid>,
}

impl ApiArgs {
    /// Client configuration, if an API URL was given.
    pub fn api_config(&self) -> Option<ApiConfig> {
        let config = ApiConfig::new(self.api_url.clone()?);

        Some(match &self.api_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        })
    }
}
