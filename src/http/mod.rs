//! HTTP adapters for the storefront API: the server-side cart, promo code validation and order
//! creation, all behind the same base URL and bearer token.

use reqwest::{Client, Method, RequestBuilder, Response};

pub mod carts;
pub mod orders;
pub mod promotions;

pub use carts::HttpRemoteCart;
pub use orders::HttpOrderSubmitter;
pub use promotions::HttpPromoValidator;

/// Configuration for connecting to the storefront API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `"https://shop.example.com"`.
    pub base_url: String,

    /// Bearer token sent with every request, if any.
    pub token: Option<String>,
}

impl ApiConfig {
    /// Configuration for `base_url` without a token.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Send `token` as a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Shared HTTP client for the API adapters.
#[derive(Debug, Clone)]
struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        let request = self.http.request(method, url);

        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Pass 2xx responses through; describe anything else.
async fn check_status(response: Response, action: &str) -> Result<Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    Err(format!("{action} request failed with status {status}: {text}"))
}
