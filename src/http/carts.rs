//! Server-side cart over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::{
    items::{LineItem, LineItemUuid},
    ledger::{CustomerUuid, RemoteCart, RemoteCartError},
};

use super::{ApiClient, ApiConfig, check_status};

#[derive(Debug, Deserialize)]
struct CartResponse {
    items: Vec<LineItem>,
}

/// [`RemoteCart`] backed by the storefront API's customer cart endpoints.
#[derive(Debug, Clone)]
pub struct HttpRemoteCart {
    client: ApiClient,
}

impl HttpRemoteCart {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }

    async fn cart_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&LineItem>,
        action: &str,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        let mut request = self.client.request(method, path);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = check_status(request.send().await?, action)
            .await
            .map_err(RemoteCartError::UnexpectedResponse)?;

        let parsed: CartResponse = response.json().await?;

        debug!(%path, lines = parsed.items.len(), "cart response");

        Ok(parsed.items)
    }
}

#[async_trait]
impl RemoteCart for HttpRemoteCart {
    async fn fetch_cart(&self, customer: CustomerUuid) -> Result<Vec<LineItem>, RemoteCartError> {
        self.cart_request(
            Method::GET,
            &format!("/api/customers/{customer}/cart"),
            None,
            "fetch cart",
        )
        .await
    }

    async fn upsert_item(
        &self,
        customer: CustomerUuid,
        item: LineItem,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        self.cart_request(
            Method::PUT,
            &format!("/api/customers/{customer}/cart/items/{}", item.uuid),
            Some(&item),
            "upsert cart item",
        )
        .await
    }

    async fn delete_item(
        &self,
        customer: CustomerUuid,
        item: LineItemUuid,
    ) -> Result<Vec<LineItem>, RemoteCartError> {
        self.cart_request(
            Method::DELETE,
            &format!("/api/customers/{customer}/cart/items/{item}"),
            None,
            "delete cart item",
        )
        .await
    }

    async fn clear_cart(&self, customer: CustomerUuid) -> Result<(), RemoteCartError> {
        let response = self
            .client
            .request(Method::DELETE, &format!("/api/customers/{customer}/cart"))
            .send()
            .await?;

        check_status(response, "clear cart")
            .await
            .map_err(RemoteCartError::UnexpectedResponse)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use crate::fixtures::gummies;

    use super::*;

    #[tokio::test]
    async fn fetch_sends_bearer_token_and_parses_items() -> TestResult {
        let server = MockServer::start().await;
        let customer = CustomerUuid::now_v7();
        let line = LineItem::new(gummies(), 2, None);

        Mock::given(method("GET"))
            .and(path(format!("/api/customers/{customer}/cart")))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [line] })))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemoteCart::new(ApiConfig::new(server.uri()).with_token("secret"));

        let items = remote.fetch_cart(customer).await?;

        assert_eq!(items, vec![line]);

        Ok(())
    }

    #[tokio::test]
    async fn upsert_puts_the_line_and_returns_the_echo() -> TestResult {
        let server = MockServer::start().await;
        let customer = CustomerUuid::now_v7();
        let line = LineItem::new(gummies(), 3, None);

        Mock::given(method("PUT"))
            .and(path(format!("/api/customers/{customer}/cart/items/{}", line.uuid)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [line] })))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemoteCart::new(ApiConfig::new(format!("{}/", server.uri())));

        let echo = remote.upsert_item(customer, line.clone()).await?;

        assert_eq!(echo, vec![line]);

        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_an_unexpected_response() {
        let server = MockServer::start().await;
        let customer = CustomerUuid::now_v7();

        Mock::given(method("DELETE"))
            .and(path(format!("/api/customers/{customer}/cart")))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let remote = HttpRemoteCart::new(ApiConfig::new(server.uri()));

        let result = remote.clear_cart(customer).await;

        assert!(
            matches!(&result, Err(RemoteCartError::UnexpectedResponse(message)) if message.contains("503") && message.contains("maintenance")),
            "got {result:?}"
        );
    }
}
