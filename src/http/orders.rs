//! Order creation over HTTP.

use async_trait::async_trait;
use reqwest::Method;

use crate::orders::{OrderConfirmation, OrderPayload, OrderSubmitError, OrderSubmitter};

use super::{ApiClient, ApiConfig, check_status};

/// [`OrderSubmitter`] backed by the storefront API.
#[derive(Debug, Clone)]
pub struct HttpOrderSubmitter {
    client: ApiClient,
}

impl HttpOrderSubmitter {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }
}

#[async_trait]
impl OrderSubmitter for HttpOrderSubmitter {
    async fn submit(&self, order: OrderPayload) -> Result<OrderConfirmation, OrderSubmitError> {
        let response = self
            .client
            .request(Method::POST, "/api/orders")
            .json(&order)
            .send()
            .await?;

        let response = check_status(response, "create order")
            .await
            .map_err(OrderSubmitError::UnexpectedResponse)?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    use crate::{
        currencies::StoreCurrency,
        fixtures::gummies,
        items::LineItem,
        orders::OrderSnapshot,
        pricing::PricingResolver,
    };

    use super::*;

    fn payload() -> Result<OrderPayload, crate::pricing::TotalPriceError> {
        let snapshot = OrderSnapshot::assemble(
            &[LineItem::new(gummies(), 2, None)],
            StoreCurrency::Thb,
            &PricingResolver::new(),
            None,
            StoreCurrency::Thb.minor(40_00),
        )?;

        Ok(snapshot.to_payload())
    }

    #[tokio::test]
    async fn posts_the_order_and_reads_the_id() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .and(body_partial_json(json!({
                "currency": "THB",
                "subtotal": 700.0,
                "deliveryFee": 40.0,
                "total": 740.0,
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_id": "ord_9" })))
            .expect(1)
            .mount(&server)
            .await;

        let confirmation = HttpOrderSubmitter::new(ApiConfig::new(server.uri()))
            .submit(payload()?)
            .await?;

        assert_eq!(confirmation.order_id, "ord_9");

        Ok(())
    }

    #[tokio::test]
    async fn rejected_orders_are_unexpected_responses() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("delivery zone not served"))
            .mount(&server)
            .await;

        let result = HttpOrderSubmitter::new(ApiConfig::new(server.uri()))
            .submit(payload()?)
            .await;

        assert!(
            matches!(&result, Err(OrderSubmitError::UnexpectedResponse(message)) if message.contains("422")),
            "got {result:?}"
        );

        Ok(())
    }
}
