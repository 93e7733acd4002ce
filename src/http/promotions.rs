//! Promo code validation over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    currencies::{StoreCurrency, to_major_units},
    products::ProductId,
    promotions::{PromoCode, PromoRequest, PromoValidator, PromoValidatorError, PromoVerdict},
};

use super::{ApiClient, ApiConfig, check_status};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateBody<'a> {
    code: &'a PromoCode,

    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    subtotal: Decimal,

    currency: StoreCurrency,

    product_ids: &'a [ProductId],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    valid: bool,

    #[serde(default)]
    discount_amount: Option<Decimal>,

    #[serde(default)]
    reason: Option<String>,
}

/// [`PromoValidator`] backed by the storefront API.
#[derive(Debug, Clone)]
pub struct HttpPromoValidator {
    client: ApiClient,
}

impl HttpPromoValidator {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }
}

#[async_trait]
impl PromoValidator for HttpPromoValidator {
    async fn validate(&self, request: PromoRequest) -> Result<PromoVerdict, PromoValidatorError> {
        let body = ValidateBody {
            code: &request.code,
            subtotal: to_major_units(request.subtotal.to_minor_units()),
            currency: request.currency,
            product_ids: &request.product_ids,
        };

        let response = self
            .client
            .request(Method::POST, "/api/promo-codes/validate")
            .json(&body)
            .send()
            .await?;

        let response = check_status(response, "validate promo code")
            .await
            .map_err(PromoValidatorError::UnexpectedResponse)?;

        let parsed: ValidateResponse = response.json().await?;

        if !parsed.valid {
            return Ok(PromoVerdict::Invalid {
                reason: parsed
                    .reason
                    .unwrap_or_else(|| "promo code is not valid".to_string()),
            });
        }

        let amount = parsed.discount_amount.ok_or_else(|| {
            PromoValidatorError::UnexpectedResponse("valid promo code without discountAmount".to_string())
        })?;

        let discount = request
            .currency
            .major(amount)
            .map_err(|err| PromoValidatorError::UnexpectedResponse(err.to_string()))?;

        Ok(PromoVerdict::Valid { discount })
    }
}
