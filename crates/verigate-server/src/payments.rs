use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gateway rejected the order (status={status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Gateway response was missing an approval link")]
    NoApprovalLink,
}

#[derive(Debug, Clone)]
pub struct CheckoutOrder {
    pub order_id: String,
    pub approval_url: String,
}

/// Payment checkout boundary. Only order creation is modeled here; the
/// provider hosts the actual checkout and reports completion through the
/// `subscription-completed` callback.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        payer_email: &str,
        quantity: u32,
        price: &str,
        currency: &str,
    ) -> Result<CheckoutOrder, GatewayError>;
}

#[derive(Debug, Serialize)]
struct OrderAmount {
    currency_code: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct OrderUnit {
    amount: OrderAmount,
    quantity: String,
    custom_id: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    intent: &'static str,
    purchase_units: Vec<OrderUnit>,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<OrderLink>,
}

/// Checkout-order client for a PayPal-style orders API.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    pub fn new(http: reqwest::Client, config: GatewayConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        payer_email: &str,
        quantity: u32,
        price: &str,
        currency: &str,
    ) -> Result<CheckoutOrder, GatewayError> {
        let body = CreateOrderBody {
            intent: "CAPTURE",
            purchase_units: vec![OrderUnit {
                amount: OrderAmount {
                    currency_code: currency.to_string(),
                    value: price.to_string(),
                },
                quantity: quantity.to_string(),
                // The payer email rides along so the completion callback can
                // be matched back to an account.
                custom_id: payer_email.to_string(),
            }],
        };

        let resp = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: CreateOrderResponse = resp.json().await?;
        let approval_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.clone())
            .ok_or(GatewayError::NoApprovalLink)?;

        Ok(CheckoutOrder {
            order_id: order.id,
            approval_url,
        })
    }
}
