//! Order backend: payment intents and payment verification.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, ApiError, Envelope},
    checkout::order::OrderDetails,
};

/// Body of `POST /api/order/create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Amount payable in major units.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,

    pub currency: String,

    pub order_details: OrderDetails,
}

/// A payment order opened with the payment provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    #[serde(default)]
    pub success: bool,

    /// Provider order id to settle.
    #[serde(default)]
    pub order_id: String,

    /// Amount as reported by the provider.
    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

/// Proof of payment returned by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[automock]
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Open a payment order for the cart total.
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError>;

    /// Verify a completed payment and create the order. Resolves to the
    /// backend's verdict.
    async fn verify_payment(&self, callback: &PaymentCallback) -> Result<bool, ApiError>;
}

/// [`CheckoutBackend`] backed by `/api/order`.
#[derive(Debug, Clone)]
pub struct HttpCheckoutBackend {
    api: ApiClient,
}

impl HttpCheckoutBackend {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CheckoutBackend for HttpCheckoutBackend {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        self.api
            .post_authorized("/api/order/create-payment-intent", request)
            .await
    }

    async fn verify_payment(&self, callback: &PaymentCallback) -> Result<bool, ApiError> {
        let envelope: Envelope<serde_json::Value> = self
            .api
            .post_authorized("/api/order/verify-payment-create-order", callback)
            .await?;

        Ok(envelope.success)
    }
}
