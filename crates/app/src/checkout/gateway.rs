//! Hosted payment step.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

use crate::checkout::{
    address::ShippingAddress,
    backend::{PaymentCallback, PaymentIntent},
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read payment response")]
    Io(#[from] std::io::Error),
}

/// Shopper details handed to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

impl From<&ShippingAddress> for Prefill {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            name: address.name.clone(),
            email: address.email.clone(),
            contact: address.phone.clone(),
        }
    }
}

/// How the hosted payment step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed(PaymentCallback),

    /// The shopper closed the payment step without paying.
    Dismissed,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Present the payment step for `intent` and wait for it to finish.
    async fn collect(
        &self,
        intent: &PaymentIntent,
        prefill: &Prefill,
    ) -> Result<PaymentOutcome, GatewayError>;
}
