//! Checkout orchestration.

use std::sync::Arc;

use rusty_money::{Money, iso::Currency};
use storefront::{
    cart::{CartError, CartStore},
    pricing::PricingError,
    storage::KeyValueStore,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::ApiError,
    auth::User,
    checkout::{
        address::{AddressErrors, ShippingAddress},
        backend::{CheckoutBackend, PaymentIntentRequest},
        gateway::{PaymentGateway, PaymentOutcome, Prefill},
        order::{OrderDetails, generate_order_id},
    },
};

const INITIALIZATION_FAILED: &str = "Payment initialization failed";
const INTENT_FAILED: &str = "Failed to create order";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressErrors),

    #[error("{0}")]
    PaymentInitialization(String),

    #[error("Payment was cancelled")]
    Dismissed,

    #[error("Payment verification failed. Please contact support.")]
    PaymentVerification,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// A verified, paid order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub payment_order_id: String,
    pub payment_id: String,
    pub total: Money<'static, Currency>,
}

/// Drives a cart through payment.
#[derive(Clone)]
pub struct CheckoutService {
    backend: Arc<dyn CheckoutBackend>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(backend: Arc<dyn CheckoutBackend>) -> Self {
        Self { backend }
    }

    /// Pay for the cart.
    ///
    /// The cart is cleared only once the backend has verified the payment. On
    /// every error it is left as it was.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`]: nothing to pay for.
    /// - [`CheckoutError::InvalidAddress`]: one or more address fields are invalid.
    /// - [`CheckoutError::PaymentInitialization`]: the payment could not be started.
    /// - [`CheckoutError::Dismissed`]: the shopper left the payment step.
    /// - [`CheckoutError::PaymentVerification`]: the payment could not be verified.
    pub async fn checkout<S: KeyValueStore>(
        &self,
        cart: &mut CartStore<S>,
        address: &ShippingAddress,
        user: Option<&User>,
        gateway: &dyn PaymentGateway,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        address.validate()?;

        let total = cart.total()?;
        let order_id = generate_order_id();
        let order_details =
            OrderDetails::from_cart(order_id.clone(), address, cart.items(), &total, user)?;

        let request = PaymentIntentRequest {
            amount: order_details.sub_total,
            currency: cart.currency().iso_alpha_code.to_string(),
            order_details,
        };

        info!(%order_id, amount = %request.amount, "creating payment intent");

        let intent = self
            .backend
            .create_payment_intent(&request)
            .await
            .map_err(|err| {
                warn!(error = %err, "payment intent request failed");

                let message = match &err {
                    ApiError::MissingToken => err.to_string(),
                    _ => err
                        .rejection_message()
                        .unwrap_or(INITIALIZATION_FAILED)
                        .to_string(),
                };

                CheckoutError::PaymentInitialization(message)
            })?;

        if !intent.success {
            return Err(CheckoutError::PaymentInitialization(
                intent.error.unwrap_or_else(|| INTENT_FAILED.to_string()),
            ));
        }

        let outcome = gateway
            .collect(&intent, &Prefill::from(address))
            .await
            .map_err(|err| {
                warn!(error = %err, "payment gateway failed");

                CheckoutError::PaymentInitialization(INITIALIZATION_FAILED.to_string())
            })?;

        let callback = match outcome {
            PaymentOutcome::Completed(callback) => callback,
            PaymentOutcome::Dismissed => {
                info!(%order_id, "payment dismissed");

                return Err(CheckoutError::Dismissed);
            }
        };

        match self.backend.verify_payment(&callback).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(%order_id, "backend rejected payment");

                return Err(CheckoutError::PaymentVerification);
            }
            Err(err) => {
                warn!(%order_id, error = %err, "payment verification request failed");

                return Err(CheckoutError::PaymentVerification);
            }
        }

        if let Err(err) = cart.clear() {
            warn!(%order_id, error = %err, "order placed but cart could not be cleared");
        }

        info!(%order_id, "order placed");

        Ok(CheckoutReceipt {
            order_id,
            payment_order_id: callback.razorpay_order_id,
            payment_id: callback.razorpay_payment_id,
            total,
        })
    }
}
