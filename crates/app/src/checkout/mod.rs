//! Checkout: address capture, order payload, payment and verification.

pub mod address;
pub mod backend;
pub mod gateway;
pub mod order;
pub mod service;

pub use address::{AddressErrors, AddressField, ShippingAddress};
pub use backend::{
    CheckoutBackend, HttpCheckoutBackend, PaymentCallback, PaymentIntent, PaymentIntentRequest,
};
pub use gateway::{GatewayError, PaymentGateway, PaymentOutcome, Prefill};
pub use order::{OrderDetails, OrderItem, generate_order_id};
pub use service::{CheckoutError, CheckoutReceipt, CheckoutService};
