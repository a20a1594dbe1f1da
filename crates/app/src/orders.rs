//! Order history and cancellation.

use std::fmt;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::{
    api::{ApiClient, ApiError, Envelope},
    auth::User,
};

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("order {order_id} is {status} and can no longer be cancelled")]
    NotCancellable {
        order_id: String,
        status: OrderStatus,
    },

    /// The backend declined the request.
    #[error("{0}")]
    Rejected(String),
}

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    New,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Orders can be cancelled until they are delivered.
    #[must_use]
    pub fn is_cancellable(self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };

        f.write_str(status)
    }
}

/// A line of a placed order. Amounts are in major units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderedItem {
    pub name: String,

    #[serde(default)]
    pub sku: String,

    #[serde(default)]
    pub units: u32,

    #[serde(default)]
    pub selling_price: Decimal,

    #[serde(default)]
    pub discount: Decimal,

    #[serde(default)]
    pub tax: Decimal,

    #[serde(default)]
    pub hsn: Option<String>,
}

impl OrderedItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.selling_price * Decimal::from(self.units)
    }
}

/// The customer an order belongs to: an id, or the expanded user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderCustomer {
    Id(String),
    User(User),
}

/// A placed order as reported by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,

    pub order_id: String,

    #[serde(default)]
    pub user: Option<OrderCustomer>,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default)]
    pub order_date: String,

    #[serde(default)]
    pub order_items: Vec<OrderedItem>,

    #[serde(default)]
    pub razorpay_order_id: Option<String>,

    #[serde(default)]
    pub payment_method: Option<String>,

    #[serde(default)]
    pub sub_total: Decimal,

    #[serde(default)]
    pub courier_name: Option<String>,

    #[serde(default)]
    pub awb_code: Option<String>,

    #[serde(default)]
    pub billing_customer_name: String,

    #[serde(default)]
    pub billing_address: String,

    #[serde(default)]
    pub billing_city: String,

    #[serde(default)]
    pub billing_pincode: String,

    #[serde(default)]
    pub billing_state: String,

    #[serde(default)]
    pub billing_phone: String,

    #[serde(default)]
    pub billing_email: String,
}

impl Order {
    /// When the order was placed, if the backend sent a parseable timestamp.
    #[must_use]
    pub fn placed_at(&self) -> Option<Timestamp> {
        self.order_date.parse().ok()
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// The signed-in customer's profile.
    async fn profile(&self) -> Result<User, OrdersError>;

    /// The signed-in customer's orders.
    async fn list_orders(&self) -> Result<Vec<Order>, OrdersError>;

    /// Cancel `order`, returning it with its new status.
    async fn cancel_order(&self, order: &Order) -> Result<Order, OrdersError>;
}

/// [`OrdersService`] backed by the storefront backend.
#[derive(Debug, Clone)]
pub struct HttpOrdersService {
    api: ApiClient,
}

impl HttpOrdersService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl OrdersService for HttpOrdersService {
    async fn profile(&self) -> Result<User, OrdersError> {
        Ok(self.api.get_authorized("/api/user-auth/profile").await?)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, OrdersError> {
        Ok(self.api.get_authorized("/api/user-auth/get-orders").await?)
    }

    async fn cancel_order(&self, order: &Order) -> Result<Order, OrdersError> {
        if !order.status.is_cancellable() {
            return Err(OrdersError::NotCancellable {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }

        let response: Envelope<serde_json::Value> = self
            .api
            .patch_authorized("/api/order/cancel", &json!({ "order_id": order.order_id }))
            .await?;

        if !response.success {
            return Err(OrdersError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Failed to cancel order".to_string()),
            ));
        }

        info!(order_id = %order.order_id, "order cancelled");

        Ok(Order {
            status: OrderStatus::Cancelled,
            ..order.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;

    fn service(server: &MockServer) -> Result<HttpOrdersService, ApiError> {
        Ok(HttpOrdersService::new(
            ApiClient::new(server.uri(), Duration::from_secs(5))?
                .with_token(Some("jwt-token".to_string())),
        ))
    }

    fn order_json(status: &str) -> serde_json::Value {
        json!({
            "_id": "665f1c2e9b1d",
            "order_id": "ORDER_1717000000000_k3j9x0a1b2c3d",
            "user": "u1",
            "status": status,
            "order_date": "2024-05-29T16:26:40Z",
            "order_items": [
                { "name": "Cotton Kurta", "sku": "Cotton Kurta", "units": 2, "selling_price": 25, "discount": 0, "tax": 0 },
                { "name": "Silk Scarf", "sku": "Silk Scarf", "units": 1, "selling_price": "10.5", "discount": "0", "tax": "0", "hsn": "" }
            ],
            "razorpay_order_id": "order_9A33XWu170gUtm",
            "payment_method": "Prepaid",
            "sub_total": 54.5,
            "billing_customer_name": "Asha Rao",
            "billing_city": "Bengaluru"
        })
    }

    fn order(status: &str) -> TestResult<Order> {
        Ok(serde_json::from_value(order_json(status))?)
    }

    #[test]
    fn delivered_and_cancelled_orders_are_final() {
        assert!(OrderStatus::New.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn order_parses_numeric_and_string_amounts() -> TestResult {
        let order = order("SHIPPED")?;

        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.user, Some(OrderCustomer::Id("u1".to_string())));
        assert_eq!(order.sub_total, Decimal::new(545, 1));
        assert_eq!(
            order.order_items.iter().map(OrderedItem::line_total).sum::<Decimal>(),
            Decimal::new(605, 1)
        );
        assert_eq!(
            order.placed_at().map(|at| at.as_second()),
            Some(1_717_000_000)
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_unwraps_envelope() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/user-auth/get-orders"))
            .and(header("authorization", "Bearer jwt-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [order_json("NEW"), order_json("DELIVERED")]
            })))
            .mount(&server)
            .await;

        let orders = service(&server)?.list_orders().await?;

        assert_eq!(
            orders.iter().map(|order| order.status).collect::<Vec<_>>(),
            [OrderStatus::New, OrderStatus::Delivered]
        );

        Ok(())
    }

    #[tokio::test]
    async fn profile_unwraps_envelope() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/user-auth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "_id": "u1", "name": "Asha", "phone": 9876543210_u64 }
            })))
            .mount(&server)
            .await;

        let user = service(&server)?.profile().await?;

        assert_eq!(user.name.as_deref(), Some("Asha"));

        Ok(())
    }

    #[tokio::test]
    async fn cancel_marks_order_cancelled() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/order/cancel"))
            .and(body_json(json!({ "order_id": "ORDER_1717000000000_k3j9x0a1b2c3d" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let cancelled = service(&server)?.cancel_order(&order("PROCESSING")?).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.order_id, "ORDER_1717000000000_k3j9x0a1b2c3d");

        Ok(())
    }

    #[tokio::test]
    async fn delivered_order_is_refused_locally() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = service(&server)?.cancel_order(&order("DELIVERED")?).await;

        assert!(matches!(
            result,
            Err(OrdersError::NotCancellable { status: OrderStatus::Delivered, .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_cancel_surfaces_message() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/order/cancel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Order already shipped"
            })))
            .mount(&server)
            .await;

        let result = service(&server)?.cancel_order(&order("NEW")?).await;

        assert!(matches!(
            result,
            Err(OrdersError::Rejected(message)) if message == "Order already shipped"
        ));

        Ok(())
    }
}
