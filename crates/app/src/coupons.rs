//! Remote coupon catalog.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use storefront::coupons::{CouponLookup, CouponLookupError, CouponPolicy, CouponPolicyError};
use tracing::warn;

use crate::api::{ApiClient, ApiError};

/// A coupon as listed by the backend catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCoupon {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    pub percentage: Decimal,

    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl RemoteCoupon {
    /// Convert to a coupon policy keyed by the coupon name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the percentage is out of range.
    pub fn to_policy(&self) -> Result<CouponPolicy, CouponPolicyError> {
        Ok(CouponPolicy::new(&self.name, self.percentage)?.with_active(self.active))
    }
}

/// [`CouponLookup`] backed by `GET /api/coupon`.
#[derive(Debug, Clone)]
pub struct HttpCouponCatalog {
    api: ApiClient,
}

impl HttpCouponCatalog {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch every coupon in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or an unreadable body.
    pub async fn list(&self) -> Result<Vec<RemoteCoupon>, ApiError> {
        self.api.get("/api/coupon").await
    }
}

#[async_trait]
impl CouponLookup for HttpCouponCatalog {
    async fn find_active_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CouponPolicy>, CouponLookupError> {
        let coupons = self
            .list()
            .await
            .map_err(|err| CouponLookupError::Unavailable(Box::new(err)))?;

        let found = coupons
            .iter()
            .filter(|coupon| coupon.active)
            .filter_map(|coupon| match coupon.to_policy() {
                Ok(policy) => Some(policy),
                Err(err) => {
                    warn!(id = %coupon.id, error = %err, "skipping malformed catalog coupon");

                    None
                }
            })
            .find(|policy| policy.matches_code(code));

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    async fn catalog(server: &MockServer, body: serde_json::Value) -> TestResult<HttpCouponCatalog> {
        Mock::given(method("GET"))
            .and(path("/api/coupon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;

        Ok(HttpCouponCatalog::new(ApiClient::new(
            server.uri(),
            Duration::from_secs(5),
        )?))
    }

    #[tokio::test]
    async fn finds_active_coupon_case_insensitively() -> TestResult {
        let server = MockServer::start().await;
        let catalog = catalog(
            &server,
            json!([
                { "_id": "c1", "name": "FESTIVE15", "percentage": 15, "active": true },
                { "_id": "c2", "name": "OLD50", "percentage": 50, "active": false }
            ]),
        )
        .await?;

        let found = catalog.find_active_by_code("festive15").await?;

        assert_eq!(
            found.map(|policy| policy.discount_percentage()),
            Some(Decimal::from(15))
        );

        Ok(())
    }

    #[tokio::test]
    async fn inactive_coupon_is_not_found() -> TestResult {
        let server = MockServer::start().await;
        let catalog = catalog(
            &server,
            json!([{ "_id": "c2", "name": "OLD50", "percentage": 50, "active": false }]),
        )
        .await?;

        assert!(catalog.find_active_by_code("OLD50").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn malformed_coupons_are_skipped() -> TestResult {
        let server = MockServer::start().await;
        let catalog = catalog(
            &server,
            json!([
                { "_id": "c3", "name": "BROKEN", "percentage": 250 },
                { "_id": "c4", "name": "BROKEN", "percentage": 25 }
            ]),
        )
        .await?;

        let found = catalog.find_active_by_code("broken").await?;

        assert_eq!(
            found.map(|policy| policy.discount_percentage()),
            Some(Decimal::from(25))
        );

        Ok(())
    }

    #[tokio::test]
    async fn server_error_is_unavailable() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/coupon"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let catalog = HttpCouponCatalog::new(ApiClient::new(server.uri(), Duration::from_secs(5))?);

        let result = catalog.find_active_by_code("WELCOME10").await;

        assert!(matches!(result, Err(CouponLookupError::Unavailable(_))));

        Ok(())
    }
}
