//! App Context

use std::sync::Arc;

use storefront::{
    cart::CartStore,
    coupons::{CouponLookup, default_coupons},
    storage::StorageError,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    api::{ApiClient, ApiError},
    auth::{AuthService, HttpAuthService, Session, load_session},
    checkout::{CheckoutService, HttpCheckoutBackend},
    config::{ConfigError, CouponSource, StorefrontConfig},
    coupons::HttpCouponCatalog,
    orders::{HttpOrdersService, OrdersService},
    products::{HttpProductCatalog, ProductCatalog},
    storage::FileStore,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open data directory")]
    Storage(#[source] StorageError),

    #[error("failed to build HTTP client")]
    Http(#[source] ApiError),
}

pub struct AppContext {
    pub api: ApiClient,
    pub cart: CartStore<FileStore>,
    pub sessions: FileStore,
    pub session: Option<Session>,
    pub coupons: Arc<dyn CouponLookup>,
    pub products: Arc<dyn ProductCatalog>,
    pub auth: Arc<dyn AuthService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: CheckoutService,
}

impl AppContext {
    /// Build application context from configuration, restoring the persisted
    /// cart and session.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is unknown, the data directory cannot
    /// be opened, or the HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, AppInitError> {
        let currency = config.currency()?;
        let store = FileStore::open(&config.data_dir).map_err(AppInitError::Storage)?;

        let session = load_session(&store);
        let cart =
            CartStore::load(store.clone(), currency).with_policy(config.minimum_purchase.into());

        debug!(
            data_dir = %config.data_dir.display(),
            signed_in = session.is_some(),
            items = cart.len(),
            "restored local state"
        );

        let api = ApiClient::new(config.api_url.as_str(), config.request_timeout())
            .map_err(AppInitError::Http)?
            .with_token(session.as_ref().map(|session| session.token.clone()));

        let coupons: Arc<dyn CouponLookup> = match config.coupon_source {
            CouponSource::Static => Arc::new(default_coupons(currency)),
            CouponSource::Remote => Arc::new(HttpCouponCatalog::new(api.clone())),
        };

        Ok(Self {
            cart,
            sessions: store,
            session,
            coupons,
            products: Arc::new(HttpProductCatalog::new(api.clone())),
            auth: Arc::new(HttpAuthService::new(api.clone())),
            orders: Arc::new(HttpOrdersService::new(api.clone())),
            checkout: CheckoutService::new(Arc::new(HttpCheckoutBackend::new(api.clone()))),
            api,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use storefront::{
        cart::{CART_KEY, MinimumPurchasePolicy},
        storage::KeyValueStore,
    };
    use testresult::TestResult;

    use super::*;
    use crate::auth::TOKEN_KEY;

    #[derive(Debug, Parser)]
    struct TestConfig {
        #[command(flatten)]
        storefront: StorefrontConfig,
    }

    fn config(dir: &std::path::Path, extra: &[&str]) -> TestResult<StorefrontConfig> {
        let dir = dir.display().to_string();
        let mut args = vec!["storefront", "--data-dir", dir.as_str()];
        args.extend_from_slice(extra);

        Ok(TestConfig::try_parse_from(args)?.storefront)
    }

    #[test]
    fn restores_cart_and_session_from_data_dir() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;

        store.set(TOKEN_KEY, "jwt-token")?;
        store.set(
            CART_KEY,
            r#"[{"id":"p1","name":"Cotton Kurta","unitPrice":2500,"quantity":2}]"#,
        )?;

        let context = AppContext::from_config(&config(dir.path(), &[])?)?;

        assert_eq!(
            context.session.map(|session| session.token),
            Some("jwt-token".to_string())
        );
        assert_eq!(context.cart.item_count(), 2);
        assert_eq!(context.cart.policy(), MinimumPurchasePolicy::EnforceOnApply);

        Ok(())
    }

    #[test]
    fn minimum_purchase_mode_reaches_cart() -> TestResult {
        let dir = tempfile::tempdir()?;

        let context =
            AppContext::from_config(&config(dir.path(), &["--minimum-purchase", "defer"])?)?;

        assert_eq!(context.cart.policy(), MinimumPurchasePolicy::DeferToPricing);
        assert!(context.session.is_none());

        Ok(())
    }

    #[test]
    fn unknown_currency_fails_startup() -> TestResult {
        let dir = tempfile::tempdir()?;

        let result = AppContext::from_config(&config(dir.path(), &["--currency", "ZZZ"])?);

        assert!(matches!(result, Err(AppInitError::Config(_))));

        Ok(())
    }
}
