//! Storefront configuration

use std::{path::PathBuf, time::Duration};

use clap::{Args, ValueEnum};
use rusty_money::iso::{self, Currency};
use storefront::cart::MinimumPurchasePolicy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Where coupon codes are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CouponSource {
    /// The compiled-in coupon table.
    Static,

    /// The backend coupon catalog.
    Remote,
}

/// When coupon minimum purchases are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MinimumPurchaseMode {
    /// Reject coupons whose minimum purchase is not met.
    Enforce,

    /// Accept coupons and grant no discount until the minimum is met.
    Defer,
}

impl From<MinimumPurchaseMode> for MinimumPurchasePolicy {
    fn from(mode: MinimumPurchaseMode) -> Self {
        match mode {
            MinimumPurchaseMode::Enforce => MinimumPurchasePolicy::EnforceOnApply,
            MinimumPurchaseMode::Defer => MinimumPurchasePolicy::DeferToPricing,
        }
    }
}

/// Backend and local state settings.
#[derive(Debug, Clone, Args)]
pub struct StorefrontConfig {
    /// Storefront backend base URL
    #[arg(long, env = "STOREFRONT_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Directory holding the persisted cart and session
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    pub data_dir: PathBuf,

    /// ISO 4217 code of the store currency
    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "INR")]
    pub currency: String,

    /// Coupon catalog to consult
    #[arg(long, env = "STOREFRONT_COUPON_SOURCE", value_enum, default_value_t = CouponSource::Static)]
    pub coupon_source: CouponSource,

    /// Coupon minimum purchase handling
    #[arg(long, env = "STOREFRONT_MINIMUM_PURCHASE", value_enum, default_value_t = MinimumPurchaseMode::Enforce)]
    pub minimum_purchase: MinimumPurchaseMode,

    /// HTTP request timeout in seconds
    #[arg(long, env = "STOREFRONT_REQUEST_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub request_timeout_seconds: u64,
}

impl StorefrontConfig {
    /// Resolve the configured currency code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not an ISO 4217 currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        let code = self.currency.trim().to_uppercase();

        iso::find(&code).ok_or(ConfigError::UnknownCurrency(code))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestConfig {
        #[command(flatten)]
        storefront: StorefrontConfig,
    }

    #[test]
    fn currency_defaults_to_rupees() -> TestResult {
        let config = TestConfig::try_parse_from(["storefront"])?;

        assert_eq!(config.storefront.currency()?, iso::INR);

        Ok(())
    }

    #[test]
    fn currency_code_is_case_insensitive() -> TestResult {
        let config = TestConfig::try_parse_from(["storefront", "--currency", "gbp"])?;

        assert_eq!(config.storefront.currency()?, iso::GBP);

        Ok(())
    }

    #[test]
    fn unknown_currency_is_an_error() -> TestResult {
        let config = TestConfig::try_parse_from(["storefront", "--currency", "XYZ1"])?;

        assert!(matches!(
            config.storefront.currency(),
            Err(ConfigError::UnknownCurrency(code)) if code == "XYZ1"
        ));

        Ok(())
    }

    #[test]
    fn minimum_purchase_mode_maps_to_policy() -> TestResult {
        let config = TestConfig::try_parse_from(["storefront", "--minimum-purchase", "defer"])?;

        assert_eq!(
            MinimumPurchasePolicy::from(config.storefront.minimum_purchase),
            MinimumPurchasePolicy::DeferToPricing
        );

        Ok(())
    }
}
