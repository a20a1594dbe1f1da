//! Coupons
//!
//! A coupon is a named percentage discount with an optional minimum purchase
//! and an optional cap on the absolute discount. Coupons are resolved through
//! the [`CouponLookup`] capability, which is backed either by a compiled-in
//! [`StaticCouponTable`] or by a remote catalog.

use std::error::Error as StdError;

use async_trait::async_trait;
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::{pricing::PricingError, storage::StorageError};

/// Errors raised while constructing a coupon policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponPolicyError {
    /// The coupon code was blank.
    #[error("coupon code cannot be empty")]
    EmptyCode,

    /// The discount percentage was not within `0..=100`.
    #[error("discount percentage {0} is outside 0..=100")]
    PercentageOutOfRange(Decimal),
}

/// Errors raised while applying a coupon to a cart.
#[derive(Debug, Error)]
pub enum CouponError {
    /// No known, active coupon matches the code.
    #[error("Invalid coupon code")]
    InvalidCoupon,

    /// The coupon matched, but the cart subtotal is below its minimum purchase.
    #[error("Minimum purchase of {0} required for this coupon")]
    BelowMinimumPurchase(Money<'static, Currency>),

    /// The coupon catalog could not be consulted.
    #[error(transparent)]
    Lookup(#[from] CouponLookupError),

    /// The cart subtotal could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The applied coupon could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by a coupon catalog.
#[derive(Debug, Error)]
pub enum CouponLookupError {
    /// The catalog could not be reached or returned an unreadable response.
    #[error("coupon catalog unavailable")]
    Unavailable(#[source] Box<dyn StdError + Send + Sync>),
}

fn active_by_default() -> bool {
    true
}

/// A named discount rule with optional eligibility and cap constraints.
///
/// Monetary thresholds are in minor units of the cart currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CouponPolicyRecord")]
pub struct CouponPolicy {
    code: String,

    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    discount_percentage: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    minimum_purchase: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    maximum_discount: Option<u64>,

    #[serde(default = "active_by_default")]
    active: bool,
}

impl CouponPolicy {
    /// Create an active coupon with no minimum purchase and no cap.
    ///
    /// # Errors
    ///
    /// - [`CouponPolicyError::EmptyCode`]: the code is blank.
    /// - [`CouponPolicyError::PercentageOutOfRange`]: the percentage is not in `0..=100`.
    pub fn new(
        code: impl Into<String>,
        discount_percentage: Decimal,
    ) -> Result<Self, CouponPolicyError> {
        let code = code.into().trim().to_string();

        if code.is_empty() {
            return Err(CouponPolicyError::EmptyCode);
        }

        if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE_HUNDRED {
            return Err(CouponPolicyError::PercentageOutOfRange(discount_percentage));
        }

        Ok(Self {
            code,
            discount_percentage,
            minimum_purchase: None,
            maximum_discount: None,
            active: true,
        })
    }

    /// Require a minimum subtotal (minor units) before the coupon applies.
    #[must_use]
    pub fn with_minimum_purchase(mut self, minimum: u64) -> Self {
        self.minimum_purchase = Some(minimum);
        self
    }

    /// Cap the absolute discount (minor units).
    #[must_use]
    pub fn with_maximum_discount(mut self, maximum: u64) -> Self {
        self.maximum_discount = Some(maximum);
        self
    }

    /// Set whether the coupon can be matched at all.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Coupon code, as configured
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Discount in percent points (`0..=100`)
    #[must_use]
    pub fn discount_percentage(&self) -> Decimal {
        self.discount_percentage
    }

    /// Discount as a fractional percentage (`0.0..=1.0`)
    #[must_use]
    pub fn percentage(&self) -> Percentage {
        Percentage::from(self.discount_percentage / Decimal::ONE_HUNDRED)
    }

    /// Minimum purchase in minor units, if any
    #[must_use]
    pub fn minimum_purchase(&self) -> Option<u64> {
        self.minimum_purchase
    }

    /// Discount cap in minor units, if any
    #[must_use]
    pub fn maximum_discount(&self) -> Option<u64> {
        self.maximum_discount
    }

    /// Whether the coupon may be matched
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Case-insensitive code comparison; surrounding whitespace is ignored.
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.to_lowercase() == code.trim().to_lowercase()
    }

    /// Whether a subtotal (minor units) satisfies the minimum purchase.
    #[must_use]
    pub fn is_applicable_to(&self, subtotal: u64) -> bool {
        self.minimum_purchase
            .is_none_or(|minimum| subtotal >= minimum)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponPolicyRecord {
    code: String,

    discount_percentage: Decimal,

    #[serde(default)]
    minimum_purchase: Option<u64>,

    #[serde(default)]
    maximum_discount: Option<u64>,

    #[serde(default = "active_by_default")]
    active: bool,
}

impl TryFrom<CouponPolicyRecord> for CouponPolicy {
    type Error = CouponPolicyError;

    fn try_from(record: CouponPolicyRecord) -> Result<Self, Self::Error> {
        let mut policy = CouponPolicy::new(record.code, record.discount_percentage)?;

        policy.minimum_purchase = record.minimum_purchase;
        policy.maximum_discount = record.maximum_discount;
        policy.active = record.active;

        Ok(policy)
    }
}

/// Resolves user-supplied coupon codes to coupon policies.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CouponLookup: Send + Sync {
    /// Find an active coupon whose code matches `code` case-insensitively.
    async fn find_active_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CouponPolicy>, CouponLookupError>;
}

/// A fixed, compiled-in coupon catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCouponTable {
    policies: Vec<CouponPolicy>,
}

impl StaticCouponTable {
    /// Create a table from the given policies.
    pub fn new(policies: impl Into<Vec<CouponPolicy>>) -> Self {
        Self {
            policies: policies.into(),
        }
    }

    /// Find an active policy by code.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&CouponPolicy> {
        self.policies
            .iter()
            .find(|policy| policy.is_active() && policy.matches_code(code))
    }

    /// Iterate over every policy in the table, active or not.
    pub fn iter(&self) -> impl Iterator<Item = &CouponPolicy> {
        self.policies.iter()
    }

    /// Number of policies in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[async_trait]
impl CouponLookup for StaticCouponTable {
    async fn find_active_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CouponPolicy>, CouponLookupError> {
        Ok(self.find(code).cloned())
    }
}

/// The storefront's built-in coupons, with thresholds expressed in `currency`.
///
/// | Code        | Discount | Minimum purchase | Cap |
/// |-------------|----------|------------------|-----|
/// | `WELCOME10` | 10%      | none             | none |
/// | `SAVE20`    | 20%      | 100              | none |
/// | `SUPER30`   | 30%      | 200              | 100 |
#[must_use]
pub fn default_coupons(currency: &'static Currency) -> StaticCouponTable {
    let major = |amount: u64| amount.saturating_mul(10_u64.saturating_pow(currency.exponent));

    StaticCouponTable::new([
        preset("WELCOME10", 10),
        preset("SAVE20", 20).with_minimum_purchase(major(100)),
        preset("SUPER30", 30)
            .with_minimum_purchase(major(200))
            .with_maximum_discount(major(100)),
    ])
}

fn preset(code: &str, percent_points: u8) -> CouponPolicy {
    CouponPolicy {
        code: code.to_string(),
        discount_percentage: Decimal::from(percent_points.min(100)),
        minimum_purchase: None,
        maximum_discount: None,
        active: true,
    }
}
