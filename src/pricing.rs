//! Pricing
//!
//! Pure functions deriving the subtotal, discount and total of a cart. Line
//! arithmetic is done on minor units and only lifted into [`Money`] at the edges.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    coupons::CouponPolicy,
    items::{LineItem, ProductId},
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// `unit_price * quantity` overflowed for a line.
    #[error("line total overflowed for item {0}")]
    LineOverflow(ProductId),

    /// The sum of line totals overflowed.
    #[error("cart subtotal overflowed")]
    SubtotalOverflow,

    /// A minor-unit amount does not fit the money representation.
    #[error("amount {0} is out of range")]
    OutOfRange(u64),

    /// A money amount was negative where only non-negative amounts are valid.
    #[error("amount {0} is negative")]
    NegativeAmount(i64),

    /// A major-unit amount is negative or too large for minor units.
    #[error("amount {0} cannot be converted to minor units")]
    InvalidAmount(Decimal),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion failed")]
    PercentConversion,

    /// The discount would take the total below zero.
    #[error("discount exceeds subtotal")]
    DiscountExceedsSubtotal,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Subtotal, discount and total of a cart, all in the cart currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    subtotal: Money<'static, Currency>,
    discount: Money<'static, Currency>,
    total: Money<'static, Currency>,
}

impl Totals {
    /// Sum of line totals
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Coupon discount
    #[must_use]
    pub fn discount(&self) -> Money<'static, Currency> {
        self.discount
    }

    /// Amount payable
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }
}

/// `unit_price * quantity` for one line, in minor units.
///
/// # Errors
///
/// - [`PricingError::LineOverflow`]: the product does not fit in a `u64`.
pub fn line_total(item: &LineItem) -> Result<u64, PricingError> {
    item.unit_price()
        .checked_mul(u64::from(item.quantity()))
        .ok_or_else(|| PricingError::LineOverflow(item.id().clone()))
}

/// Sum of line totals in minor units. Zero for no items.
///
/// # Errors
///
/// - [`PricingError::LineOverflow`]: a single line overflowed.
/// - [`PricingError::SubtotalOverflow`]: the sum overflowed.
pub fn subtotal_minor(items: &[LineItem]) -> Result<u64, PricingError> {
    items.iter().try_fold(0_u64, |acc, item| {
        acc.checked_add(line_total(item)?)
            .ok_or(PricingError::SubtotalOverflow)
    })
}

/// Coupon discount for a subtotal, in minor units.
///
/// Zero without a coupon, or while the subtotal is under the coupon's minimum
/// purchase. Otherwise the percentage of the subtotal rounded half away from
/// zero, capped at the coupon's maximum discount.
///
/// # Errors
///
/// - [`PricingError::PercentConversion`]: the percentage calculation could not be represented.
pub fn discount_minor(subtotal: u64, coupon: Option<&CouponPolicy>) -> Result<u64, PricingError> {
    let Some(coupon) = coupon else {
        return Ok(0);
    };

    if !coupon.is_applicable_to(subtotal) {
        return Ok(0);
    }

    let discount = percent_of_minor(&coupon.percentage(), subtotal)?;

    let capped = coupon
        .maximum_discount()
        .map_or(discount, |cap| discount.min(cap));

    Ok(capped.min(subtotal))
}

/// Calculate a percentage of a minor unit amount, rounded half away from zero.
///
/// # Errors
///
/// - [`PricingError::PercentConversion`]: the result overflows or cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: u64) -> Result<u64, PricingError> {
    let minor = Decimal::from_u64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::PercentConversion)
}

/// Lift a minor-unit amount into [`Money`].
///
/// # Errors
///
/// - [`PricingError::OutOfRange`]: the amount exceeds `i64::MAX`.
pub fn to_money(
    minor: u64,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let Ok(signed) = i64::try_from(minor) else {
        return Err(PricingError::OutOfRange(minor));
    };

    Ok(Money::from_minor(signed, currency))
}

/// Lower a non-negative [`Money`] amount into minor units.
///
/// # Errors
///
/// - [`PricingError::NegativeAmount`]: the amount is below zero.
pub fn to_minor(money: &Money<'static, Currency>) -> Result<u64, PricingError> {
    let minor = money.to_minor_units();

    u64::try_from(minor).map_err(|_err| PricingError::NegativeAmount(minor))
}

/// Convert a major-unit decimal amount (e.g. `49.99`) to minor units, rounding
/// half away from zero to the currency's precision.
///
/// # Errors
///
/// - [`PricingError::InvalidAmount`]: the amount is negative or does not fit.
pub fn minor_from_major(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<u64, PricingError> {
    let invalid = || PricingError::InvalidAmount(amount);

    let scale = 10_u64.checked_pow(currency.exponent).ok_or_else(invalid)?;

    amount
        .checked_mul(Decimal::from(scale))
        .ok_or_else(invalid)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or_else(invalid)
}

/// Convert minor units back to a major-unit decimal in the currency's precision.
#[must_use]
pub fn major_from_minor(minor: u64, currency: &'static Currency) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(minor), currency.exponent)
}

/// Sum of line totals as [`Money`].
///
/// # Errors
///
/// Returns a [`PricingError`] if the subtotal overflows.
pub fn subtotal(
    items: &[LineItem],
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    to_money(subtotal_minor(items)?, currency)
}

/// Coupon discount for a subtotal as [`Money`].
///
/// # Errors
///
/// Returns a [`PricingError`] if the subtotal is negative or the discount cannot be represented.
pub fn discount(
    subtotal: &Money<'static, Currency>,
    coupon: Option<&CouponPolicy>,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = discount_minor(to_minor(subtotal)?, coupon)?;

    to_money(minor, subtotal.currency())
}

/// `subtotal - discount`.
///
/// # Errors
///
/// - [`PricingError::Money`]: the currencies differ.
/// - [`PricingError::DiscountExceedsSubtotal`]: the result would be negative.
pub fn total(
    subtotal: &Money<'static, Currency>,
    discount: &Money<'static, Currency>,
) -> Result<Money<'static, Currency>, PricingError> {
    let total = subtotal.sub(*discount)?;

    if total.to_minor_units() < 0 {
        return Err(PricingError::DiscountExceedsSubtotal);
    }

    Ok(total)
}

/// Price a set of items with an optional coupon.
///
/// # Errors
///
/// Returns a [`PricingError`] if any step of the calculation fails.
pub fn price(
    items: &[LineItem],
    coupon: Option<&CouponPolicy>,
    currency: &'static Currency,
) -> Result<Totals, PricingError> {
    let subtotal = subtotal(items, currency)?;
    let discount = discount(&subtotal, coupon)?;
    let total = total(&subtotal, &discount)?;

    Ok(Totals {
        subtotal,
        discount,
        total,
    })
}
