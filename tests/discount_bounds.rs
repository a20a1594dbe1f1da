//! Property tests for the pricing engine's discount bounds.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rusty_money::iso::INR;
use storefront::{
    prelude::*,
    pricing::{discount_minor, price},
};

fn coupon_strategy() -> impl Strategy<Value = CouponPolicy> {
    (
        0_u32..=100,
        proptest::option::of(0_u64..500_000),
        proptest::option::of(0_u64..500_000),
    )
        .prop_filter_map("valid coupon", |(percent, minimum, maximum)| {
            let mut coupon = CouponPolicy::new("PROP", Decimal::from(percent)).ok()?;

            if let Some(minimum) = minimum {
                coupon = coupon.with_minimum_purchase(minimum);
            }

            if let Some(maximum) = maximum {
                coupon = coupon.with_maximum_discount(maximum);
            }

            Some(coupon)
        })
}

fn items_strategy() -> impl Strategy<Value = Vec<LineItem>> {
    proptest::collection::vec((0_u64..1_000_000, 1_u32..50), 0..8).prop_map(|lines| {
        lines
            .into_iter()
            .enumerate()
            .map(|(index, (unit_price, quantity))| {
                LineItem::new(format!("p{index}"), format!("Product {index}"), unit_price, quantity)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn discount_never_exceeds_subtotal(subtotal in 0_u64..10_000_000_000, coupon in coupon_strategy()) {
        let discount = discount_minor(subtotal, Some(&coupon))?;

        prop_assert!(discount <= subtotal, "discount {} above subtotal {}", discount, subtotal);
    }

    #[test]
    fn discount_respects_cap(subtotal in 0_u64..10_000_000_000, coupon in coupon_strategy()) {
        let discount = discount_minor(subtotal, Some(&coupon))?;

        if let Some(cap) = coupon.maximum_discount() {
            prop_assert!(discount <= cap, "discount {} above cap {}", discount, cap);
        }
    }

    #[test]
    fn discount_is_zero_below_minimum(subtotal in 0_u64..10_000_000, coupon in coupon_strategy()) {
        let discount = discount_minor(subtotal, Some(&coupon))?;

        if coupon.minimum_purchase().is_some_and(|minimum| subtotal < minimum) {
            prop_assert_eq!(discount, 0);
        }
    }

    #[test]
    fn totals_are_consistent(items in items_strategy(), coupon in proptest::option::of(coupon_strategy())) {
        let totals = price(&items, coupon.as_ref(), INR)?;

        let subtotal = totals.subtotal().to_minor_units();
        let discount = totals.discount().to_minor_units();
        let total = totals.total().to_minor_units();

        prop_assert!(discount >= 0);
        prop_assert!(discount <= subtotal);
        prop_assert_eq!(total, subtotal - discount);
    }
}
