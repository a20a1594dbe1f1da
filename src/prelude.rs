//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{APPLIED_COUPON_KEY, CART_KEY, CartError, CartState, CartStore, MinimumPurchasePolicy},
    coupons::{
        CouponError, CouponLookup, CouponLookupError, CouponPolicy, CouponPolicyError,
        StaticCouponTable, default_coupons,
    },
    items::{LineItem, ProductId},
    pricing::{PricingError, Totals},
    storage::{KeyValueStore, MemoryStore, StorageError},
};
