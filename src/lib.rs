//! Storefront
//!
//! Cart, pricing and coupon engine for the storefront. Line items are merged
//! on add, prices are derived on demand in minor currency units, and the
//! cart survives restarts through an injected key-value store.

pub mod cart;
pub mod coupons;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod storage;
