//! Storefront client: backend APIs, durable local state and checkout.

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod context;
pub mod coupons;
pub mod observability;
pub mod orders;
pub mod products;
pub mod storage;
