//! Product catalog client.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use storefront::{
    items::LineItem,
    pricing::{PricingError, minor_from_major},
};

use crate::api::{ApiClient, ApiError};

/// Number of products shown as hot deals.
pub const HOT_DEALS_LIMIT: usize = 4;

/// A catalog product. Prices are in major units of the store currency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub base_price: Decimal,

    #[serde(default)]
    pub discount_price: Decimal,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub is_available: bool,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub slug: String,
}

impl Product {
    /// Whether a positive discount price is set.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discount_price > Decimal::ZERO
    }

    /// The price a shopper pays: the discount price when set, otherwise the base price.
    #[must_use]
    pub fn selling_price(&self) -> Decimal {
        if self.is_discounted() {
            self.discount_price
        } else {
            self.base_price
        }
    }

    /// Amount saved against the base price.
    #[must_use]
    pub fn discount_amount(&self) -> Decimal {
        (self.base_price - self.selling_price()).max(Decimal::ZERO)
    }

    /// Build a cart line for this product.
    ///
    /// # Errors
    ///
    /// Returns an error if the selling price cannot be expressed in minor units.
    pub fn to_line_item(
        &self,
        quantity: u32,
        currency: &'static Currency,
    ) -> Result<LineItem, PricingError> {
        let unit_price = minor_from_major(self.selling_price(), currency)?;
        let item = LineItem::new(self.id.as_str(), self.name.as_str(), unit_price, quantity);

        Ok(match self.images.first() {
            Some(image) => item.with_image(image.as_str()),
            None => item,
        })
    }
}

/// Products flagged active.
pub fn active_products(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|product| product.is_active).collect()
}

/// Products flagged available.
pub fn available_products(products: &[Product]) -> Vec<&Product> {
    products
        .iter()
        .filter(|product| product.is_available)
        .collect()
}

/// The first few active, available, discounted products.
pub fn hot_deals(products: &[Product]) -> Vec<&Product> {
    products
        .iter()
        .filter(|product| product.is_active && product.is_available && product.is_discounted())
        .take(HOT_DEALS_LIMIT)
        .collect()
}

#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// List every product.
    async fn list(&self) -> Result<Vec<Product>, ApiError>;

    /// Retrieve a single product by id.
    async fn get(&self, id: &str) -> Result<Product, ApiError>;

    /// Retrieve a single product by slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Product, ApiError>;

    /// List products in a category.
    async fn by_category(&self, category: &str) -> Result<Vec<Product>, ApiError>;
}

/// [`ProductCatalog`] backed by `/api/products`.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    api: ApiClient,
}

impl HttpProductCatalog {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn list(&self) -> Result<Vec<Product>, ApiError> {
        self.api.get("/api/products").await
    }

    async fn get(&self, id: &str) -> Result<Product, ApiError> {
        self.api.get(&format!("/api/products/{id}")).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        self.api
            .get(&format!("/api/products/get-by-slug/{slug}"))
            .await
    }

    async fn by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        self.api
            .get(&format!("/api/products/category/{category}"))
            .await
    }
}
