//! Items

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a catalog product.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One product entry in the cart, with a quantity.
///
/// Prices are held in minor currency units (pence, paise, cents). The item carries
/// no currency of its own; the owning cart decides which currency the minor units
/// are denominated in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    id: ProductId,
    name: String,
    unit_price: u64,
    quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: u64,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
            image: None,
        }
    }

    /// Attach a display image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Product identifier
    #[must_use]
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price in minor units
    #[must_use]
    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// Quantity in the cart
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Display image reference, if any
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}
