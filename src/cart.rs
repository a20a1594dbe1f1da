//! Cart
//!
//! [`CartStore`] owns the shopper's line items and applied coupon, keeps them
//! in a [`KeyValueStore`] across sessions, and derives prices on demand.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    coupons::{CouponError, CouponLookup, CouponPolicy},
    items::{LineItem, ProductId},
    pricing::{self, PricingError, Totals},
    storage::{KeyValueStore, StorageError},
};

/// Storage key holding the serialized line items.
pub const CART_KEY: &str = "cart";

/// Storage key holding the serialized applied coupon.
pub const APPLIED_COUPON_KEY: &str = "appliedCoupon";

/// Errors raised by cart mutations and price reads.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced product is not in the cart.
    #[error("item {0} is not in the cart")]
    ItemNotFound(ProductId),

    /// The cart state could not be persisted. The in-memory change is kept.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Prices could not be derived.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// When a coupon's minimum purchase is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MinimumPurchasePolicy {
    /// Reject the coupon at apply time when the subtotal is below the minimum.
    #[default]
    EnforceOnApply,

    /// Install the coupon regardless; pricing yields no discount below the minimum.
    DeferToPricing,
}

/// Line items plus at most one applied coupon.
///
/// Item ids are unique and every stored quantity is at least one. Items keep
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<LineItem>,
    applied_coupon: Option<CouponPolicy>,
}

impl CartState {
    /// Build a state from raw records, merging duplicate ids and dropping
    /// zero-quantity lines.
    pub fn from_records(
        items: impl IntoIterator<Item = LineItem>,
        applied_coupon: Option<CouponPolicy>,
    ) -> Self {
        let mut state = Self {
            items: Vec::new(),
            applied_coupon,
        };

        for item in items {
            state.merge(item);
        }

        state
    }

    /// Line items in insertion order
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Currently applied coupon
    #[must_use]
    pub fn applied_coupon(&self) -> Option<&CouponPolicy> {
        self.applied_coupon.as_ref()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn merge(&mut self, item: LineItem) {
        if let Some(existing) = self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            existing.set_quantity(existing.quantity().saturating_add(item.quantity()));
        } else if item.quantity() > 0 {
            self.items.push(item);
        }
    }

    /// Shift an existing line's quantity by `delta`, removing the line when it
    /// reaches zero. Unknown ids are ignored.
    fn shift(&mut self, id: &ProductId, delta: i64) {
        let Some(index) = self.position(id) else {
            return;
        };

        let Some(item) = self.items.get_mut(index) else {
            return;
        };

        let shifted = i64::from(item.quantity()).saturating_add(delta);
        let quantity = u32::try_from(shifted.max(0)).unwrap_or(u32::MAX);

        if quantity == 0 {
            self.items.remove(index);
        } else {
            item.set_quantity(quantity);
        }
    }

    fn remove(&mut self, id: &ProductId) {
        self.items.retain(|item| item.id() != id);
    }
}

/// The shopper's cart, persisted through a [`KeyValueStore`].
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    currency: &'static Currency,
    policy: MinimumPurchasePolicy,
    state: CartState,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Rehydrate a cart from storage.
    ///
    /// Missing or unreadable records fall back to an empty cart; nothing is
    /// surfaced to the caller.
    pub fn load(storage: S, currency: &'static Currency) -> Self {
        let items: Vec<LineItem> = read_record(&storage, CART_KEY).unwrap_or_default();
        let applied_coupon = read_record(&storage, APPLIED_COUPON_KEY);

        let state = CartState::from_records(items, applied_coupon);

        debug!(
            items = state.items().len(),
            coupon = state.applied_coupon().map(CouponPolicy::code),
            "cart loaded"
        );

        Self {
            storage,
            currency,
            policy: MinimumPurchasePolicy::default(),
            state,
        }
    }

    /// Choose when coupon minimum purchases are enforced.
    #[must_use]
    pub fn with_policy(mut self, policy: MinimumPurchasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Line items in insertion order
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.state.items()
    }

    /// Currently applied coupon
    #[must_use]
    pub fn applied_coupon(&self) -> Option<&CouponPolicy> {
        self.state.applied_coupon()
    }

    /// Whole cart state
    #[must_use]
    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Currency the cart is priced in
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Minimum purchase enforcement policy
    #[must_use]
    pub fn policy(&self) -> MinimumPurchasePolicy {
        self.policy
    }

    /// Backing store
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Check if the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.items.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state
            .items
            .iter()
            .map(|item| u64::from(item.quantity()))
            .sum()
    }

    /// Add an item, merging quantities when the id is already present.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the new state could not be persisted.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), CartError> {
        debug!(id = %item.id(), quantity = item.quantity(), "adding item");

        self.state.merge(item);
        Ok(self.persist()?)
    }

    /// Remove an item. Removing an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the new state could not be persisted.
    pub fn remove_item(&mut self, id: &ProductId) -> Result<(), CartError> {
        debug!(%id, "removing item");

        self.state.remove(id);
        Ok(self.persist()?)
    }

    /// Set a line's quantity. Zero behaves like [`Self::remove_item`].
    ///
    /// # Errors
    ///
    /// - [`CartError::ItemNotFound`]: a non-zero quantity for an id not in the cart.
    /// - [`CartError::Storage`]: the new state could not be persisted.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_item(id);
        }

        let Some(current) = self
            .state
            .items
            .iter()
            .find(|item| item.id() == id)
            .map(LineItem::quantity)
        else {
            return Err(CartError::ItemNotFound(id.clone()));
        };

        let delta = i64::from(quantity) - i64::from(current);

        debug!(%id, delta, "adjusting quantity");

        self.state.shift(id, delta);
        Ok(self.persist()?)
    }

    /// Empty the cart and drop the applied coupon, removing both records.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the records could not be removed.
    pub fn clear(&mut self) -> Result<(), CartError> {
        debug!("clearing cart");

        self.state = CartState::default();

        self.storage.remove(CART_KEY)?;
        self.storage.remove(APPLIED_COUPON_KEY)?;

        Ok(())
    }

    /// Resolve `code` through `lookup` and make it the applied coupon,
    /// replacing any previous one.
    ///
    /// The cart is left unchanged on any error.
    ///
    /// # Errors
    ///
    /// - [`CouponError::InvalidCoupon`]: the code is blank, unknown or inactive.
    /// - [`CouponError::BelowMinimumPurchase`]: the subtotal is under the coupon's
    ///   minimum and the policy is [`MinimumPurchasePolicy::EnforceOnApply`].
    /// - [`CouponError::Lookup`]: the catalog could not be consulted.
    /// - [`CouponError::Storage`]: the coupon could not be persisted.
    pub async fn apply_coupon<L>(
        &mut self,
        code: &str,
        lookup: &L,
    ) -> Result<CouponPolicy, CouponError>
    where
        L: CouponLookup + ?Sized,
    {
        let code = code.trim();

        if code.is_empty() {
            return Err(CouponError::InvalidCoupon);
        }

        let Some(coupon) = lookup.find_active_by_code(code).await? else {
            debug!(code, "coupon not found");

            return Err(CouponError::InvalidCoupon);
        };

        if !coupon.is_active() {
            return Err(CouponError::InvalidCoupon);
        }

        if self.policy == MinimumPurchasePolicy::EnforceOnApply {
            let subtotal = pricing::subtotal_minor(self.items())?;

            if let Some(minimum) = coupon.minimum_purchase().filter(|minimum| subtotal < *minimum) {
                return Err(CouponError::BelowMinimumPurchase(pricing::to_money(
                    minimum,
                    self.currency,
                )?));
            }
        }

        debug!(code = coupon.code(), "applying coupon");

        let previous = self.state.applied_coupon.replace(coupon.clone());

        if let Err(err) = self.persist() {
            self.state.applied_coupon = previous;

            return Err(err.into());
        }

        Ok(coupon)
    }

    /// Drop the applied coupon, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the new state could not be persisted.
    pub fn remove_coupon(&mut self) -> Result<(), CartError> {
        self.state.applied_coupon = None;
        Ok(self.persist()?)
    }

    /// Sum of line totals.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] if the subtotal overflows.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, CartError> {
        Ok(pricing::subtotal(self.items(), self.currency)?)
    }

    /// Discount granted by the applied coupon at the current subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] if the discount cannot be derived.
    pub fn discount(&self) -> Result<Money<'static, Currency>, CartError> {
        Ok(pricing::discount(&self.subtotal()?, self.applied_coupon())?)
    }

    /// Amount payable.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] if the total cannot be derived.
    pub fn total(&self) -> Result<Money<'static, Currency>, CartError> {
        Ok(self.totals()?.total())
    }

    /// Subtotal, discount and total together.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] if any amount cannot be derived.
    pub fn totals(&self) -> Result<Totals, CartError> {
        Ok(pricing::price(
            self.items(),
            self.applied_coupon(),
            self.currency,
        )?)
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let items = serde_json::to_string(self.state.items())?;

        self.storage.set(CART_KEY, &items)?;

        match self.state.applied_coupon() {
            Some(coupon) => {
                let coupon = serde_json::to_string(coupon)?;

                self.storage.set(APPLIED_COUPON_KEY, &coupon)?;
            }
            None => self.storage.remove(APPLIED_COUPON_KEY)?,
        }

        Ok(())
    }
}

fn read_record<S, T>(storage: &S, key: &str) -> Option<T>
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read persisted record, starting empty");

            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding malformed persisted record");

            None
        }
    }
}
