//! Shopping cart engine.
//!
//! [`CartEngine`] is the only code that reads or writes cart state. Handlers
//! build one per request over the shopper's [`CartStorage`] and call its
//! commands; every command returns a fresh [`CartSnapshot`].
//!
//! Reads are fail-soft: a missing or corrupt entry is an empty cart (logged).
//! Writes are not: a failed write surfaces as [`CartError::StorageUnavailable`].

pub mod line;
pub mod promo;
pub mod storage;
pub mod totals;

use std::sync::Arc;

use gaojie_core::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

pub use line::{CartLine, ProductRef};
pub use promo::{PromoKind, PromoState, PromoTable, StoredPromo};
pub use storage::{CartStorage, MemoryStorage, StorageError, keys};
pub use totals::{
    CartTotals, FreeShippingProgress, PricingConfig, ShippingMethod, ShippingRule,
    compute_totals, free_shipping_progress,
};

/// Cart command errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// The code is not in the promo table. Nothing was changed.
    #[error("Invalid promo code")]
    PromoInvalid,

    /// No line with this product id.
    #[error("Item not in cart: {0}")]
    LineNotFound(ProductId),

    /// Persisting the cart failed.
    #[error("Cart storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// Cart state could not be encoded.
    #[error("Cart encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Typed quantity command.
///
/// Wire form: `{"action": "increment"}` or `{"action": "set", "quantity": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "quantity", rename_all = "snake_case")]
pub enum QuantityChange {
    /// +1.
    Increment,
    /// −1, stopping at 1.
    Decrement,
    /// −1, removing the line instead of reaching 0.
    DecrementOrRemove,
    /// Direct entry; anything below 1 becomes 1.
    Set(i64),
}

impl QuantityChange {
    /// New quantity for a line currently at `current`. `None` removes it.
    #[must_use]
    pub fn apply(self, current: u32) -> Option<u32> {
        match self {
            Self::Increment => Some(current.saturating_add(1)),
            Self::Decrement => Some(current.saturating_sub(1).max(1)),
            Self::DecrementOrRemove => match current.saturating_sub(1) {
                0 => None,
                n => Some(n),
            },
            Self::Set(n) => Some(u32::try_from(n.max(1)).unwrap_or(u32::MAX)),
        }
    }
}

/// Lines, promo and totals after a command.
#[derive(Debug, Clone, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub promo: Option<PromoState>,
    pub shipping_method: ShippingMethod,
    pub totals: CartTotals,
    pub free_shipping: Option<FreeShippingProgress>,
    pub is_empty: bool,
}

impl CartSnapshot {
    /// Badge count: total quantity across lines.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.totals.item_count
    }
}

/// The cart engine.
pub struct CartEngine<S> {
    storage: S,
    promos: Arc<PromoTable>,
    pricing: PricingConfig,
}

impl<S: CartStorage> CartEngine<S> {
    /// Build an engine over a storage backend.
    pub const fn new(storage: S, promos: Arc<PromoTable>, pricing: PricingConfig) -> Self {
        Self {
            storage,
            promos,
            pricing,
        }
    }

    /// Pricing rules in effect.
    pub const fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Current lines. Never fails; unreadable state is an empty cart.
    pub async fn cart(&self) -> Vec<CartLine> {
        let raw = match self.storage.read(keys::CART).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Cart storage unavailable, treating cart as empty");
                return Vec::new();
            }
        };

        line::decode_lines(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Corrupt cart entry, treating cart as empty");
            Vec::new()
        })
    }

    /// Active promo, re-resolved against the table.
    ///
    /// A stored code that is no longer in the table lapses silently.
    pub async fn promo(&self) -> Option<PromoState> {
        let raw = match self.storage.read(keys::PROMO).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Promo storage unavailable, ignoring promo");
                return None;
            }
        };

        let stored: StoredPromo = serde_json::from_str(&raw)
            .inspect_err(|e| tracing::warn!(error = %e, "Corrupt promo entry, ignoring promo"))
            .ok()?;
        let promo = self.promos.lookup(&stored.code);
        if promo.is_none() {
            tracing::debug!(code = %stored.code, "Stored promo no longer valid");
        }
        promo
    }

    /// Add a product, merging with an existing line of the same id.
    ///
    /// A quantity of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageUnavailable`] if the cart cannot be saved.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(
        &self,
        product: ProductRef,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let quantity = quantity.max(1);
        let mut lines = self.cart().await;

        if let Some(existing) = lines.iter_mut().find(|l| l.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            lines.push(product.into_line(quantity));
        }

        self.save_lines(&lines).await?;
        Ok(self.build_snapshot(lines, ShippingMethod::Standard).await)
    }

    /// Change a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown id, or
    /// [`CartError::StorageUnavailable`] if the cart cannot be saved.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_quantity(
        &self,
        id: &ProductId,
        change: QuantityChange,
    ) -> Result<CartSnapshot, CartError> {
        let mut lines = self.cart().await;
        let index = lines
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| CartError::LineNotFound(id.clone()))?;

        let current = lines.get(index).map_or(1, |l| l.quantity);
        match change.apply(current) {
            Some(quantity) => {
                if let Some(line) = lines.get_mut(index) {
                    line.quantity = quantity;
                }
            }
            None => {
                lines.remove(index);
            }
        }

        self.save_lines(&lines).await?;
        Ok(self.build_snapshot(lines, ShippingMethod::Standard).await)
    }

    /// Remove a line. Removing an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageUnavailable`] if the cart cannot be saved.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_item(&self, id: &ProductId) -> Result<CartSnapshot, CartError> {
        let mut lines = self.cart().await;
        let before = lines.len();
        lines.retain(|l| &l.id != id);

        if lines.len() != before {
            self.save_lines(&lines).await?;
        }
        Ok(self.build_snapshot(lines, ShippingMethod::Standard).await)
    }

    /// Apply a promo code, replacing any active promo.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::PromoInvalid`] for an unknown code (nothing is
    /// changed), or [`CartError::StorageUnavailable`] if it cannot be saved.
    #[instrument(skip(self))]
    pub async fn apply_promo(&self, code: &str) -> Result<PromoState, CartError> {
        let promo = self.promos.lookup(code).ok_or(CartError::PromoInvalid)?;
        let encoded = serde_json::to_string(&StoredPromo::from(&promo))?;
        self.storage.write(keys::PROMO, encoded).await?;
        tracing::info!(code = %promo.code, "Promo applied");
        Ok(promo)
    }

    /// Drop the active promo.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageUnavailable`] if the entry cannot be removed.
    pub async fn remove_promo(&self) -> Result<CartSnapshot, CartError> {
        self.storage.remove(keys::PROMO).await?;
        Ok(self.snapshot().await)
    }

    /// Snapshot with standard shipping.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.snapshot_for(ShippingMethod::Standard).await
    }

    /// Snapshot with the given shipping method.
    pub async fn snapshot_for(&self, method: ShippingMethod) -> CartSnapshot {
        let lines = self.cart().await;
        self.build_snapshot(lines, method).await
    }

    /// Erase the cart and promo.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageUnavailable`] if either entry cannot be removed.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        self.storage.remove(keys::CART).await?;
        self.storage.remove(keys::PROMO).await?;
        tracing::debug!("Cart cleared");
        Ok(())
    }

    async fn save_lines(&self, lines: &[CartLine]) -> Result<(), CartError> {
        let encoded = line::encode_lines(lines)?;
        self.storage.write(keys::CART, encoded).await?;
        Ok(())
    }

    async fn build_snapshot(&self, lines: Vec<CartLine>, method: ShippingMethod) -> CartSnapshot {
        let promo = self.promo().await;
        let rule = self.pricing.rule(method);
        let totals = compute_totals(&lines, promo.as_ref(), rule, self.pricing.tax_rate);
        let free_shipping = free_shipping_progress(totals.discounted_subtotal, rule);

        CartSnapshot {
            is_empty: lines.is_empty(),
            lines,
            promo,
            shipping_method: method,
            totals,
            free_shipping,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gaojie_core::Amount;
    use rust_decimal::Decimal;

    fn pricing() -> PricingConfig {
        PricingConfig {
            tax_rate: Decimal::new(7, 2),
            standard: ShippingRule {
                fee: Amount::new(80),
                free_threshold: Some(Amount::new(999)),
            },
            express: ShippingRule {
                fee: Amount::new(150),
                free_threshold: None,
            },
        }
    }

    fn engine(storage: MemoryStorage) -> CartEngine<MemoryStorage> {
        CartEngine::new(storage, Arc::new(PromoTable::default()), pricing())
    }

    fn product(id: u64, price: u64) -> ProductRef {
        ProductRef {
            id: ProductId::from(id),
            name: format!("Product {id}"),
            unit_price: Amount::new(price),
            image_url: None,
            slug: Some(format!("product-{id}")),
        }
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage(MemoryStorage);

    impl CartStorage for ReadOnlyStorage {
        async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.read(key).await
        }

        async fn write(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_add_same_product_twice_merges() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 1290), 1).await.unwrap();
        let snapshot = cart.add_item(product(1, 1290), 1).await.unwrap();

        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 2);
        assert_eq!(snapshot.count(), 2);
    }

    #[tokio::test]
    async fn test_add_merges_numeric_and_string_ids() {
        let storage = MemoryStorage::new();
        storage.insert_raw(
            keys::CART,
            r#"[{"id": 7, "name": "Serum", "price": 1290, "quantity": 1}]"#,
        );
        let cart = engine(storage);
        let mut serum = product(7, 1290);
        serum.id = ProductId::parse("7").unwrap();
        let snapshot = cart.add_item(serum, 2).await.unwrap();

        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_add_zero_quantity_clamps_to_one() {
        let cart = engine(MemoryStorage::new());
        let snapshot = cart.add_item(product(1, 100), 0).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_add_persists_storage_shape() {
        let storage = MemoryStorage::new();
        let cart = engine(storage.clone());
        cart.add_item(product(3, 450), 1).await.unwrap();

        let raw = storage.get_raw(keys::CART).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], "3");
        assert_eq!(value[0]["price"], 450);
        assert_eq!(value[0]["quantity"], 1);
        assert_eq!(value[0]["slug"], "product-3");
    }

    #[tokio::test]
    async fn test_decrement_or_remove_at_one_removes_line() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 100), 1).await.unwrap();
        let snapshot = cart
            .set_quantity(&ProductId::from(1_u64), QuantityChange::DecrementOrRemove)
            .await
            .unwrap();

        assert!(snapshot.is_empty);
        assert!(cart.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_decrement_stops_at_one() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 100), 1).await.unwrap();
        let snapshot = cart
            .set_quantity(&ProductId::from(1_u64), QuantityChange::Decrement)
            .await
            .unwrap();
        assert_eq!(snapshot.lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_set_quantity_clamps_non_positive() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 100), 3).await.unwrap();
        let id = ProductId::from(1_u64);

        let snapshot = cart.set_quantity(&id, QuantityChange::Set(0)).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 1);
        let snapshot = cart.set_quantity(&id, QuantityChange::Set(-4)).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 1);
        let snapshot = cart.set_quantity(&id, QuantityChange::Set(6)).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 6);
        let snapshot = cart.set_quantity(&id, QuantityChange::Increment).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_set_quantity_unknown_line() {
        let cart = engine(MemoryStorage::new());
        let err = cart
            .set_quantity(&ProductId::from(9_u64), QuantityChange::Increment)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::LineNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_item_and_missing_id() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 100), 1).await.unwrap();
        cart.add_item(product(2, 200), 1).await.unwrap();

        let snapshot = cart.remove_item(&ProductId::from(42_u64)).await.unwrap();
        assert_eq!(snapshot.lines.len(), 2);

        let snapshot = cart.remove_item(&ProductId::from(1_u64)).await.unwrap();
        assert_eq!(snapshot.lines.len(), 1);
        assert!(!snapshot.is_empty);

        let snapshot = cart.remove_item(&ProductId::from(2_u64)).await.unwrap();
        assert!(snapshot.is_empty);
    }

    #[tokio::test]
    async fn test_stored_zero_quantity_lines_never_returned() {
        let storage = MemoryStorage::new();
        storage.insert_raw(
            keys::CART,
            r#"[{"id": 1, "name": "A", "price": 100, "quantity": 0}, {"id": 2, "name": "B", "price": 100, "quantity": 2}]"#,
        );
        let cart = engine(storage);
        let lines = cart.cart().await;
        assert_eq!(lines.len(), 1);
        assert!(lines.iter().all(|l| l.quantity >= 1));
    }

    #[tokio::test]
    async fn test_corrupt_cart_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage.insert_raw(keys::CART, "{{not json");
        let cart = engine(storage);
        assert!(cart.cart().await.is_empty());
        assert!(cart.snapshot().await.is_empty);
    }

    #[tokio::test]
    async fn test_apply_promo_replaces_instead_of_stacking() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 1000), 2).await.unwrap();

        cart.apply_promo("WELCOME15").await.unwrap();
        assert_eq!(cart.snapshot().await.totals.discount, Amount::new(300));

        cart.apply_promo("save10").await.unwrap();
        let snapshot = cart.snapshot().await;
        assert_eq!(snapshot.promo.unwrap().code, "save10");
        assert_eq!(snapshot.totals.discount, Amount::new(200));
    }

    #[tokio::test]
    async fn test_invalid_promo_leaves_state_untouched() {
        let storage = MemoryStorage::new();
        let cart = engine(storage.clone());
        cart.apply_promo("welcome15").await.unwrap();
        let before = storage.get_raw(keys::PROMO);

        let err = cart.apply_promo("nope").await.unwrap_err();
        assert!(matches!(err, CartError::PromoInvalid));
        assert_eq!(storage.get_raw(keys::PROMO), before);
    }

    #[tokio::test]
    async fn test_stored_promo_lapses_when_removed_from_table() {
        let storage = MemoryStorage::new();
        storage.insert_raw(keys::PROMO, r#"{"code": "summer50", "discount": 0.5}"#);
        let cart = engine(storage);
        assert!(cart.promo().await.is_none());
    }

    #[tokio::test]
    async fn test_legacy_promo_entry_is_resolved() {
        let storage = MemoryStorage::new();
        storage.insert_raw(keys::PROMO, r#"{"code": "save10", "discount": 0.1}"#);
        let cart = engine(storage);
        assert_eq!(cart.promo().await.unwrap().code, "save10");
    }

    #[tokio::test]
    async fn test_remove_promo() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 1000), 1).await.unwrap();
        cart.apply_promo("save10").await.unwrap();
        let snapshot = cart.remove_promo().await.unwrap();
        assert!(snapshot.promo.is_none());
        assert_eq!(snapshot.totals.discount, Amount::ZERO);
    }

    #[tokio::test]
    async fn test_clear_erases_cart_and_promo() {
        let storage = MemoryStorage::new();
        let cart = engine(storage.clone());
        cart.add_item(product(1, 100), 1).await.unwrap();
        cart.apply_promo("save10").await.unwrap();

        cart.clear().await.unwrap();
        assert!(storage.get_raw(keys::CART).is_none());
        assert!(storage.get_raw(keys::PROMO).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_for_express() {
        let cart = engine(MemoryStorage::new());
        cart.add_item(product(1, 2000), 1).await.unwrap();
        let snapshot = cart.snapshot_for(ShippingMethod::Express).await;
        assert_eq!(snapshot.totals.shipping_fee, Amount::new(150));
        assert!(snapshot.free_shipping.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let cart = CartEngine::new(
            ReadOnlyStorage(MemoryStorage::new()),
            Arc::new(PromoTable::default()),
            pricing(),
        );
        let err = cart.add_item(product(1, 100), 1).await.unwrap_err();
        assert!(matches!(err, CartError::StorageUnavailable(_)));
        assert!(cart.cart().await.is_empty());
    }

    #[test]
    fn test_quantity_change_wire_form() {
        let change: QuantityChange = serde_json::from_str(r#"{"action": "increment"}"#).unwrap();
        assert_eq!(change, QuantityChange::Increment);
        let change: QuantityChange =
            serde_json::from_str(r#"{"action": "set", "quantity": 4}"#).unwrap();
        assert_eq!(change, QuantityChange::Set(4));
        let change: QuantityChange =
            serde_json::from_str(r#"{"action": "decrement_or_remove"}"#).unwrap();
        assert_eq!(change, QuantityChange::DecrementOrRemove);
    }
}
