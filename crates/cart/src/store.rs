//! The cart store.
//!
//! [`CartStore`] owns the current [`Cart`] and keeps the persisted copy in
//! step with it. It is built once per application instance from a set of
//! [`CartPorts`] and handed to the UI layer by reference.
//!
//! # Commit
//!
//! Each successful operation computes the next cart, writes it to storage,
//! and only then replaces the in-memory cart. A failure at any step leaves
//! both copies exactly as they were.
//!
//! # Concurrency
//!
//! Mutations take `&mut self`, so two operations cannot interleave on one
//! store. Hosts that share a store across tasks wrap it in a lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use rocketshoes_core::{Cart, Price, ProductId};
use tracing::instrument;

use crate::api::{ProductCatalog, StockGateway};
use crate::error::{CartError, CartOperation, Result};
use crate::notifier::Notifier;
use crate::rules::{
    StockCheck, assert_positive_amount, is_in_cart, will_exceed_stock,
    with_incremented_or_inserted,
};
use crate::storage::{CartStorage, StorageError};

/// Collaborators a store depends on.
#[derive(Clone)]
pub struct CartPorts {
    pub stock: Arc<dyn StockGateway>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub storage: Arc<dyn CartStorage>,
    pub notifier: Arc<dyn Notifier>,
}

/// Current cart plus its persisted mirror.
pub struct CartStore {
    cart: Cart,
    ports: CartPorts,
}

impl CartStore {
    /// Create a store, hydrating the cart from storage.
    ///
    /// A missing value yields an empty cart. A stored value that cannot be
    /// read or parsed is logged and also yields an empty cart; storage is left
    /// alone until the next successful commit overwrites it.
    #[must_use]
    pub fn initialize(ports: CartPorts) -> Self {
        let cart = match ports.storage.load() {
            Ok(Some(cart)) => {
                tracing::debug!(products = cart.len(), "Cart restored from storage");
                cart
            }
            Ok(None) => Cart::new(),
            Err(StorageError::Malformed(e)) => {
                tracing::warn!(error = %e, "Stored cart is malformed, starting with an empty cart");
                Cart::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stored cart, starting with an empty cart");
                Cart::new()
            }
        };

        Self { cart, ports }
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.cart.len()
    }

    /// Amount per product id.
    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ProductId, u32> {
        self.cart.amounts()
    }

    /// Cart total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.cart.total()
    }

    /// Add one unit of a product, inserting it if it is not in the cart yet.
    ///
    /// # Errors
    ///
    /// - `CartError::ProductOutOfStock` if one more unit exceeds stock
    /// - `CartError::Api` if the stock or catalog lookup fails
    /// - `CartError::Storage` if the new cart cannot be persisted
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&mut self, product_id: ProductId) -> Result<&Cart> {
        let next = self.next_after_add(product_id).await;
        self.finish(CartOperation::Add, next)
    }

    /// Remove a product line entirely.
    ///
    /// # Errors
    ///
    /// - `CartError::ProductNotFoundInCart` if the product is not in the cart
    /// - `CartError::Storage` if the new cart cannot be persisted
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_product(&mut self, product_id: ProductId) -> Result<&Cart> {
        let next = if is_in_cart(&self.cart, product_id) {
            Ok(self.cart.without(product_id))
        } else {
            Err(CartError::ProductNotFoundInCart { product_id })
        };
        self.finish(CartOperation::Remove, next)
    }

    /// Set the amount of a product already in the cart.
    ///
    /// # Errors
    ///
    /// - `CartError::InvalidAmount` if `amount <= 0`
    /// - `CartError::ProductOutOfStock` if the new amount exceeds stock
    /// - `CartError::ProductNotFoundInCart` if the product is not in the cart
    /// - `CartError::Api` if the stock lookup fails
    /// - `CartError::Storage` if the new cart cannot be persisted
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_product_amount(
        &mut self,
        product_id: ProductId,
        amount: i64,
    ) -> Result<&Cart> {
        let next = self.next_after_update(product_id, amount).await;
        self.finish(CartOperation::Update, next)
    }

    async fn next_after_add(&self, product_id: ProductId) -> Result<Cart> {
        if will_exceed_stock(
            self.ports.stock.as_ref(),
            &self.cart,
            product_id,
            1,
            StockCheck::Additional,
        )
        .await?
        {
            return Err(CartError::ProductOutOfStock { product_id });
        }

        Ok(with_incremented_or_inserted(self.ports.catalog.as_ref(), &self.cart, product_id).await?)
    }

    async fn next_after_update(&self, product_id: ProductId, amount: i64) -> Result<Cart> {
        let amount_nz = assert_positive_amount(amount)?;

        if will_exceed_stock(
            self.ports.stock.as_ref(),
            &self.cart,
            product_id,
            amount,
            StockCheck::Target,
        )
        .await?
        {
            return Err(CartError::ProductOutOfStock { product_id });
        }

        if !is_in_cart(&self.cart, product_id) {
            return Err(CartError::ProductNotFoundInCart { product_id });
        }

        Ok(self.cart.with_amount_set(product_id, amount_nz))
    }

    /// Commit `next` or report the failure.
    fn finish(&mut self, operation: CartOperation, next: Result<Cart>) -> Result<&Cart> {
        match next.and_then(|cart| self.commit(cart)) {
            Ok(()) => {
                self.ports.notifier.success(operation.success_message());
                Ok(&self.cart)
            }
            Err(error) => {
                self.report(operation, &error);
                Err(error)
            }
        }
    }

    /// Persist, then swap in memory.
    fn commit(&mut self, next: Cart) -> Result<()> {
        self.ports.storage.save(&next)?;
        self.cart = next;
        tracing::debug!(products = self.cart.len(), "Cart committed");
        Ok(())
    }

    fn report(&self, operation: CartOperation, error: &CartError) {
        if error.is_unexpected() {
            let event_id = sentry::capture_error(error);
            tracing::error!(
                %operation,
                error = %error,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::info!(%operation, error = %error, "Cart operation rejected");
        }

        self.ports.notifier.error(error.user_message(operation));
    }
}
