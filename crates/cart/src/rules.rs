//! Cart rules: validity checks and next-state computation.
//!
//! Nothing here mutates a cart or touches storage. The two async rules read
//! from the stock/catalog ports and return a decision or a new snapshot.

use std::num::NonZeroU32;

use rocketshoes_core::{Cart, ProductId};
use tracing::instrument;

use crate::api::{ApiError, ProductCatalog, StockGateway};
use crate::error::CartError;

/// How a requested amount relates to what is already in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCheck {
    /// Request adds `desired` more units on top of the current amount.
    Additional,
    /// Request sets the amount to `desired`. A decrease only needs `desired`
    /// units in stock.
    Target,
}

/// True iff the cart holds an entry for `product_id`.
#[must_use]
pub fn is_in_cart(cart: &Cart, product_id: ProductId) -> bool {
    cart.contains(product_id)
}

/// Decide whether a request exceeds the available stock.
///
/// `current` is the amount already in the cart (`None` if absent). Any
/// `available` is accepted, including negative values from the stock API.
#[must_use]
pub fn exceeds_stock(current: Option<u32>, desired: i64, available: i64, check: StockCheck) -> bool {
    match (check, current.map(i64::from)) {
        (_, None) => available < desired,
        (StockCheck::Target, Some(current)) if current > desired => available < desired,
        // `current` is never negative, so the sum can only overflow upwards
        (StockCheck::Target, Some(current)) => desired
            .checked_add(current)
            .is_none_or(|total| available < total),
        // The resulting amount must also fit a cart line
        (StockCheck::Additional, Some(current)) => desired
            .checked_add(current)
            .is_none_or(|total| total > i64::from(u32::MAX) || available < total),
    }
}

/// Query the stock gateway and decide whether a request exceeds stock.
///
/// # Errors
///
/// Returns `ApiError` if the stock lookup fails.
#[instrument(skip(stock, cart), fields(product_id = %product_id))]
pub async fn will_exceed_stock(
    stock: &dyn StockGateway,
    cart: &Cart,
    product_id: ProductId,
    desired: i64,
    check: StockCheck,
) -> Result<bool, ApiError> {
    let record = stock.stock(product_id).await?;
    let current = cart.amount_of(product_id);
    let exceeds = exceeds_stock(current, desired, record.available_amount, check);

    tracing::debug!(
        available = record.available_amount,
        current = ?current,
        exceeds,
        "Stock checked"
    );

    Ok(exceeds)
}

/// Next cart after adding one unit of `product_id`.
///
/// Increments the existing line, or fetches the product from the catalog and
/// appends it with amount 1. The input cart is never modified.
///
/// # Errors
///
/// Returns `ApiError` if the product is new and the catalog lookup fails.
pub async fn with_incremented_or_inserted(
    catalog: &dyn ProductCatalog,
    cart: &Cart,
    product_id: ProductId,
) -> Result<Cart, ApiError> {
    if is_in_cart(cart, product_id) {
        return Ok(cart.with_incremented(product_id));
    }

    let details = catalog.product(product_id).await?;
    Ok(cart.with_new_product(details))
}

/// Validate a requested amount.
///
/// # Errors
///
/// Returns `CartError::InvalidAmount` if `amount <= 0` or does not fit in a `u32`.
pub fn assert_positive_amount(amount: i64) -> Result<NonZeroU32, CartError> {
    u32::try_from(amount)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(CartError::InvalidAmount { amount })
}
