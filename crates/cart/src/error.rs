//! Cart operation errors.
//!
//! Every store operation returns `Result<_, CartError>`. The first three
//! variants are validation outcomes the user can act on; the rest are
//! infrastructure failures that collapse into a generic per-operation message.

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;
use crate::notifier::messages;
use crate::storage::StorageError;

/// The mutating cart operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
}

impl CartOperation {
    /// Generic message shown when the operation fails for an unclassified reason.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => messages::ADD_FAILED,
            Self::Remove => messages::REMOVE_FAILED,
            Self::Update => messages::UPDATE_FAILED,
        }
    }

    /// Message shown when the operation succeeds.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Add => messages::ADDED,
            Self::Remove => messages::REMOVED,
            Self::Update => messages::UPDATED,
        }
    }
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add_product",
            Self::Remove => "remove_product",
            Self::Update => "update_product_amount",
        })
    }
}

/// Why a cart operation failed.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested amount is zero or negative (or too large to represent).
    #[error("Amount must be greater than zero (got {amount})")]
    InvalidAmount { amount: i64 },

    /// Stock check failed.
    #[error("Requested quantity of product {product_id} exceeds stock")]
    ProductOutOfStock { product_id: ProductId },

    /// Operation targets a product that is not in the cart.
    #[error("Product {product_id} is not in the cart")]
    ProductNotFoundInCart { product_id: ProductId },

    /// Stock or catalog lookup failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Persisting the cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// True for network, parsing, and storage failures.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Api(_) | Self::Storage(_))
    }

    /// The message to show the user when `operation` fails with this error.
    ///
    /// Only the kinds an operation can meaningfully report get a specific
    /// message; everything else falls back to the operation's generic one.
    #[must_use]
    pub const fn user_message(&self, operation: CartOperation) -> &'static str {
        match (operation, self) {
            (CartOperation::Add | CartOperation::Update, Self::ProductOutOfStock { .. }) => {
                messages::OUT_OF_STOCK
            }
            (CartOperation::Update, Self::ProductNotFoundInCart { .. }) => messages::NOT_IN_CART,
            _ => operation.failure_message(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
