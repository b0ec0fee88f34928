//! Cart snapshot types.
//!
//! A [`Cart`] is an ordered list of [`Product`] entries, unique by id, each
//! with a positive amount. Every transformation returns a new snapshot and
//! leaves the receiver untouched, so a store can compute the next cart,
//! persist it, and only then swap it in.
//!
//! The JSON form of a cart is a bare array of products, matching what the
//! storefront keeps under its storage key.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// Product details as served by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: ProductId,
    #[serde(alias = "title")]
    pub name: String,
    pub price: Price,
    #[serde(alias = "image")]
    pub image_url: String,
}

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(alias = "title")]
    pub name: String,
    pub price: Price,
    #[serde(alias = "image")]
    pub image_url: String,
    /// Quantity of this product in the cart.
    pub amount: NonZeroU32,
}

impl Product {
    /// Build a cart line from catalog details.
    #[must_use]
    pub fn from_details(details: ProductDetails, amount: NonZeroU32) -> Self {
        Self {
            id: details.id,
            name: details.name,
            price: details.price,
            image_url: details.image_url,
            amount,
        }
    }

    /// Line subtotal (`price * amount`).
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.amount.get())
    }
}

/// Remote stock level for a product.
///
/// Stock is owned by the stock service; the cart only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub product_id: ProductId,
    pub available_amount: i64,
}

/// Raised when a list of products cannot form a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    #[error("product {0} appears more than once")]
    DuplicateProduct(ProductId),
}

/// The user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Cart {
    products: Vec<Product>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Build a cart from products, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `CartInvariantError::DuplicateProduct` if two entries share an id.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CartInvariantError> {
        for (index, product) in products.iter().enumerate() {
            if products
                .iter()
                .skip(index + 1)
                .any(|other| other.id == product.id)
            {
                return Err(CartInvariantError::DuplicateProduct(product.id));
            }
        }
        Ok(Self { products })
    }

    /// Products in insertion order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.products.iter().any(|product| product.id == product_id)
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == product_id)
    }

    /// Current amount of a product, if it is in the cart.
    #[must_use]
    pub fn amount_of(&self, product_id: ProductId) -> Option<u32> {
        self.get(product_id).map(|product| product.amount.get())
    }

    /// Copy with the entry's amount replaced. Unchanged copy if absent.
    #[must_use]
    pub fn with_amount_set(&self, product_id: ProductId, amount: NonZeroU32) -> Self {
        self.map_entry(product_id, |_| amount)
    }

    /// Copy with the entry's amount raised by one. Unchanged copy if absent.
    ///
    /// Amounts cap at `u32::MAX`; callers that must not saturate check the
    /// amount first.
    #[must_use]
    pub fn with_incremented(&self, product_id: ProductId) -> Self {
        self.map_entry(product_id, |current| current.saturating_add(1))
    }

    /// Copy with a new line appended at amount 1.
    ///
    /// If the product is already present its amount is incremented instead,
    /// so the id stays unique.
    #[must_use]
    pub fn with_new_product(&self, details: ProductDetails) -> Self {
        if self.contains(details.id) {
            return self.with_incremented(details.id);
        }
        let mut products = self.products.clone();
        products.push(Product::from_details(details, NonZeroU32::MIN));
        Self { products }
    }

    /// Copy with the entry filtered out.
    #[must_use]
    pub fn without(&self, product_id: ProductId) -> Self {
        Self {
            products: self
                .products
                .iter()
                .filter(|product| product.id != product_id)
                .cloned()
                .collect(),
        }
    }

    /// Amount per product id, as shown next to each product in the catalog.
    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ProductId, u32> {
        self.products
            .iter()
            .map(|product| (product.id, product.amount.get()))
            .collect()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.products.iter().map(Product::subtotal).sum()
    }

    fn map_entry(
        &self,
        product_id: ProductId,
        f: impl Fn(NonZeroU32) -> NonZeroU32,
    ) -> Self {
        Self {
            products: self
                .products
                .iter()
                .map(|product| {
                    if product.id == product_id {
                        Product {
                            amount: f(product.amount),
                            ..product.clone()
                        }
                    } else {
                        product.clone()
                    }
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<Product>> for Cart {
    type Error = CartInvariantError;

    fn try_from(products: Vec<Product>) -> Result<Self, Self::Error> {
        Self::from_products(products)
    }
}

impl From<Cart> for Vec<Product> {
    fn from(cart: Cart) -> Self {
        cart.products
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}
