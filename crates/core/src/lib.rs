//! RocketShoes Core - Shared types library.
//!
//! This crate provides the types used across all RocketShoes components:
//! - `cart` - Cart store, stock/catalog gateways, and storage adapters
//! - `cli` - Command-line front end for driving a cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart transformations - no I/O,
//! no HTTP clients, no storage. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - Products, the cart snapshot, and stock records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartInvariantError, Product, ProductDetails, StockRecord};
pub use types::*;
