//! Reuse storefront cart synchronization.
//!
//! Keeps a shopper's local cart view in step with the authoritative cart held
//! by the Shopify Storefront API:
//!
//! - [`cart`] - the cart store, its gateway and persistence seams
//! - [`shopify`] - the Storefront API client (cart and catalog)
//! - [`config`] - environment configuration
//! - [`error`] - the error surface of cart operations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod shopify;
