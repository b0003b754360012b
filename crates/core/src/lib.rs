//! Reuse Core - Shared types library.
//!
//! This crate provides common types used across the Reuse components:
//! - `storefront` - Cart synchronization and Storefront API client
//! - `cli` - Command-line cart tool
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe remote IDs and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
