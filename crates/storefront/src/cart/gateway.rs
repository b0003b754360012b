//! Remote cart gateway seam.
//!
//! The store talks to the commerce platform only through [`CartGateway`].
//! Every method is a single round trip that returns the complete refreshed
//! cart; the gateway never retries and never batches.

use std::sync::Arc;

use async_trait::async_trait;

use reuse_core::{CartId, CartLineId};

use crate::error::Result;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

use super::CartSnapshot;

/// Create/read/update/delete calls against the authoritative remote cart.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Create a new cart seeded with `lines` (each quantity at least 1).
    async fn create(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot>;

    /// Append lines to an existing cart. Consolidation of duplicate
    /// variants is up to the platform.
    async fn add_lines(&self, cart_id: &CartId, lines: Vec<CartLineInput>)
    -> Result<CartSnapshot>;

    /// Change quantities of existing lines (each quantity at least 1).
    async fn update_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot>;

    /// Remove lines from a cart.
    async fn remove_lines(&self, cart_id: &CartId, line_ids: Vec<CartLineId>)
    -> Result<CartSnapshot>;

    /// Read a cart. `None` means it expired or was purged.
    async fn fetch(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>>;
}

#[async_trait]
impl<T: CartGateway + ?Sized> CartGateway for Arc<T> {
    async fn create(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot> {
        (**self).create(lines).await
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<CartSnapshot> {
        (**self).add_lines(cart_id, lines).await
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot> {
        (**self).update_lines(cart_id, updates).await
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<CartSnapshot> {
        (**self).remove_lines(cart_id, line_ids).await
    }

    async fn fetch(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>> {
        (**self).fetch(cart_id).await
    }
}
