//! Cart store.
//!
//! Holds the most recently confirmed [`CartSnapshot`] together with the
//! open/loading flags, and routes every mutation through the
//! [`CartGateway`]. The snapshot slot is only ever written with a value that
//! came straight out of a gateway response, and a failed call leaves it
//! exactly as it was.
//!
//! Concurrent mutations are not serialized: whichever response lands last
//! becomes the visible snapshot.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use reuse_core::{CartId, CartLineId, MerchandiseId, Money};

use crate::error::{CartError, Result, add_breadcrumb};
use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

use super::{CartGateway, CartLine, CartPersistence, CartSnapshot};

/// Client-side cart state synchronized with the remote cart.
pub struct CartStore<G, P> {
    gateway: G,
    persistence: P,
    snapshot: RwLock<Option<Arc<CartSnapshot>>>,
    is_open: AtomicBool,
    in_flight: AtomicUsize,
}

/// Marks a mutation as in flight until dropped.
struct LoadingGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
    fn new(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Convert a caller-supplied quantity into the wire quantity.
///
/// The Storefront API `Int` is a signed 32-bit value, so anything above
/// `i32::MAX` is rejected here rather than by the platform.
fn positive_quantity(quantity: i64) -> Result<u32> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    i32::try_from(quantity)
        .map(i32::unsigned_abs)
        .map_err(|_| CartError::ValidationRejected(format!("Quantity {quantity} is too large")))
}

fn line_not_found(line_id: &CartLineId) -> CartError {
    CartError::StaleReference(format!("cart line {line_id}"))
}

impl<G, P> CartStore<G, P>
where
    G: CartGateway,
    P: CartPersistence,
{
    /// Create an empty, closed store.
    pub fn new(gateway: G, persistence: P) -> Self {
        Self {
            gateway,
            persistence,
            snapshot: RwLock::new(None),
            is_open: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a store and restore the cart remembered by `persistence`.
    ///
    /// A cart the platform no longer knows is forgotten. A transport or
    /// validation failure leaves the remembered ID in place for the next
    /// session and starts with an empty store. Either way the store is
    /// usable; rehydration never fails.
    ///
    /// The kept ID only survives until this store confirms a cart of its own:
    /// a later successful `add_item` creates a fresh cart and overwrites the
    /// saved ID, orphaning the old remote cart.
    #[instrument(skip_all)]
    pub async fn rehydrate(gateway: G, persistence: P) -> Self {
        let store = Self::new(gateway, persistence);

        let Some(cart_id) = store.persistence.load() else {
            debug!("No saved cart");
            return store;
        };

        let fetched = {
            let _loading = store.begin_loading();
            store.gateway.fetch(&cart_id).await
        };

        match fetched {
            Ok(Some(snapshot)) => {
                info!(cart_id = %cart_id, lines = snapshot.lines.len(), "Restored saved cart");
                store.apply(snapshot);
            }
            Ok(None) => {
                info!(cart_id = %cart_id, "Saved cart expired, starting fresh");
                store.persistence.clear();
            }
            Err(e) if e.is_stale() => {
                info!(cart_id = %cart_id, error = %e, "Saved cart rejected, starting fresh");
                store.persistence.clear();
            }
            Err(e) => {
                warn!(cart_id = %cart_id, error = %e, "Could not restore saved cart");
            }
        }

        store
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of a variant, creating the remote cart on first use.
    ///
    /// Opens the cart on success.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a quantity below 1 without contacting
    /// the gateway, or the gateway's error. The snapshot is unchanged on
    /// failure.
    #[instrument(skip(self, merchandise_id), fields(merchandise_id = %merchandise_id))]
    pub async fn add_item(
        &self,
        merchandise_id: MerchandiseId,
        quantity: i64,
    ) -> Result<Arc<CartSnapshot>> {
        let quantity = positive_quantity(quantity)?;
        let _loading = self.begin_loading();

        add_breadcrumb(
            "cart",
            "Adding item",
            Some(&[("merchandise_id", merchandise_id.as_str())]),
        );

        let lines = vec![CartLineInput {
            merchandise_id,
            quantity,
        }];
        let response = match self.cart_id() {
            None => self.gateway.create(lines).await,
            Some(cart_id) => self.gateway.add_lines(&cart_id, lines).await,
        };

        let snapshot =
            self.apply(response.inspect_err(|e| warn!(error = %e, "Add to cart failed"))?);
        self.open_cart();
        Ok(snapshot)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `StaleReference` without contacting the gateway when there is
    /// no cart or the line is not in it, or the gateway's error.
    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &CartLineId) -> Result<Arc<CartSnapshot>> {
        let current = self.require_line(line_id)?;
        let _loading = self.begin_loading();

        add_breadcrumb("cart", "Removing item", Some(&[("line_id", line_id.as_str())]));

        let response = self
            .gateway
            .remove_lines(&current.id, vec![line_id.clone()])
            .await;
        Ok(self.apply(response.inspect_err(|e| warn!(error = %e, "Remove from cart failed"))?))
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Same as [`Self::remove_item`].
    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    pub async fn set_quantity(
        &self,
        line_id: &CartLineId,
        quantity: i64,
    ) -> Result<Arc<CartSnapshot>> {
        if quantity <= 0 {
            return self.remove_item(line_id).await;
        }

        let quantity = positive_quantity(quantity)?;
        let current = self.require_line(line_id)?;
        let _loading = self.begin_loading();

        add_breadcrumb("cart", "Updating quantity", Some(&[("line_id", line_id.as_str())]));

        let updates = vec![CartLineUpdateInput {
            id: line_id.clone(),
            quantity,
        }];
        let response = self.gateway.update_lines(&current.id, updates).await;
        Ok(self.apply(response.inspect_err(|e| warn!(error = %e, "Cart update failed"))?))
    }

    /// Remove every line in a single call.
    ///
    /// Returns `Ok(None)` without contacting the gateway when there is no
    /// cart or it is already empty.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error; the snapshot is unchanged on failure.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Option<Arc<CartSnapshot>>> {
        let Some(current) = self.snapshot() else {
            return Ok(None);
        };
        if current.is_empty() {
            return Ok(None);
        }

        let _loading = self.begin_loading();
        add_breadcrumb("cart", "Clearing cart", None);

        let line_ids = current.lines.iter().map(|line| line.id.clone()).collect();
        let response = self.gateway.remove_lines(&current.id, line_ids).await;
        Ok(Some(self.apply(
            response.inspect_err(|e| warn!(error = %e, "Clearing cart failed"))?,
        )))
    }

    /// Forget the current cart locally and in persistence.
    ///
    /// The remote cart is left alone; it simply stops being referenced.
    pub fn discard(&self) {
        let previous = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.persistence.clear();
        if let Some(previous) = previous {
            info!(cart_id = %previous.id, "Discarded cart");
        }
    }

    // =========================================================================
    // Panel visibility
    // =========================================================================

    /// Show the cart panel.
    pub fn open_cart(&self) {
        self.is_open.store(true, Ordering::SeqCst);
    }

    /// Hide the cart panel.
    pub fn close_cart(&self) {
        self.is_open.store(false, Ordering::SeqCst);
    }

    /// Flip the cart panel.
    pub fn toggle_cart(&self) {
        self.is_open.fetch_xor(true, Ordering::SeqCst);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current snapshot, if a cart exists.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<CartSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Lines of the current cart; empty without one.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.snapshot()
            .map(|snapshot| snapshot.lines.clone())
            .unwrap_or_default()
    }

    /// Total quantity as reported by the platform; 0 without a cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.snapshot().map_or(0, |snapshot| snapshot.total_quantity)
    }

    /// Subtotal of the current cart.
    #[must_use]
    pub fn subtotal(&self) -> Option<Money> {
        self.snapshot().map(|snapshot| snapshot.subtotal)
    }

    /// Checkout hand-off URL, once the cart has lines.
    #[must_use]
    pub fn checkout_url(&self) -> Option<String> {
        self.snapshot()
            .and_then(|snapshot| snapshot.checkout_url().map(str::to_string))
    }

    /// Remote cart ID, if a cart exists.
    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        self.snapshot().map(|snapshot| snapshot.id.clone())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::SeqCst)
    }

    /// Whether any mutation is awaiting the gateway.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The gateway this store talks to.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin_loading(&self) -> LoadingGuard<'_> {
        LoadingGuard::new(&self.in_flight)
    }

    fn require_line(&self, line_id: &CartLineId) -> Result<Arc<CartSnapshot>> {
        match self.snapshot() {
            Some(current) if current.contains_line(line_id) => Ok(current),
            _ => Err(line_not_found(line_id)),
        }
    }

    /// Install a confirmed snapshot and remember its ID if it is new.
    fn apply(&self, snapshot: CartSnapshot) -> Arc<CartSnapshot> {
        if let Err(mismatch) = snapshot.verify_total_quantity() {
            warn!(
                cart_id = %snapshot.id,
                reported = mismatch.reported,
                summed = mismatch.summed,
                "Cart total quantity does not match its lines"
            );
        }

        let snapshot = Arc::new(snapshot);
        let previous = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&snapshot));

        if previous.as_ref().map(|p| &p.id) != Some(&snapshot.id) {
            self.persistence.save(&snapshot.id);
        }

        debug!(
            cart_id = %snapshot.id,
            total_quantity = snapshot.total_quantity,
            "Cart updated"
        );
        snapshot
    }
}

impl<G, P> std::fmt::Debug for CartStore<G, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("CartStore")
            .field("cart_id", &snapshot.as_ref().map(|s| s.id.clone()))
            .field("is_open", &self.is_open.load(Ordering::SeqCst))
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
