//! Cart commands.
//!
//! Every command except `forget` starts by rehydrating the remembered cart,
//! so the cart survives between invocations.

use reuse_core::{CartLineId, MerchandiseId};
use reuse_storefront::cart::{CartSnapshot, CartStore, FilePersistence};
use reuse_storefront::error::CartError;
use reuse_storefront::shopify::StorefrontClient;

/// Store as used by the CLI.
pub type Store = CartStore<StorefrontClient, FilePersistence>;

/// Print the current cart.
pub fn show(store: &Store) {
    match store.snapshot() {
        Some(snapshot) => print_cart(&snapshot),
        None => print_empty(),
    }
}

/// Add a variant and print the resulting cart.
pub async fn add(store: &Store, variant: MerchandiseId, quantity: i64) -> Result<(), CartError> {
    let snapshot = store
        .add_item(variant, quantity)
        .await
        .inspect_err(hint_if_stale)?;
    print_cart(&snapshot);
    Ok(())
}

/// Remove a line and print the resulting cart.
pub async fn remove(store: &Store, line: &CartLineId) -> Result<(), CartError> {
    let snapshot = store.remove_item(line).await.inspect_err(hint_if_stale)?;
    print_cart(&snapshot);
    Ok(())
}

/// Set a line's quantity and print the resulting cart.
pub async fn set(store: &Store, line: &CartLineId, quantity: i64) -> Result<(), CartError> {
    let snapshot = store
        .set_quantity(line, quantity)
        .await
        .inspect_err(hint_if_stale)?;
    print_cart(&snapshot);
    Ok(())
}

/// Empty the cart.
pub async fn clear(store: &Store) -> Result<(), CartError> {
    match store.clear().await.inspect_err(hint_if_stale)? {
        Some(snapshot) => print_cart(&snapshot),
        None => print_empty(),
    }
    Ok(())
}

/// Print the checkout URL.
///
/// # Errors
///
/// Returns `ValidationRejected` when there is nothing to check out.
#[allow(clippy::print_stdout)]
pub fn checkout(store: &Store) -> Result<(), CartError> {
    let url = store.checkout_url().ok_or_else(|| {
        CartError::ValidationRejected("cart is empty, nothing to check out".to_string())
    })?;
    println!("{url}");
    Ok(())
}

/// Forget the remembered cart without touching the remote one.
#[allow(clippy::print_stdout)]
pub fn forget(store: &Store) {
    store.discard();
    println!("Forgot saved cart");
}

fn hint_if_stale(error: &CartError) {
    if error.is_stale() {
        tracing::warn!("The saved cart may have expired; `reuse-cart forget` starts a new one");
    }
}

#[allow(clippy::print_stdout)]
fn print_empty() {
    println!("Cart is empty");
}

#[allow(clippy::print_stdout)]
fn print_cart(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        print_empty();
        return;
    }

    println!("Cart {}", snapshot.id);
    for line in &snapshot.lines {
        let title = line.variant_title().map_or_else(
            || line.product_title.clone(),
            |variant| format!("{} ({variant})", line.product_title),
        );
        println!(
            "  {:>3} x {title:<40} {:>10}  [{}]",
            line.quantity,
            line.line_total.display(),
            line.id
        );
    }
    println!("  {} item(s), subtotal {}", snapshot.total_quantity, snapshot.subtotal.display());
}
