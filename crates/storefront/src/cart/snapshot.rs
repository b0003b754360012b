//! Cart snapshot types.
//!
//! A [`CartSnapshot`] is the complete cart as last confirmed by the commerce
//! platform. The store replaces it wholesale after every successful call and
//! never edits one in place.

use serde::{Deserialize, Serialize};

use reuse_core::{CartId, CartLineId, MerchandiseId, Money};

use crate::shopify::types::SelectedOption;

/// One merchandise selection within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line ID, unique within this snapshot only.
    pub id: CartLineId,
    /// Variant this line buys.
    pub merchandise_id: MerchandiseId,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Variant title ("Default Title" for single-variant products).
    pub title: String,
    /// Parent product title.
    pub product_title: String,
    /// Parent product handle.
    pub product_handle: String,
    /// Chosen option values, for display.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image URL.
    pub image_url: Option<String>,
    /// Unit price as of the last confirmation.
    pub unit_price: Money,
    /// Line total as of the last confirmation.
    pub line_total: Money,
}

impl CartLine {
    /// Variant title suitable for display, hiding Shopify's placeholder.
    #[must_use]
    pub fn variant_title(&self) -> Option<&str> {
        if self.title.is_empty() || self.title == "Default Title" {
            None
        } else {
            Some(&self.title)
        }
    }
}

/// A complete cart as returned by the remote gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Remote cart ID, stable for the cart's lifetime.
    pub id: CartId,
    /// Lines in remote insertion order.
    pub lines: Vec<CartLine>,
    /// Sum of line quantities as reported by the platform.
    pub total_quantity: u32,
    /// Subtotal before taxes and shipping.
    pub subtotal: Money,
    /// Estimated total.
    pub total: Money,
    /// Checkout hand-off URL; may be absent until the cart has lines.
    pub checkout_url: Option<String>,
}

/// Reported total disagrees with the lines it summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityMismatch {
    /// `total_quantity` as reported.
    pub reported: u32,
    /// Sum of `lines[].quantity`.
    pub summed: u64,
}

impl CartSnapshot {
    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, line_id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == line_id)
    }

    /// Whether `line_id` belongs to this snapshot.
    #[must_use]
    pub fn contains_line(&self, line_id: &CartLineId) -> bool {
        self.line(line_id).is_some()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn summed_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Check `total_quantity` against the lines.
    ///
    /// # Errors
    ///
    /// Returns the mismatch when the reported total differs from the sum.
    pub fn verify_total_quantity(&self) -> Result<(), QuantityMismatch> {
        let summed = self.summed_quantity();
        if u64::from(self.total_quantity) == summed {
            Ok(())
        } else {
            Err(QuantityMismatch {
                reported: self.total_quantity,
                summed,
            })
        }
    }

    /// Checkout URL, only once there is something to check out.
    #[must_use]
    pub fn checkout_url(&self) -> Option<&str> {
        if self.is_empty() {
            None
        } else {
            self.checkout_url.as_deref()
        }
    }
}
