//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw wire
//! structs in `storefront::queries`.

use serde::{Deserialize, Serialize};

use reuse_core::{CartLineId, MerchandiseId, Money, ProductId};

// =============================================================================
// Money Types
// =============================================================================

/// Price range for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

// =============================================================================
// Image Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Product option definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
///
/// The variant ID is what gets added to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: MerchandiseId,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Current price.
    pub price: Money,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
}

/// A product in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// Product type/category.
    #[serde(rename = "product_type")]
    pub kind: String,
    /// Product tags.
    pub tags: Vec<String>,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// All product images.
    pub images: Vec<Image>,
    /// Product options.
    pub options: Vec<ProductOption>,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Find the variant matching every given option name/value pair.
    #[must_use]
    pub fn variant_for_options(&self, selected: &[SelectedOption]) -> Option<&ProductVariant> {
        self.variants.iter().find(|variant| {
            selected.iter().all(|wanted| {
                variant
                    .selected_options
                    .iter()
                    .any(|o| o.name.eq_ignore_ascii_case(&wanted.name) && o.value == wanted.value)
            })
        })
    }

    /// Whether any variant can currently be bought.
    #[must_use]
    pub fn available_for_sale(&self) -> bool {
        self.variants.iter().any(|v| v.available_for_sale)
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: MerchandiseId,
    /// Quantity to add (at least 1).
    pub quantity: u32,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity (at least 1; removals go through `remove_lines`).
    pub quantity: u32,
}

/// User error from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

/// Cart error codes that mean the request named a cart or line the
/// platform no longer knows about.
const STALE_REFERENCE_CODES: &[&str] = &["INVALID_MERCHANDISE_LINE", "CART_DOES_NOT_EXIST"];

impl CartUserError {
    /// Whether this error points at an unknown cart or cart line.
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        if self
            .code
            .as_deref()
            .is_some_and(|code| STALE_REFERENCE_CODES.contains(&code))
        {
            return true;
        }

        let names_identifier = self.field.as_ref().is_some_and(|path| {
            path.iter()
                .any(|segment| matches!(segment.as_str(), "cartId" | "lineIds" | "id"))
        });

        names_identifier && self.code.as_deref().is_none_or(|code| code == "INVALID")
    }
}
