//! Newtype IDs for type-safe references to remote commerce entities.
//!
//! The commerce platform hands out opaque string identifiers (Shopify GIDs
//! such as `gid://shopify/Cart/abc?key=def`). Use the `define_id!` macro to
//! create wrappers that prevent accidentally passing a line ID where a
//! variant ID is expected.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use reuse_core::define_id;
/// define_id!(LineId);
/// define_id!(VariantId);
///
/// let line = LineId::new("gid://shopify/CartLine/1");
/// let variant = VariantId::new("gid://shopify/ProductVariant/1");
///
/// // These are different types, so this won't compile:
/// // let _: LineId = variant;
/// assert_eq!(line.as_str(), "gid://shopify/CartLine/1");
/// # let _ = variant;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw identifier.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Remote entity IDs
define_id!(CartId);
define_id!(CartLineId);
define_id!(MerchandiseId);
define_id!(ProductId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_raw_value() {
        let id = CartId::new("gid://shopify/Cart/c1");
        assert_eq!(id.to_string(), "gid://shopify/Cart/c1");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = CartLineId::new("l1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"l1\"");

        let back: CartLineId = serde_json::from_str("\"l1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_conversions() {
        let id: MerchandiseId = "variant-A".into();
        assert_eq!(id.as_str(), "variant-A");
        let raw: String = id.into();
        assert_eq!(raw, "variant-A");
    }
}
