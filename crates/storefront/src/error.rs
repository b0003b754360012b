//! Unified cart error handling with Sentry integration.
//!
//! Every cart operation reports failures as a [`CartError`]. Lower-level
//! [`ShopifyError`]s are normalized into one of three outward kinds, so
//! callers only decide between "retry", "change the request" and "start a
//! fresh cart".

use thiserror::Error;

use crate::shopify::ShopifyError;

/// Error returned by cart store and gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Network or transport failure. Safe to retry the same action.
    #[error("Cart service unavailable: {0}")]
    GatewayUnavailable(String),

    /// The platform rejected the requested state (e.g., no stock left).
    #[error("Rejected by cart service: {0}")]
    ValidationRejected(String),

    /// The request named a cart or line the platform no longer knows.
    #[error("Item not found: {0}")]
    StaleReference(String),

    /// Quantity below 1 where a positive quantity is required.
    #[error("Invalid quantity {0}: must be at least 1")]
    InvalidQuantity(i64),
}

/// Coarse classification of a [`CartError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartErrorKind {
    GatewayUnavailable,
    ValidationRejected,
    StaleReference,
    InvalidQuantity,
}

impl CartError {
    /// Classification without the message.
    #[must_use]
    pub const fn kind(&self) -> CartErrorKind {
        match self {
            Self::GatewayUnavailable(_) => CartErrorKind::GatewayUnavailable,
            Self::ValidationRejected(_) => CartErrorKind::ValidationRejected,
            Self::StaleReference(_) => CartErrorKind::StaleReference,
            Self::InvalidQuantity(_) => CartErrorKind::InvalidQuantity,
        }
    }

    /// Whether repeating the identical request may succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable(_))
    }

    /// Whether the caller should drop its cart ID and start over.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference(_))
    }
}

impl From<ShopifyError> for CartError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UserErrors(errors) => {
                let message = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                if errors.iter().any(crate::shopify::CartUserError::is_stale_reference) {
                    Self::StaleReference(message)
                } else {
                    Self::ValidationRejected(message)
                }
            }
            ShopifyError::NotFound(what) => Self::StaleReference(what),
            other @ (ShopifyError::Http(_)
            | ShopifyError::GraphQL(_)
            | ShopifyError::Parse(_)
            | ShopifyError::RateLimited(_)
            | ShopifyError::InvalidData(_)) => Self::GatewayUnavailable(other.to_string()),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error. Without an initialized Sentry client this is a no-op.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("merchandise_id", "gid://...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shopify::CartUserError;

    fn user_error(code: &str, field: &[&str], message: &str) -> CartUserError {
        CartUserError {
            code: Some(code.to_string()),
            field: Some(field.iter().map(|s| (*s).to_string()).collect()),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_cart_error_display() {
        let err = CartError::StaleReference("gid://shopify/CartLine/l1".to_string());
        assert_eq!(err.to_string(), "Item not found: gid://shopify/CartLine/l1");

        let err = CartError::InvalidQuantity(0);
        assert_eq!(err.to_string(), "Invalid quantity 0: must be at least 1");
    }

    #[test]
    fn test_stock_user_error_is_validation() {
        let err = CartError::from(ShopifyError::UserErrors(vec![user_error(
            "MERCHANDISE_OUT_OF_STOCK",
            &["lines", "0", "merchandiseId"],
            "Sold out",
        )]));
        assert_eq!(err, CartError::ValidationRejected("Sold out".to_string()));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_unknown_cart_user_error_is_stale() {
        let err = CartError::from(ShopifyError::UserErrors(vec![user_error(
            "INVALID",
            &["cartId"],
            "The specified cart does not exist.",
        )]));
        assert_eq!(err.kind(), CartErrorKind::StaleReference);
        assert!(err.is_stale());
    }

    #[test]
    fn test_transport_errors_are_unavailable() {
        let err = CartError::from(ShopifyError::RateLimited(2));
        assert_eq!(err.kind(), CartErrorKind::GatewayUnavailable);
        assert!(err.is_retriable());

        let err = CartError::from(ShopifyError::GraphQL(vec![]));
        assert_eq!(err.kind(), CartErrorKind::GatewayUnavailable);
    }

    #[test]
    fn test_not_found_is_stale() {
        let err = CartError::from(ShopifyError::NotFound("Cart not found: c1".to_string()));
        assert_eq!(err, CartError::StaleReference("Cart not found: c1".to_string()));
    }
}
