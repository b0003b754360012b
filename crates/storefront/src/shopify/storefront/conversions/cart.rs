//! Cart type conversion functions.

use tracing::warn;

use reuse_core::{CartId, CartLineId, MerchandiseId, Money};

use crate::cart::{CartLine, CartSnapshot};
use crate::shopify::ShopifyError;
use crate::shopify::types::{CartUserError, SelectedOption};

use super::super::queries::{CartFields, CartLineFields, CartUserErrorFields, MoneyFields};

/// Convert a wire money value.
pub fn convert_money(money: MoneyFields) -> Result<Money, ShopifyError> {
    Money::parse(&money.amount, &money.currency_code)
        .map_err(|e| ShopifyError::InvalidData(e.to_string()))
}

/// Convert the `CartFields` selection into a snapshot.
///
/// Lines keep the platform's order. Lines with a non-positive quantity or
/// without merchandise are dropped with a warning, since the store never
/// holds such a line.
pub fn convert_cart(cart: CartFields) -> Result<CartSnapshot, ShopifyError> {
    let total_quantity = u32::try_from(cart.total_quantity).map_err(|_| {
        ShopifyError::InvalidData(format!("negative total quantity {}", cart.total_quantity))
    })?;

    let mut lines = Vec::with_capacity(cart.lines.edges.len());
    for node in cart.lines.into_nodes() {
        if let Some(line) = convert_cart_line(node)? {
            lines.push(line);
        }
    }

    Ok(CartSnapshot {
        id: CartId::new(cart.id),
        lines,
        total_quantity,
        subtotal: convert_money(cart.cost.subtotal_amount)?,
        total: convert_money(cart.cost.total_amount)?,
        checkout_url: cart.checkout_url.filter(|url| !url.is_empty()),
    })
}

fn convert_cart_line(line: CartLineFields) -> Result<Option<CartLine>, ShopifyError> {
    let Ok(quantity) = u32::try_from(line.quantity) else {
        warn!(
            line_id = %line.id,
            quantity = line.quantity,
            "Dropping cart line with negative quantity"
        );
        return Ok(None);
    };
    if quantity == 0 {
        warn!(line_id = %line.id, "Dropping cart line with zero quantity");
        return Ok(None);
    }

    let merchandise = line.merchandise;
    let Some(merchandise_id) = merchandise.id else {
        warn!(line_id = %line.id, "Cart line merchandise is not a product variant");
        return Ok(None);
    };

    let (product_handle, product_title) = merchandise
        .product
        .map(|p| (p.handle, p.title))
        .unwrap_or_default();

    Ok(Some(CartLine {
        id: CartLineId::new(line.id),
        merchandise_id: MerchandiseId::new(merchandise_id),
        quantity,
        title: merchandise.title.unwrap_or_default(),
        product_title,
        product_handle,
        selected_options: merchandise
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image_url: merchandise.image.map(|img| img.url),
        unit_price: convert_money(line.cost.amount_per_quantity)?,
        line_total: convert_money(line.cost.total_amount)?,
    }))
}

// =============================================================================
// User Error Conversions
// =============================================================================

pub fn convert_user_error(error: CartUserErrorFields) -> CartUserError {
    CartUserError {
        code: error.code,
        field: error.field,
        message: error.message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use reuse_core::CurrencyCode;
    use rust_decimal::Decimal;

    const CART_JSON: &str = r#"{
        "id": "gid://shopify/Cart/c1?key=k",
        "checkoutUrl": "https://reuse.example/cart/c/c1",
        "totalQuantity": 3,
        "cost": {
            "subtotalAmount": {"amount": "90.0", "currencyCode": "EUR"},
            "totalAmount": {"amount": "95.5", "currencyCode": "EUR"}
        },
        "lines": {"edges": [
            {"node": {
                "id": "gid://shopify/CartLine/l1",
                "quantity": 2,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/v1",
                    "title": "M / Black",
                    "product": {"handle": "hoodie", "title": "Hoodie"},
                    "selectedOptions": [
                        {"name": "Size", "value": "M"},
                        {"name": "Color", "value": "Black"}
                    ],
                    "image": {"url": "https://cdn.example/h.jpg", "altText": null, "width": 800, "height": 800}
                },
                "cost": {
                    "amountPerQuantity": {"amount": "30.0", "currencyCode": "EUR"},
                    "totalAmount": {"amount": "60.0", "currencyCode": "EUR"}
                }
            }},
            {"node": {
                "id": "gid://shopify/CartLine/l2",
                "quantity": 1,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/v2",
                    "title": "Default Title",
                    "product": {"handle": "tote", "title": "Tote"},
                    "selectedOptions": [],
                    "image": null
                },
                "cost": {
                    "amountPerQuantity": {"amount": "30.0", "currencyCode": "EUR"},
                    "totalAmount": {"amount": "30.0", "currencyCode": "EUR"}
                }
            }}
        ]}
    }"#;

    #[test]
    fn test_convert_cart() {
        let fields: CartFields = serde_json::from_str(CART_JSON).unwrap();
        let cart = convert_cart(fields).unwrap();

        assert_eq!(cart.id.as_str(), "gid://shopify/Cart/c1?key=k");
        assert_eq!(cart.total_quantity, 3);
        assert_eq!(cart.subtotal, Money::new(Decimal::new(90, 0), CurrencyCode::EUR));
        assert_eq!(cart.checkout_url(), Some("https://reuse.example/cart/c/c1"));

        let ids: Vec<&str> = cart.lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["gid://shopify/CartLine/l1", "gid://shopify/CartLine/l2"]);

        let first = &cart.lines[0];
        assert_eq!(first.merchandise_id.as_str(), "gid://shopify/ProductVariant/v1");
        assert_eq!(first.quantity, 2);
        assert_eq!(first.selected_options.len(), 2);
        assert_eq!(first.image_url.as_deref(), Some("https://cdn.example/h.jpg"));
        assert_eq!(first.line_total.display(), "€60.00");
        assert_eq!(cart.verify_total_quantity(), Ok(()));
    }

    #[test]
    fn test_convert_cart_drops_zero_quantity_lines() {
        let json = CART_JSON.replacen("\"quantity\": 1", "\"quantity\": 0", 1);
        let fields: CartFields = serde_json::from_str(&json).unwrap();
        let cart = convert_cart(fields).unwrap();
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_convert_cart_rejects_unknown_currency() {
        let json = CART_JSON.replacen("\"EUR\"", "\"XTS\"", 1);
        let fields: CartFields = serde_json::from_str(&json).unwrap();
        let err = convert_cart(fields).unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidData(_)));
    }

    #[test]
    fn test_empty_checkout_url_is_absent() {
        let json = CART_JSON.replace("https://reuse.example/cart/c/c1", "");
        let fields: CartFields = serde_json::from_str(&json).unwrap();
        let cart = convert_cart(fields).unwrap();
        assert_eq!(cart.checkout_url, None);
    }
}
