//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] so the
//! client can execute it generically. Response structs mirror the selection
//! sets below; every cart operation selects the full `CartFields` fragment,
//! so a mutation always returns the complete cart rather than a diff.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Selection set shared by every cart query and mutation.
///
/// Only the first 100 lines are selected. Lines beyond that never reach the
/// snapshot, so `clear()` leaves them behind and the total quantity check
/// reports a mismatch.
macro_rules! cart_fields_fragment {
    () => {
        r"
fragment MoneyFields on MoneyV2 {
  amount
  currencyCode
}

fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { ...MoneyFields }
    totalAmount { ...MoneyFields }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        merchandise {
          ... on ProductVariant {
            id
            title
            product { handle title }
            selectedOptions { name value }
            image { url altText width height }
          }
        }
        cost {
          amountPerQuantity { ...MoneyFields }
          totalAmount { ...MoneyFields }
        }
      }
    }
  }
}
"
    };
}

/// User error selection, only for mutations.
macro_rules! cart_user_error_fragment {
    () => {
        r"
fragment CartUserErrorFields on CartUserError {
  code
  field
  message
}
"
    };
}

/// Selection set shared by product queries.
macro_rules! product_fields_fragment {
    () => {
        r"
fragment ProductMoneyFields on MoneyV2 {
  amount
  currencyCode
}

fragment ProductFields on Product {
  id
  handle
  title
  description
  productType
  tags
  options { name values }
  priceRange {
    minVariantPrice { ...ProductMoneyFields }
    maxVariantPrice { ...ProductMoneyFields }
  }
  images(first: 10) {
    edges { node { url altText width height } }
  }
  variants(first: 50) {
    edges {
      node {
        id
        title
        availableForSale
        price { ...ProductMoneyFields }
        selectedOptions { name value }
        image { url altText width height }
      }
    }
  }
}
"
    };
}

/// Implement [`GraphQLQuery`] for a hand-written operation.
macro_rules! graphql_operation {
    ($name:ident, $operation:literal, $variables:ty, $data:ty, $document:expr) => {
        impl GraphQLQuery for $name {
            type Variables = $variables;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: $operation,
                }
            }
        }
    };
}

// =============================================================================
// Shared Wire Types
// =============================================================================

/// `MoneyV2` as returned on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFields {
    pub amount: String,
    pub currency_code: String,
}

/// Relay-style connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

/// Relay-style edge.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    /// Unwrap the edges into their nodes, keeping order.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionFields {
    pub name: String,
    pub value: String,
}

// =============================================================================
// Cart Wire Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: Option<String>,
    pub total_quantity: i64,
    pub cost: CartCostFields,
    pub lines: Connection<CartLineFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyFields,
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    pub merchandise: CartMerchandiseFields,
    pub cost: CartLineCostFields,
}

/// Merchandise on a line. Only `ProductVariant` exists today; the fields
/// default so an unknown merchandise type still decodes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartMerchandiseFields {
    pub id: Option<String>,
    pub title: Option<String>,
    pub product: Option<CartMerchandiseProductFields>,
    pub selected_options: Vec<SelectedOptionFields>,
    pub image: Option<ImageFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartMerchandiseProductFields {
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostFields {
    pub amount_per_quantity: MoneyFields,
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUserErrorFields {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    #[serde(default)]
    pub user_errors: Vec<CartUserErrorFields>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInputVariables {
    pub merchandise_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateVariables {
    pub id: String,
    pub quantity: i64,
}

// =============================================================================
// Cart Operations
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use super::{CartLineInputVariables, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub lines: Vec<CartLineInputVariables>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

graphql_operation!(
    CreateCart,
    "CreateCart",
    create_cart::Variables,
    create_cart::ResponseData,
    concat!(
        cart_fields_fragment!(),
        cart_user_error_fragment!(),
        r"
mutation CreateCart($lines: [CartLineInput!]) {
  cartCreate(input: { lines: $lines }) {
    cart { ...CartFields }
    userErrors { ...CartUserErrorFields }
  }
}
"
    )
);

pub struct GetCart;

pub mod get_cart {
    use super::{CartFields, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

graphql_operation!(
    GetCart,
    "GetCart",
    get_cart::Variables,
    get_cart::ResponseData,
    concat!(
        cart_fields_fragment!(),
        r"
query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
"
    )
);

pub struct AddToCart;

pub mod add_to_cart {
    use super::{CartLineInputVariables, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInputVariables>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

graphql_operation!(
    AddToCart,
    "AddToCart",
    add_to_cart::Variables,
    add_to_cart::ResponseData,
    concat!(
        cart_fields_fragment!(),
        cart_user_error_fragment!(),
        r"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { ...CartUserErrorFields }
  }
}
"
    )
);

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use super::{CartLineUpdateVariables, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateVariables>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

graphql_operation!(
    UpdateCartLines,
    "UpdateCartLines",
    update_cart_lines::Variables,
    update_cart_lines::ResponseData,
    concat!(
        cart_fields_fragment!(),
        cart_user_error_fragment!(),
        r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { ...CartUserErrorFields }
  }
}
"
    )
);

pub struct RemoveFromCart;

pub mod remove_from_cart {
    use super::{CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

graphql_operation!(
    RemoveFromCart,
    "RemoveFromCart",
    remove_from_cart::Variables,
    remove_from_cart::ResponseData,
    concat!(
        cart_fields_fragment!(),
        cart_user_error_fragment!(),
        r"
mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { ...CartUserErrorFields }
  }
}
"
    )
);

// =============================================================================
// Product Wire Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub options: Vec<ProductOptionFields>,
    pub price_range: PriceRangeFields,
    pub images: Connection<ImageFields>,
    pub variants: Connection<ProductVariantFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductOptionFields {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeFields {
    pub min_variant_price: MoneyFields,
    pub max_variant_price: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantFields {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: MoneyFields,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionFields>,
    pub image: Option<ImageFields>,
}

// =============================================================================
// Product Operations
// =============================================================================

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Deserialize, ProductFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductFields>,
    }
}

graphql_operation!(
    GetProductByHandle,
    "GetProductByHandle",
    get_product_by_handle::Variables,
    get_product_by_handle::ResponseData,
    concat!(
        product_fields_fragment!(),
        r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}
"
    )
);

pub struct GetProducts;

pub mod get_products {
    use super::{Connection, Deserialize, ProductFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductFields>,
    }
}

graphql_operation!(
    GetProducts,
    "GetProducts",
    get_products::Variables,
    get_products::ResponseData,
    concat!(
        product_fields_fragment!(),
        r"
query GetProducts($first: Int!) {
  products(first: $first) {
    edges { node { ...ProductFields } }
  }
}
"
    )
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_shape() {
        let body = AddToCart::build_query(add_to_cart::Variables {
            cart_id: "gid://shopify/Cart/c1".to_string(),
            lines: vec![CartLineInputVariables {
                merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
                quantity: 2,
            }],
        });

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "AddToCart");
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/c1");
        assert_eq!(
            json["variables"]["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/1"
        );
        assert_eq!(json["variables"]["lines"][0]["quantity"], 2);
    }

    #[test]
    fn test_documents_include_fragments() {
        let body = RemoveFromCart::build_query(remove_from_cart::Variables {
            cart_id: "c1".to_string(),
            line_ids: vec!["l1".to_string()],
        });
        assert!(body.query.contains("fragment CartFields on Cart"));
        assert!(body.query.contains("cartLinesRemove"));
        assert!(body.query.contains("fragment CartUserErrorFields"));

        // Unused fragments fail validation, so queries leave this one out.
        let body = GetCart::build_query(get_cart::Variables {
            cart_id: "c1".to_string(),
        });
        assert!(!body.query.contains("CartUserErrorFields"));

        let body = GetProducts::build_query(get_products::Variables { first: 50 });
        assert!(body.query.contains("fragment ProductFields on Product"));
    }

    #[test]
    fn test_mutation_payload_without_user_errors_field() {
        let data: create_cart::ResponseData =
            serde_json::from_str(r#"{"cartCreate": {"cart": null}}"#).unwrap();
        let payload = data.cart_create.unwrap();
        assert!(payload.cart.is_none());
        assert!(payload.user_errors.is_empty());
    }
}
