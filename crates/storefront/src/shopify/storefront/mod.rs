//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` 0.13 for
//! HTTP. Catalog reads are cached using `moka` (5-minute TTL); cart calls
//! always go to the platform.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graphql_client::{GraphQLQuery, PathFragment, Response};
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use reuse_core::{CartId, CartLineId};

use crate::cart::{CartGateway, CartSnapshot};
use crate::config::ShopifyStorefrontConfig;
use crate::error::CartError;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput, Product};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheKey, CacheValue};
use conversions::{convert_cart, convert_product, convert_user_error};
use queries::{
    AddToCart, CartLineInputVariables, CartLineUpdateVariables, CartMutationPayload, CreateCart,
    GetCart, GetProductByHandle, GetProducts, RemoveFromCart, UpdateCartLines, add_to_cart,
    create_cart, get_cart, get_product_by_handle, get_products, remove_from_cart,
    update_cart_lines,
};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);
const BODY_LOG_LIMIT: usize = 500;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides typed access to products and cart operations. Products are
/// cached for 5 minutes. Cheap to clone.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: Url,
    token: AccessToken,
    cache: Cache<CacheKey, CacheValue>,
}

/// Storefront API credential. Each kind travels in its own header.
enum AccessToken {
    Public(String),
    Private(SecretString),
}

impl AccessToken {
    fn from_config(config: &ShopifyStorefrontConfig) -> Self {
        config.storefront_private_token.as_ref().map_or_else(
            || Self::Public(config.storefront_public_token.clone()),
            |token| Self::Private(token.clone()),
        )
    }

    // See: https://shopify.dev/docs/storefronts/headless/building-with-the-storefront-api/getting-started
    fn header(&self) -> (&'static str, &str) {
        match self {
            Self::Public(token) => ("X-Shopify-Storefront-Access-Token", token),
            Self::Private(token) => ("Shopify-Storefront-Private-Token", token.expose_secret()),
        }
    }
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("header", &self.inner.token.header().0)
            .finish_non_exhaustive()
    }
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured store does not form a valid
    /// endpoint or the HTTP client cannot be built.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(config, builder.build()?)
    }

    /// Create a client that sends requests through `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured store does not form a valid
    /// endpoint.
    pub fn with_client(
        config: &ShopifyStorefrontConfig,
        client: reqwest::Client,
    ) -> Result<Self, ShopifyError> {
        let endpoint = config
            .endpoint()
            .map_err(|e| ShopifyError::InvalidData(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint,
                token: AccessToken::from_config(config),
                cache,
            }),
        })
    }

    /// GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);
        let (header, token) = self.inner.token.header();

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header(header, token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        decode_response(status, retry_after, &response_text)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this handle, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };
        let data = self.execute::<GetProductByHandle>(variables).await?;

        let product_data = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;
        let product = convert_product(product_data)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get the first `first` products of the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, first: i64) -> Result<Vec<Product>, ShopifyError> {
        let cache_key = CacheKey::Products { first };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(get_products::Variables { first })
            .await?;

        let products = data
            .products
            .into_nodes()
            .map(convert_product)
            .collect::<Result<Vec<_>, _>>()?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart seeded with `lines`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = create_cart::Variables {
            lines: lines.into_iter().map(line_input).collect(),
        };
        let data = self.execute::<CreateCart>(variables).await?;
        mutation_result(data.cart_create, "create cart")
    }

    /// Get an existing cart. `None` if it expired or never existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };
        let data = self.execute::<GetCart>(variables).await?;
        data.cart.map(convert_cart).transpose()
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines: lines.into_iter().map(line_input).collect(),
        };
        let data = self.execute::<AddToCart>(variables).await?;
        mutation_result(data.cart_lines_add, "add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| CartLineUpdateVariables {
                    id: line.id.into_inner(),
                    quantity: i64::from(line.quantity),
                })
                .collect(),
        };
        let data = self.execute::<UpdateCartLines>(variables).await?;
        mutation_result(data.cart_lines_update, "update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = remove_from_cart::Variables {
            cart_id: cart_id.to_string(),
            line_ids: line_ids.into_iter().map(CartLineId::into_inner).collect(),
        };
        let data = self.execute::<RemoveFromCart>(variables).await?;
        mutation_result(data.cart_lines_remove, "remove from cart")
    }
}

#[async_trait]
impl CartGateway for StorefrontClient {
    async fn create(&self, lines: Vec<CartLineInput>) -> crate::error::Result<CartSnapshot> {
        self.create_cart(lines).await.map_err(CartError::from)
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> crate::error::Result<CartSnapshot> {
        self.add_to_cart(cart_id, lines)
            .await
            .map_err(CartError::from)
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> crate::error::Result<CartSnapshot> {
        self.update_cart(cart_id, updates)
            .await
            .map_err(CartError::from)
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> crate::error::Result<CartSnapshot> {
        self.remove_from_cart(cart_id, line_ids)
            .await
            .map_err(CartError::from)
    }

    async fn fetch(&self, cart_id: &CartId) -> crate::error::Result<Option<CartSnapshot>> {
        self.get_cart(cart_id).await.map_err(CartError::from)
    }
}

// =============================================================================
// Response handling
// =============================================================================

fn line_input(line: CartLineInput) -> CartLineInputVariables {
    CartLineInputVariables {
        merchandise_id: line.merchandise_id.into_inner(),
        quantity: i64::from(line.quantity),
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

fn truncated(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

fn single_error(message: String) -> ShopifyError {
    ShopifyError::GraphQL(vec![GraphQLError {
        message,
        locations: vec![],
        path: vec![],
    }])
}

/// Turn a raw HTTP response into operation data or a `ShopifyError`.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> Result<T, ShopifyError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ShopifyError::RateLimited(retry_after.unwrap_or(1)));
    }

    if !status.is_success() {
        error!(
            status = %status,
            body = %truncated(body, BODY_LOG_LIMIT),
            "Shopify API returned non-success status"
        );
        return Err(single_error(format!(
            "HTTP {status}: {}",
            truncated(body, 200)
        )));
    }

    let response: Response<T> = serde_json::from_str(body).map_err(|e| {
        error!(
            error = %e,
            body = %truncated(body, BODY_LOG_LIMIT),
            "Failed to parse Shopify GraphQL response"
        );
        ShopifyError::Parse(e)
    })?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        debug!(errors = ?errors, "GraphQL errors in response");
        return Err(ShopifyError::GraphQL(
            errors.into_iter().map(convert_graphql_error).collect(),
        ));
    }

    response.data.ok_or_else(|| {
        error!(
            body = %truncated(body, BODY_LOG_LIMIT),
            "Shopify GraphQL response has no data and no errors"
        );
        single_error("No data in response".to_string())
    })
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(s) => serde_json::Value::String(s),
                    PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

/// Unwrap a cart mutation payload.
///
/// User errors win over a returned cart: the platform may return the
/// unchanged cart alongside the rejection.
fn mutation_result(
    payload: Option<CartMutationPayload>,
    action: &str,
) -> Result<CartSnapshot, ShopifyError> {
    let Some(payload) = payload else {
        return Err(single_error(format!("Failed to {action}")));
    };

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserErrors(
            payload
                .user_errors
                .into_iter()
                .map(convert_user_error)
                .collect(),
        ));
    }

    payload.cart.map_or_else(
        || Err(single_error(format!("Failed to {action}"))),
        convert_cart,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use reuse_core::MerchandiseId;

    const CART_PAYLOAD: &str = r#"{
        "cart": {
            "id": "gid://shopify/Cart/c1",
            "checkoutUrl": "https://reuse.myshopify.com/cart/c/c1",
            "totalQuantity": 2,
            "cost": {
                "subtotalAmount": {"amount": "25.0", "currencyCode": "EUR"},
                "totalAmount": {"amount": "25.0", "currencyCode": "EUR"}
            },
            "lines": {"edges": [{"node": {
                "id": "gid://shopify/CartLine/l1",
                "quantity": 2,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/v1",
                    "title": "Default Title",
                    "product": {"handle": "jar", "title": "Jar"},
                    "selectedOptions": []
                },
                "cost": {
                    "amountPerQuantity": {"amount": "12.5", "currencyCode": "EUR"},
                    "totalAmount": {"amount": "25.0", "currencyCode": "EUR"}
                }
            }}]}
        },
        "userErrors": []
    }"#;

    fn config() -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: "reuse.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_public_token: "public-token".to_string(),
            storefront_private_token: None,
            http_timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn test_public_token_header() {
        let token = AccessToken::from_config(&config());
        assert_eq!(
            token.header(),
            ("X-Shopify-Storefront-Access-Token", "public-token")
        );
    }

    #[test]
    fn test_private_token_preferred() {
        let mut config = config();
        config.storefront_private_token = Some(SecretString::from("shpat_private"));
        let token = AccessToken::from_config(&config);
        assert_eq!(
            token.header(),
            ("Shopify-Storefront-Private-Token", "shpat_private")
        );
    }

    #[test]
    fn test_client_endpoint() {
        let client = StorefrontClient::new(&config()).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://reuse.myshopify.com/api/2026-01/graphql.json"
        );
        let debug = format!("{client:?}");
        assert!(!debug.contains("public-token"));
    }

    #[test]
    fn test_client_rejects_bad_store() {
        let mut config = config();
        config.store = "https://reuse.myshopify.com".to_string();
        assert!(matches!(
            StorefrontClient::new(&config),
            Err(ShopifyError::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_data() {
        let body = r#"{"data": {"cart": null}}"#;
        let data: get_cart::ResponseData = decode_response(StatusCode::OK, None, body).unwrap();
        assert!(data.cart.is_none());
    }

    #[test]
    fn test_decode_rate_limited() {
        let err = decode_response::<get_cart::ResponseData>(
            StatusCode::TOO_MANY_REQUESTS,
            Some(4),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(4)));

        let err =
            decode_response::<get_cart::ResponseData>(StatusCode::TOO_MANY_REQUESTS, None, "")
                .unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(1)));
    }

    #[test]
    fn test_decode_server_error() {
        let err = decode_response::<get_cart::ResponseData>(
            StatusCode::BAD_GATEWAY,
            None,
            "upstream down",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "GraphQL errors: HTTP 502 Bad Gateway: upstream down"
        );
    }

    #[test]
    fn test_decode_graphql_errors() {
        let body = r#"{"errors": [{
            "message": "Field 'nope' doesn't exist",
            "locations": [{"line": 2, "column": 3}],
            "path": ["cart", "lines", 0]
        }]}"#;
        let err =
            decode_response::<get_cart::ResponseData>(StatusCode::OK, None, body).unwrap_err();
        let ShopifyError::GraphQL(errors) = err else {
            panic!("expected GraphQL error");
        };
        assert_eq!(errors[0].message, "Field 'nope' doesn't exist");
        assert_eq!(errors[0].locations[0].line, 2);
        assert_eq!(errors[0].path[2], serde_json::json!(0));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_response::<get_cart::ResponseData>(StatusCode::OK, None, "<html>")
            .unwrap_err();
        assert!(matches!(err, ShopifyError::Parse(_)));
    }

    #[test]
    fn test_decode_no_data() {
        let err = decode_response::<get_cart::ResponseData>(StatusCode::OK, None, "{}")
            .unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");
    }

    #[test]
    fn test_mutation_result_cart() {
        let payload: CartMutationPayload = serde_json::from_str(CART_PAYLOAD).unwrap();
        let snapshot = mutation_result(Some(payload), "add to cart").unwrap();
        assert_eq!(snapshot.id, CartId::new("gid://shopify/Cart/c1"));
        assert_eq!(
            snapshot.lines[0].merchandise_id,
            MerchandiseId::new("gid://shopify/ProductVariant/v1")
        );
        assert_eq!(snapshot.total_quantity, 2);
    }

    #[test]
    fn test_mutation_result_user_errors_win() {
        let mut payload: CartMutationPayload = serde_json::from_str(CART_PAYLOAD).unwrap();
        payload.user_errors = serde_json::from_str(
            r#"[{"code": "INVALID", "field": ["lines", "0", "quantity"], "message": "Only 3 left"}]"#,
        )
        .unwrap();

        let err = mutation_result(Some(payload), "update cart").unwrap_err();
        let ShopifyError::UserErrors(errors) = &err else {
            panic!("expected user errors");
        };
        assert_eq!(errors[0].message, "Only 3 left");
        assert_eq!(
            CartError::from(err),
            CartError::ValidationRejected("Only 3 left".to_string())
        );
    }

    #[test]
    fn test_mutation_result_empty_payload() {
        let err = mutation_result(None, "create cart").unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Failed to create cart");

        let payload: CartMutationPayload = serde_json::from_str(r#"{"cart": null}"#).unwrap();
        let err = mutation_result(Some(payload), "create cart").unwrap_err();
        assert!(CartError::from(err).is_retriable());
    }

    #[test]
    fn test_line_input_conversion() {
        let wire = line_input(CartLineInput {
            merchandise_id: MerchandiseId::new("gid://shopify/ProductVariant/v1"),
            quantity: 3,
        });
        assert_eq!(wire.merchandise_id, "gid://shopify/ProductVariant/v1");
        assert_eq!(wire.quantity, 3);
    }
}
