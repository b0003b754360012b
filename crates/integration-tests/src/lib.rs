//! Integration tests for the Reuse storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p reuse-integration-tests
//! ```
//!
//! The tests drive a real [`CartStore`](reuse_storefront::cart::CartStore)
//! against [`FakeShop`], an in-memory stand-in for the Storefront API that
//! keeps carts, consolidates lines per variant, enforces stock and can be
//! told to fail or to forget carts.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use reuse_core::{CartId, CartLineId, CurrencyCode, MerchandiseId, Money};
use reuse_storefront::cart::{CartGateway, CartLine, CartSnapshot};
use reuse_storefront::error::{CartError, Result};
use reuse_storefront::shopify::{CartLineInput, CartLineUpdateInput};

/// One gateway call as seen by the fake shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create,
    AddLines(CartId),
    UpdateLines(CartId),
    RemoveLines(CartId),
    Fetch(CartId),
}

#[derive(Debug, Clone)]
struct Variant {
    title: String,
    unit_price: Decimal,
    stock: Option<u32>,
}

#[derive(Debug, Clone)]
struct StoredLine {
    id: CartLineId,
    merchandise_id: MerchandiseId,
    quantity: u32,
}

#[derive(Debug, Default)]
struct ShopState {
    variants: HashMap<MerchandiseId, Variant>,
    carts: HashMap<CartId, Vec<StoredLine>>,
    next_id: u64,
    calls: Vec<GatewayCall>,
    failures: VecDeque<CartError>,
    misreport_total: bool,
}

/// In-memory commerce platform implementing [`CartGateway`].
#[derive(Debug, Default)]
pub struct FakeShop {
    state: Mutex<ShopState>,
}

impl FakeShop {
    /// Empty catalog, no carts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a purchasable variant. `stock` of `None` means unlimited.
    #[must_use]
    pub fn with_variant(self, id: &str, title: &str, cents: i64, stock: Option<u32>) -> Self {
        self.lock().variants.insert(
            MerchandiseId::new(id),
            Variant {
                title: title.to_string(),
                unit_price: Decimal::new(cents, 2),
                stock,
            },
        );
        self
    }

    /// Fail the next gateway call with `error` instead of serving it.
    pub fn fail_next(&self, error: CartError) {
        self.lock().failures.push_back(error);
    }

    /// Report a `total_quantity` one higher than the lines add up to.
    pub fn misreport_totals(&self) {
        self.lock().misreport_total = true;
    }

    /// Purge a cart, as the platform does when carts expire.
    pub fn expire(&self, cart_id: &CartId) {
        self.lock().carts.remove(cart_id);
    }

    /// The platform's current view of a cart.
    #[must_use]
    pub fn remote_cart(&self, cart_id: &CartId) -> Option<CartSnapshot> {
        let state = self.lock();
        state
            .carts
            .get(cart_id)
            .map(|lines| state.snapshot(cart_id, lines))
    }

    /// Number of carts the platform currently holds.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.lock().carts.len()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ShopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and pop an injected failure, if any.
    fn begin(&self, call: GatewayCall) -> Result<MutexGuard<'_, ShopState>> {
        let mut state = self.lock();
        state.calls.push(call);
        let failure = state.failures.pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl ShopState {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("gid://shopify/{kind}/{}", self.next_id)
    }

    fn variant(&self, id: &MerchandiseId) -> Result<&Variant> {
        self.variants
            .get(id)
            .ok_or_else(|| {
                CartError::ValidationRejected(format!("The merchandise {id} does not exist."))
            })
    }

    fn check_stock(&self, id: &MerchandiseId, quantity: u32) -> Result<()> {
        let variant = self.variant(id)?;
        match variant.stock {
            Some(stock) if quantity > stock => Err(CartError::ValidationRejected(format!(
                "Only {stock} items were added to your cart due to availability."
            ))),
            _ => Ok(()),
        }
    }

    fn cart_mut(&mut self, cart_id: &CartId) -> Result<&mut Vec<StoredLine>> {
        self.carts
            .get_mut(cart_id)
            .ok_or_else(|| {
                CartError::StaleReference(format!("The specified cart does not exist: {cart_id}"))
            })
    }

    /// Merge `lines` into `existing`, one line per variant.
    fn merged(
        &mut self,
        existing: &[StoredLine],
        lines: Vec<CartLineInput>,
    ) -> Result<Vec<StoredLine>> {
        let mut merged = existing.to_vec();
        for input in lines {
            if let Some(line) = merged
                .iter_mut()
                .find(|line| line.merchandise_id == input.merchandise_id)
            {
                line.quantity += input.quantity;
            } else {
                merged.push(StoredLine {
                    id: CartLineId::new(self.next_id("CartLine")),
                    merchandise_id: input.merchandise_id,
                    quantity: input.quantity,
                });
            }
        }
        for line in &merged {
            self.check_stock(&line.merchandise_id, line.quantity)?;
        }
        Ok(merged)
    }

    fn snapshot(&self, cart_id: &CartId, lines: &[StoredLine]) -> CartSnapshot {
        let lines: Vec<CartLine> = lines
            .iter()
            .map(|line| {
                let (title, unit_price) = self.variants.get(&line.merchandise_id).map_or_else(
                    || ("Unknown".to_string(), Decimal::ZERO),
                    |v| (v.title.clone(), v.unit_price),
                );
                CartLine {
                    id: line.id.clone(),
                    merchandise_id: line.merchandise_id.clone(),
                    quantity: line.quantity,
                    title: "Default Title".to_string(),
                    product_title: title.clone(),
                    product_handle: title.to_lowercase().replace(' ', "-"),
                    selected_options: vec![],
                    image_url: None,
                    unit_price: Money::new(unit_price, CurrencyCode::EUR),
                    line_total: Money::new(
                        unit_price * Decimal::from(line.quantity),
                        CurrencyCode::EUR,
                    ),
                }
            })
            .collect();

        let subtotal: Decimal = lines.iter().map(|line| line.line_total.amount).sum();
        let mut total_quantity: u32 = lines.iter().map(|line| line.quantity).sum();
        if self.misreport_total {
            total_quantity += 1;
        }

        CartSnapshot {
            id: cart_id.clone(),
            lines,
            total_quantity,
            subtotal: Money::new(subtotal, CurrencyCode::EUR),
            total: Money::new(subtotal, CurrencyCode::EUR),
            checkout_url: Some(format!("https://reuse.example/checkouts/{cart_id}")),
        }
    }
}

#[async_trait]
impl CartGateway for FakeShop {
    async fn create(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot> {
        let mut state = self.begin(GatewayCall::Create)?;
        let lines = state.merged(&[], lines)?;
        let cart_id = CartId::new(state.next_id("Cart"));
        let snapshot = state.snapshot(&cart_id, &lines);
        state.carts.insert(cart_id, lines);
        Ok(snapshot)
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<CartSnapshot> {
        let mut state = self.begin(GatewayCall::AddLines(cart_id.clone()))?;
        let existing = state.cart_mut(cart_id)?.clone();
        let merged = state.merged(&existing, lines)?;
        let snapshot = state.snapshot(cart_id, &merged);
        *state.cart_mut(cart_id)? = merged;
        Ok(snapshot)
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot> {
        let mut state = self.begin(GatewayCall::UpdateLines(cart_id.clone()))?;
        let mut lines = state.cart_mut(cart_id)?.clone();
        for update in updates {
            let line = lines
                .iter_mut()
                .find(|line| line.id == update.id)
                .ok_or_else(|| {
                    CartError::StaleReference(format!(
                        "The merchandise line {} does not exist.",
                        update.id
                    ))
                })?;
            line.quantity = update.quantity;
        }
        for line in &lines {
            state.check_stock(&line.merchandise_id, line.quantity)?;
        }
        let snapshot = state.snapshot(cart_id, &lines);
        *state.cart_mut(cart_id)? = lines;
        Ok(snapshot)
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<CartSnapshot> {
        let mut state = self.begin(GatewayCall::RemoveLines(cart_id.clone()))?;
        let mut lines = state.cart_mut(cart_id)?.clone();
        for line_id in line_ids {
            let before = lines.len();
            lines.retain(|line| line.id != line_id);
            if lines.len() == before {
                return Err(CartError::StaleReference(format!(
                    "The merchandise line {line_id} does not exist."
                )));
            }
        }
        let snapshot = state.snapshot(cart_id, &lines);
        *state.cart_mut(cart_id)? = lines;
        Ok(snapshot)
    }

    async fn fetch(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>> {
        let state = self.begin(GatewayCall::Fetch(cart_id.clone()))?;
        Ok(state
            .carts
            .get(cart_id)
            .map(|lines| state.snapshot(cart_id, lines)))
    }
}
