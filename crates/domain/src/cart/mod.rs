//! Shopping cart aggregate.
//!
//! One cart per user, keyed by the user's id. Each line snapshots the
//! product's price when it is first added; later price changes on the product
//! do not affect the line. The cart total is always recomputed from the lines.

mod service;

pub use service::{CartLineView, CartService, CartView};

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::Entity;
use crate::value_objects::{Money, ProductId, UserId};

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A merchant tried to buy their own listing.
    #[error("You cannot add your own products to cart")]
    OwnProduct,

    /// Quantity below one or too large.
    #[error("Quantity must be greater than 0")]
    InvalidQuantity { quantity: i64 },

    /// The cart has no line for the product.
    #[error("Item not found in cart")]
    LineNotFound { product_id: ProductId },

    /// The lines would total more than a money amount can hold.
    #[error("Cart total is too large")]
    TotalTooLarge,
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_time: Money,
}

impl CartLine {
    /// Price snapshot times quantity.
    pub fn line_total(&self) -> Money {
        self.price_at_time.saturating_multiply(self.quantity)
    }
}

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    items: Vec<CartLine>,
    total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            items: Vec::new(),
            total_amount: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the lines.
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// Returns the stored total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the line for a product, if any.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|l| l.product_id == product_id)
    }

    /// Adds units of a product.
    ///
    /// An existing line is incremented and keeps its original price snapshot;
    /// otherwise a new line is created at `current_price`.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        current_price: Money,
    ) -> Result<(), CartError> {
        let quantity = positive_quantity(quantity)?;

        let mut items = self.items.clone();
        match items.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::InvalidQuantity {
                        quantity: i64::from(quantity),
                    })?;
            }
            None => items.push(CartLine {
                product_id,
                quantity,
                price_at_time: current_price,
            }),
        }

        self.commit(items)
    }

    /// Removes a product's line. Removing an absent line is a no-op.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|l| l.product_id != product_id);
        self.recalculate();
    }

    /// Sets a line's quantity. The price snapshot is unchanged.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        let quantity = positive_quantity(quantity)?;

        let mut items = self.items.clone();
        let line = items
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::LineNotFound { product_id })?;
        line.quantity = quantity;

        self.commit(items)
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate();
    }

    /// Replaces the lines if their total fits, leaving the cart untouched
    /// otherwise.
    fn commit(&mut self, items: Vec<CartLine>) -> Result<(), CartError> {
        let total = items
            .iter()
            .try_fold(Money::zero(), |acc, line| {
                acc.checked_add(line.price_at_time.checked_multiply(line.quantity)?)
            })
            .ok_or(CartError::TotalTooLarge)?;

        self.items = items;
        self.total_amount = total;
        self.updated_at = Utc::now();
        Ok(())
    }

    // Removing lines only shrinks a total that already fit.
    fn recalculate(&mut self) {
        self.total_amount = self.items.iter().map(CartLine::line_total).sum();
        self.updated_at = Utc::now();
    }
}

impl Entity for Cart {
    const COLLECTION: &'static str = "carts";
    const NAME: &'static str = "Cart";

    fn document_id(&self) -> DocumentId {
        self.user_id.into()
    }
}

/// Validates a requested quantity (>= 1, fits in u32).
pub(crate) fn positive_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity { quantity });
    }
    u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity { quantity })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_total_consistent(cart: &Cart) {
        let expected: Money = cart.items().iter().map(CartLine::line_total).sum();
        assert_eq!(cart.total_amount(), expected);
    }

    #[test]
    fn add_creates_line_with_price_snapshot() {
        let mut cart = Cart::new(UserId::new());
        let p = ProductId::new();

        cart.add(p, 2, Money::from_cents(2000)).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_amount(), Money::from_cents(4000));
        assert_total_consistent(&cart);
    }

    #[test]
    fn add_existing_line_keeps_original_price() {
        let mut cart = Cart::new(UserId::new());
        let p = ProductId::new();

        cart.add(p, 1, Money::from_cents(1000)).unwrap();
        cart.add(p, 2, Money::from_cents(9999)).unwrap();

        let line = cart.line(p).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.price_at_time, Money::from_cents(1000));
        assert_eq!(cart.total_amount(), Money::from_cents(3000));
    }

    #[test]
    fn add_rejects_non_positive_quantity() {
        let mut cart = Cart::new(UserId::new());

        assert!(matches!(
            cart.add(ProductId::new(), 0, Money::from_cents(100)),
            Err(CartError::InvalidQuantity { quantity: 0 })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_absent_line_is_noop() {
        let mut cart = Cart::new(UserId::new());
        let p = ProductId::new();
        cart.add(p, 1, Money::from_cents(500)).unwrap();

        cart.remove(ProductId::new());
        assert_eq!(cart.items().len(), 1);

        cart.remove(p);
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Money::zero());
    }

    #[test]
    fn set_quantity_recomputes_total() {
        let mut cart = Cart::new(UserId::new());
        let a = ProductId::new();
        let b = ProductId::new();
        cart.add(a, 2, Money::from_cents(2000)).unwrap();
        cart.add(b, 1, Money::from_cents(150)).unwrap();

        cart.set_quantity(a, 3).unwrap();

        assert_eq!(cart.total_amount(), Money::from_cents(6150));
        assert_total_consistent(&cart);
    }

    #[test]
    fn set_quantity_errors() {
        let mut cart = Cart::new(UserId::new());
        let p = ProductId::new();
        cart.add(p, 2, Money::from_cents(2000)).unwrap();

        assert!(matches!(
            cart.set_quantity(p, 0),
            Err(CartError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.set_quantity(p, -4),
            Err(CartError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.set_quantity(ProductId::new(), 1),
            Err(CartError::LineNotFound { .. })
        ));
        assert_eq!(cart.line(p).unwrap().quantity, 2);
    }

    #[test]
    fn add_rejects_totals_that_overflow() {
        let mut cart = Cart::new(UserId::new());
        let p = ProductId::new();
        cart.add(p, 1, Money::from_cents(10_000_000_000)).unwrap();

        assert!(matches!(
            cart.add(p, 1_000_000_000, Money::from_cents(10_000_000_000)),
            Err(CartError::TotalTooLarge)
        ));
        assert!(matches!(
            cart.add(ProductId::new(), 1, Money::from_cents(i64::MAX)),
            Err(CartError::TotalTooLarge)
        ));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.line(p).unwrap().quantity, 1);
        assert_eq!(cart.total_amount(), Money::from_cents(10_000_000_000));
    }

    #[test]
    fn set_quantity_rejects_totals_that_overflow() {
        let mut cart = Cart::new(UserId::new());
        let p = ProductId::new();
        cart.add(p, 2, Money::from_cents(10_000_000_000)).unwrap();

        assert!(matches!(
            cart.set_quantity(p, i64::from(u32::MAX)),
            Err(CartError::TotalTooLarge)
        ));
        assert_eq!(cart.line(p).unwrap().quantity, 2);
        assert_total_consistent(&cart);
    }

    #[test]
    fn clear_zeroes_total() {
        let mut cart = Cart::new(UserId::new());
        cart.add(ProductId::new(), 5, Money::from_cents(100)).unwrap();

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Money::zero());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut cart = Cart::new(UserId::new());
        cart.add(ProductId::new(), 1, Money::from_cents(100)).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["totalAmount"], 100);
        assert_eq!(json["items"][0]["priceAtTime"], 100);
    }
}
