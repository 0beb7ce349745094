//! Checkout planning: turning requested lines into order items.

use std::collections::HashMap;

use crate::cart::Cart;
use crate::product::Product;
use crate::value_objects::{Money, ProductId};

use super::{OrderDetails, OrderError, OrderItem};

/// One line requested directly by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit price as sent by the client. Used as-is.
    pub price: Money,
}

/// Everything a checkout needs besides the customer.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    /// Explicit lines. When empty, the customer's cart is used.
    pub items: Vec<CheckoutItem>,
    /// Total the client expects to pay.
    pub total_amount: Option<Money>,
    pub details: OrderDetails,
}

/// A validated line about to be staged against stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlannedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

impl PlannedLine {
    pub(crate) fn from_items(items: &[CheckoutItem]) -> Result<Vec<PlannedLine>, OrderError> {
        items
            .iter()
            .map(|item| {
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(OrderError::InvalidQuantity {
                        quantity: item.quantity,
                    })?;
                Ok(PlannedLine {
                    product_id: item.product_id,
                    quantity,
                    price: item.price,
                })
            })
            .collect()
    }

    pub(crate) fn from_cart(cart: &Cart) -> Vec<PlannedLine> {
        cart.items()
            .iter()
            .map(|line| PlannedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price_at_time,
            })
            .collect()
    }
}

/// Total units requested per product, in first-seen order.
pub(crate) fn demand(lines: &[PlannedLine]) -> Vec<(ProductId, u32)> {
    let mut totals: Vec<(ProductId, u32)> = Vec::new();
    for line in lines {
        match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty = qty.saturating_add(line.quantity),
            None => totals.push((line.product_id, line.quantity)),
        }
    }
    totals
}

/// Checks every line against live stock and snapshots the order items.
///
/// Quantities for a product appearing on several lines are accumulated before
/// comparing with its stock. Fails when a line total or the order total does
/// not fit in a money amount. Nothing is written.
pub(crate) fn stage(
    lines: &[PlannedLine],
    products: &HashMap<ProductId, Product>,
) -> Result<Vec<OrderItem>, OrderError> {
    let mut requested: HashMap<ProductId, u32> = HashMap::new();
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or(OrderError::ProductNotFound {
                product_id: line.product_id,
            })?;

        let total = requested.entry(line.product_id).or_default();
        *total = total.saturating_add(line.quantity);

        if *total > product.quantity {
            return Err(OrderError::InsufficientStock {
                product_name: product.name.clone(),
                available: product.quantity,
                requested: *total,
            });
        }

        items.push(OrderItem::new(
            product.id,
            product.owner,
            product.name.clone(),
            line.quantity,
            line.price,
        )?);
    }

    items
        .iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.total_price))
        .ok_or(OrderError::TotalTooLarge)?;

    Ok(items)
}
