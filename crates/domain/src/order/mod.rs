//! Orders: aggregate, status policy, checkout and service.

mod aggregate;
mod checkout;
mod service;
mod status;

pub use aggregate::{Order, OrderDetails, OrderItem, ShippingAddress};
pub use checkout::{CheckoutItem, CheckoutRequest};
pub use service::{MerchantOrderView, OrderService, OrderView};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus, check_transition};

use thiserror::Error;

use crate::value_objects::ProductId;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Neither explicit items nor a non-empty cart were available.
    #[error("Cart is empty and no items provided")]
    EmptyCheckout,

    /// A checkout line names a product that doesn't exist.
    #[error("Product not found")]
    ProductNotFound { product_id: ProductId },

    /// Requested more units than are in stock.
    #[error("Insufficient stock for {product_name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_name: String,
        available: u32,
        requested: u32,
    },

    /// A checkout line has a non-positive quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Line or order totals do not fit in a money amount.
    #[error("Order total is too large")]
    TotalTooLarge,

    /// Status change outside the transition table.
    #[error("Cannot change status from {current} to {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// Delivered and cancelled orders are frozen.
    #[error("Cannot update status of {current} orders")]
    Terminal { current: OrderStatus },

    /// Customer cancellation outside the pending state.
    #[error("Cannot cancel order with status: {current}")]
    NotCancellable { current: OrderStatus },

    /// Unrecognized status name.
    #[error("Invalid status")]
    UnknownStatus,

    /// Unrecognized payment status name.
    #[error("Invalid payment status. Must be one of: pending, paid, failed, refunded")]
    UnknownPaymentStatus,

    /// Unrecognized payment method name.
    #[error("Invalid payment method: {0}")]
    UnknownPaymentMethod(String),
}
