//! Order aggregate.

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repository::Entity;
use crate::value_objects::{Money, OrderId, ProductId, UserId};

use super::{OrderError, OrderStatus, PaymentMethod, PaymentStatus, check_transition};

/// An immutable snapshot of one purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub merchant_id: UserId,
    pub product_name: String,
    pub quantity: u32,
    pub price_at_time: Money,
    pub total_price: Money,
}

impl OrderItem {
    /// Creates an item; the total is price times quantity.
    pub fn new(
        product_id: ProductId,
        merchant_id: UserId,
        product_name: impl Into<String>,
        quantity: u32,
        price_at_time: Money,
    ) -> Result<Self, OrderError> {
        let total_price = price_at_time
            .checked_multiply(quantity)
            .ok_or(OrderError::TotalTooLarge)?;
        Ok(Self {
            product_id,
            merchant_id,
            product_name: product_name.into(),
            quantity,
            price_at_time,
            total_price,
        })
    }
}

/// Delivery address, either free text or a structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShippingAddress {
    Text(String),
    Structured(Map<String, Value>),
}

impl Default for ShippingAddress {
    fn default() -> Self {
        let mut fields = Map::new();
        fields.insert("address".to_string(), Value::from("Not provided"));
        ShippingAddress::Structured(fields)
    }
}

/// Optional checkout details; absent values take their defaults.
#[derive(Debug, Clone, Default)]
pub struct OrderDetails {
    pub shipping_address: Option<ShippingAddress>,
    pub phone_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_intent_id: Option<String>,
}

/// A placed order.
///
/// Items are fixed at checkout. Only the status fields change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: UserId,
    items: Vec<OrderItem>,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    status: OrderStatus,
    payment_status: PaymentStatus,
    #[serde(rename = "stripePaymentIntentId")]
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order.
    pub fn place(
        customer: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
        details: OrderDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            customer,
            items,
            total_amount,
            shipping_address: details.shipping_address.unwrap_or_default(),
            phone_number: details.phone_number.unwrap_or_default(),
            payment_method: details.payment_method.unwrap_or_default(),
            status: OrderStatus::Pending,
            payment_status: details.payment_status.unwrap_or_default(),
            payment_intent_id: details.payment_intent_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Sum of the item totals.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(|i| i.total_price).sum()
    }

    /// Returns true if `merchant` sold at least one line of this order.
    pub fn has_merchant(&self, merchant: UserId) -> bool {
        self.items.iter().any(|i| i.merchant_id == merchant)
    }

    /// The lines sold by `merchant`.
    pub fn merchant_items(&self, merchant: UserId) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(move |i| i.merchant_id == merchant)
    }

    /// Total of the lines sold by `merchant`.
    pub fn merchant_total(&self, merchant: UserId) -> Money {
        self.merchant_items(merchant).map(|i| i.total_price).sum()
    }

    /// Distinct merchants on the order, in line order.
    pub fn merchants(&self) -> Vec<UserId> {
        let mut merchants = Vec::new();
        for item in &self.items {
            if !merchants.contains(&item.merchant_id) {
                merchants.push(item.merchant_id);
            }
        }
        merchants
    }

    /// A copy of the order with only `merchant`'s lines.
    pub fn for_merchant(&self, merchant: UserId) -> Order {
        let mut order = self.clone();
        order.items.retain(|i| i.merchant_id == merchant);
        order
    }

    /// Applies a merchant-requested status change.
    pub fn update_status(&mut self, requested: OrderStatus) -> Result<(), OrderError> {
        check_transition(self.status, requested)?;
        self.status = requested;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Customer cancellation: pending orders only; payment is marked failed.
    pub fn cancel_by_customer(&mut self) -> Result<(), OrderError> {
        if !self.status.can_customer_cancel() {
            return Err(OrderError::NotCancellable {
                current: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        self.payment_status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records a payment outcome. Independent of the fulfilment status.
    pub fn set_payment_status(&mut self, payment_status: PaymentStatus) {
        self.payment_status = payment_status;
        self.updated_at = Utc::now();
    }

    /// Filter matching orders placed by `customer`.
    pub fn customer_filter(customer: UserId) -> Value {
        serde_json::json!({ "customer": customer })
    }

    /// Filter matching orders with at least one line sold by `merchant`.
    pub fn merchant_filter(merchant: UserId) -> Value {
        serde_json::json!({ "items": [{ "merchantId": merchant }] })
    }

    /// Filter matching orders carrying a payment intent.
    pub fn payment_intent_filter(intent_id: &str) -> Value {
        serde_json::json!({ "stripePaymentIntentId": intent_id })
    }
}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";
    const NAME: &'static str = "Order";

    fn document_id(&self) -> DocumentId {
        self.id.into()
    }
}

#[cfg(test)]
mod tests {
    use doc_store::json_contains;

    use super::*;

    fn order_with(merchants: &[UserId]) -> Order {
        let items = merchants
            .iter()
            .enumerate()
            .map(|(i, m)| {
                OrderItem::new(
                    ProductId::new(),
                    *m,
                    format!("Item {i}"),
                    2,
                    Money::from_cents(1000),
                )
                .unwrap()
            })
            .collect();
        Order::place(UserId::new(), items, Money::from_cents(0), OrderDetails::default())
    }

    #[test]
    fn item_total_must_fit() {
        let item = OrderItem::new(
            ProductId::new(),
            UserId::new(),
            "Lamp",
            3,
            Money::from_cents(2000),
        )
        .unwrap();
        assert_eq!(item.total_price, Money::from_cents(6000));

        let err = OrderItem::new(
            ProductId::new(),
            UserId::new(),
            "Lamp",
            1_000_000_000,
            Money::from_cents(10_000_000_000),
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::TotalTooLarge));
    }

    #[test]
    fn place_applies_defaults() {
        let order = order_with(&[UserId::new()]);

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::Card);
        assert_eq!(order.phone_number, "");
        assert_eq!(order.shipping_address, ShippingAddress::default());
        assert!(order.payment_intent_id.is_none());
    }

    #[test]
    fn default_shipping_address_serializes_as_object() {
        let json = serde_json::to_value(ShippingAddress::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "address": "Not provided" }));

        let text: ShippingAddress = serde_json::from_str("\"221B Baker St\"").unwrap();
        assert_eq!(text, ShippingAddress::Text("221B Baker St".to_string()));
    }

    #[test]
    fn merchant_views_filter_lines() {
        let a = UserId::new();
        let b = UserId::new();
        let order = order_with(&[a, b, a]);

        assert!(order.has_merchant(a));
        assert!(!order.has_merchant(UserId::new()));
        assert_eq!(order.merchant_items(a).count(), 2);
        assert_eq!(order.merchant_total(a), Money::from_cents(4000));
        assert_eq!(order.for_merchant(b).items().len(), 1);
        assert_eq!(order.merchants(), vec![a, b]);
        assert_eq!(order.computed_total(), Money::from_cents(6000));
    }

    #[test]
    fn merchant_filter_matches_stored_body() {
        let a = UserId::new();
        let order = order_with(&[UserId::new(), a]);
        let body = serde_json::to_value(&order).unwrap();

        assert!(json_contains(&body, &Order::merchant_filter(a)));
        assert!(!json_contains(&body, &Order::merchant_filter(UserId::new())));
        assert!(json_contains(&body, &Order::customer_filter(order.customer)));
    }

    #[test]
    fn customer_cancel_only_while_pending() {
        let mut order = order_with(&[UserId::new()]);
        order.cancel_by_customer().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.payment_status(), PaymentStatus::Failed);

        let mut shipped = order_with(&[UserId::new()]);
        shipped.update_status(OrderStatus::Processing).unwrap();
        shipped.update_status(OrderStatus::Shipped).unwrap();
        assert!(matches!(
            shipped.cancel_by_customer(),
            Err(OrderError::NotCancellable {
                current: OrderStatus::Shipped
            })
        ));
        assert_eq!(shipped.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn full_fulfilment_path() {
        let mut order = order_with(&[UserId::new()]);

        assert!(order.update_status(OrderStatus::Delivered).is_err());
        order.update_status(OrderStatus::Processing).unwrap();
        order.update_status(OrderStatus::Shipped).unwrap();
        order.update_status(OrderStatus::Delivered).unwrap();

        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.update_status(OrderStatus::Cancelled).is_err());
    }
}
