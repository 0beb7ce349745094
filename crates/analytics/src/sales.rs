//! Per-order and per-product sales for one merchant.

use std::collections::{HashMap, HashSet};

use domain::{Money, Order, OrderId, OrderStatus, Product, ProductId, UserId, UserSummary};
use serde::Serialize;

/// An order reduced to one merchant's lines, with what they earn from it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantSale {
    #[serde(flatten)]
    pub order: Order,
    pub customer_details: Option<UserSummary>,
    pub total_merchant_amount: Money,
}

impl MerchantSale {
    /// Builds the merchant's view of an order.
    pub fn new(merchant: UserId, order: &Order, customer_details: Option<UserSummary>) -> Self {
        Self {
            total_merchant_amount: order.merchant_total(merchant),
            order: order.for_merchant(merchant),
            customer_details,
        }
    }
}

/// Units, revenue and distinct orders for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalesStats {
    pub total_sold: u64,
    pub total_revenue: Money,
    pub total_orders: u64,
}

impl ProductSalesStats {
    /// Sales of each of `merchant`'s products across non-cancelled orders.
    ///
    /// Revenue is quantity times the price snapshot of each line.
    pub fn compute(merchant: UserId, orders: &[Order]) -> HashMap<ProductId, ProductSalesStats> {
        let mut stats: HashMap<ProductId, ProductSalesStats> = HashMap::new();
        let mut seen: HashSet<(ProductId, OrderId)> = HashSet::new();

        for order in orders {
            if order.status() == OrderStatus::Cancelled {
                continue;
            }
            for item in order.merchant_items(merchant) {
                let entry = stats.entry(item.product_id).or_default();
                entry.total_sold += u64::from(item.quantity);
                entry.total_revenue += item.total_price;
                if seen.insert((item.product_id, order.id)) {
                    entry.total_orders += 1;
                }
            }
        }

        stats
    }
}

/// A product with its sales statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithStats {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub stats: ProductSalesStats,
}

#[cfg(test)]
mod tests {
    use domain::{OrderDetails, OrderItem};

    use super::*;

    fn order(items: Vec<OrderItem>) -> Order {
        Order::place(UserId::new(), items, Money::zero(), OrderDetails::default())
    }

    #[test]
    fn merchant_sale_sums_own_lines() {
        let me = UserId::new();
        let o = order(vec![
            OrderItem::new(ProductId::new(), me, "Mine", 2, Money::from_cents(150)).unwrap(),
            OrderItem::new(ProductId::new(), UserId::new(), "Theirs", 1, Money::from_cents(999))
                .unwrap(),
        ]);

        let sale = MerchantSale::new(me, &o, None);

        assert_eq!(sale.total_merchant_amount, Money::from_cents(300));
        assert_eq!(sale.order.items().len(), 1);
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["totalMerchantAmount"], 300);
    }

    #[test]
    fn product_stats_count_distinct_orders_and_skip_cancelled() {
        let me = UserId::new();
        let p = ProductId::new();
        let line = |qty| OrderItem::new(p, me, "Lamp", qty, Money::from_cents(200)).unwrap();

        let twice_in_one = order(vec![line(1), line(2)]);
        let another = order(vec![line(4)]);
        let mut cancelled = order(vec![line(10)]);
        cancelled.cancel_by_customer().unwrap();

        let stats = ProductSalesStats::compute(me, &[twice_in_one, another, cancelled]);
        let lamp = stats[&p];

        assert_eq!(lamp.total_sold, 7);
        assert_eq!(lamp.total_revenue, Money::from_cents(1400));
        assert_eq!(lamp.total_orders, 2);
    }
}
