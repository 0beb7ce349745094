//! Merchant dashboard aggregation.

use std::collections::{BTreeMap, HashMap};

use domain::{Money, Order, OrderStatus, ProductId, UserId};
use serde::Serialize;

/// How many of the merchant's orders sit in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    fn record(&mut self, status: OrderStatus) {
        let slot = match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Processing => &mut self.processing,
            OrderStatus::Shipped => &mut self.shipped,
            OrderStatus::Delivered => &mut self.delivered,
            OrderStatus::Cancelled => &mut self.cancelled,
        };
        *slot += 1;
    }
}

/// Revenue of one calendar month ("YYYY-MM").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Money,
}

/// One of the merchant's best-selling products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub total_sold: u64,
    pub revenue: Money,
}

/// Dashboard numbers for one merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAnalytics {
    pub total_revenue: Money,
    /// Orders holding at least one of the merchant's lines, cancelled included.
    pub total_orders: u64,
    pub total_products: u64,
    pub total_products_sold: u64,
    pub cancelled_orders: u64,
    pub active_orders: u64,
    pub average_order_value: Money,
    pub orders_by_status: StatusCounts,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
}

/// Number of products listed in `top_products`.
pub const TOP_PRODUCTS: usize = 5;

impl MerchantAnalytics {
    /// Aggregates the merchant's view of `orders`.
    ///
    /// Orders without a line of the merchant are ignored. Revenue, units sold,
    /// monthly buckets and top products only count non-cancelled orders and
    /// only the merchant's own lines.
    pub fn compute(merchant: UserId, orders: &[Order], total_products: u64) -> Self {
        let mut total_revenue = Money::zero();
        let mut total_orders = 0u64;
        let mut total_products_sold = 0u64;
        let mut cancelled_orders = 0u64;
        let mut orders_by_status = StatusCounts::default();
        let mut monthly: BTreeMap<String, Money> = BTreeMap::new();
        let mut products: HashMap<ProductId, TopProduct> = HashMap::new();
        let mut first_seen: Vec<ProductId> = Vec::new();

        for order in orders {
            if !order.has_merchant(merchant) {
                continue;
            }

            total_orders += 1;
            orders_by_status.record(order.status());

            if order.status() == OrderStatus::Cancelled {
                cancelled_orders += 1;
                continue;
            }

            let month = order.created_at.format("%Y-%m").to_string();
            for item in order.merchant_items(merchant) {
                total_revenue += item.total_price;
                total_products_sold += u64::from(item.quantity);
                *monthly.entry(month.clone()).or_default() += item.total_price;

                let entry = products.entry(item.product_id).or_insert_with(|| {
                    first_seen.push(item.product_id);
                    TopProduct {
                        id: item.product_id,
                        name: item.product_name.clone(),
                        total_sold: 0,
                        revenue: Money::zero(),
                    }
                });
                entry.total_sold += u64::from(item.quantity);
                entry.revenue += item.total_price;
            }
        }

        let mut top_products: Vec<TopProduct> = first_seen
            .iter()
            .filter_map(|id| products.remove(id))
            .collect();
        top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        top_products.truncate(TOP_PRODUCTS);

        let active_orders = total_orders - cancelled_orders;

        Self {
            total_revenue,
            total_orders,
            total_products,
            total_products_sold,
            cancelled_orders,
            active_orders,
            average_order_value: total_revenue.average_over(active_orders),
            orders_by_status,
            revenue_by_month: monthly
                .into_iter()
                .map(|(month, revenue)| MonthlyRevenue { month, revenue })
                .collect(),
            top_products,
        }
    }
}
