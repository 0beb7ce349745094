//! Loads orders and products for the merchant read models.

use std::collections::HashMap;

use doc_store::DocumentStore;
use domain::{Order, Product, Repository, User, UserId, UserSummary};

use crate::Result;
use crate::merchant::MerchantAnalytics;
use crate::sales::{MerchantSale, ProductSalesStats, ProductWithStats};

/// Read-only service building merchant analytics on demand.
pub struct AnalyticsService<S: DocumentStore> {
    orders: Repository<S, Order>,
    products: Repository<S, Product>,
    users: Repository<S, User>,
}

impl<S: DocumentStore + Clone> AnalyticsService<S> {
    /// Creates a new analytics service.
    pub fn new(store: S) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            products: Repository::new(store.clone()),
            users: Repository::new(store),
        }
    }
}

impl<S: DocumentStore> AnalyticsService<S> {
    /// Dashboard numbers for a merchant.
    #[tracing::instrument(skip(self))]
    pub async fn merchant_analytics(&self, merchant: UserId) -> Result<MerchantAnalytics> {
        let orders = self.merchant_orders(merchant, false).await?;
        let total_products = self
            .products
            .count_where(Product::owner_filter(merchant))
            .await?;

        let analytics = MerchantAnalytics::compute(merchant, &orders, total_products);
        tracing::debug!(
            orders = analytics.total_orders,
            revenue = %analytics.total_revenue,
            "Computed merchant analytics"
        );
        Ok(analytics)
    }

    /// The merchant's orders, newest first, with only their lines.
    #[tracing::instrument(skip(self))]
    pub async fn merchant_sales(&self, merchant: UserId) -> Result<Vec<MerchantSale>> {
        let orders = self.merchant_orders(merchant, true).await?;
        let mut customers: HashMap<UserId, Option<UserSummary>> = HashMap::new();
        let mut sales = Vec::with_capacity(orders.len());

        for order in &orders {
            let customer = match customers.get(&order.customer) {
                Some(summary) => summary.clone(),
                None => {
                    let summary = self.users.get(order.customer).await?.map(|u| u.summary());
                    customers.insert(order.customer, summary.clone());
                    summary
                }
            };
            sales.push(MerchantSale::new(merchant, order, customer));
        }

        Ok(sales)
    }

    /// The merchant's products, newest first, each with its sales.
    #[tracing::instrument(skip(self))]
    pub async fn products_with_stats(&self, merchant: UserId) -> Result<Vec<ProductWithStats>> {
        let query = self
            .products
            .query()
            .filter(Product::owner_filter(merchant))
            .newest_first();
        let products = self.products.find(query).await?;
        let orders = self.merchant_orders(merchant, false).await?;
        let stats = ProductSalesStats::compute(merchant, &orders);

        Ok(products
            .into_iter()
            .map(|product| ProductWithStats {
                stats: stats.get(&product.id).copied().unwrap_or_default(),
                product,
            })
            .collect())
    }

    async fn merchant_orders(&self, merchant: UserId, newest_first: bool) -> Result<Vec<Order>> {
        let mut query = self.orders.query().filter(Order::merchant_filter(merchant));
        if newest_first {
            query = query.newest_first();
        }
        Ok(self.orders.find(query).await?)
    }
}
