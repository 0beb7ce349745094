//! Order service: checkout and the order lifecycle.

use std::collections::HashMap;
use std::time::Instant;

use doc_store::{DocumentStore, StoreError};
use serde::Serialize;

use crate::cart::Cart;
use crate::error::DomainError;
use crate::product::Product;
use crate::repository::Repository;
use crate::user::{User, UserSummary};
use crate::value_objects::{Money, OrderId, ProductId, UserId};

use super::checkout::{PlannedLine, demand, stage};

const MAX_STOCK: i64 = u32::MAX as i64;
use super::{CheckoutRequest, Order, OrderError, OrderItem, OrderStatus, PaymentStatus};

/// An order with the people involved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub customer_details: Option<UserSummary>,
    pub merchant_details: Vec<UserSummary>,
}

/// An order as seen by one merchant: only their lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub customer_details: Option<UserSummary>,
}

/// Service for placing and managing orders.
pub struct OrderService<S: DocumentStore> {
    orders: Repository<S, Order>,
    products: Repository<S, Product>,
    carts: Repository<S, Cart>,
    users: Repository<S, User>,
}

impl<S: DocumentStore + Clone> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            products: Repository::new(store.clone()),
            carts: Repository::new(store.clone()),
            users: Repository::new(store),
        }
    }
}

impl<S: DocumentStore> OrderService<S> {
    /// Turns explicit items, or the customer's cart, into a pending order.
    ///
    /// Either every line's stock is decremented and the order is created, or
    /// nothing changes. Clearing a cart that was checked out is best-effort and
    /// never fails a placed order.
    #[tracing::instrument(skip(self, request), fields(explicit_items = request.items.len()))]
    pub async fn checkout(
        &self,
        customer: UserId,
        request: CheckoutRequest,
    ) -> Result<OrderView, DomainError> {
        let started = Instant::now();
        let result = self.place_order(customer, request).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(view) => {
                metrics::counter!("checkout_total").increment(1);
                tracing::info!(order_id = %view.order.id, total = %view.order.total_amount, "Order placed");
            }
            Err(e) => {
                metrics::counter!("checkout_rejected_total").increment(1);
                tracing::warn!(error = %e, "Checkout rejected");
            }
        }

        result
    }

    async fn place_order(
        &self,
        customer: UserId,
        request: CheckoutRequest,
    ) -> Result<OrderView, DomainError> {
        let (lines, from_cart) = if !request.items.is_empty() {
            (PlannedLine::from_items(&request.items)?, false)
        } else {
            let cart = self
                .carts
                .get(customer)
                .await?
                .filter(|cart| !cart.is_empty())
                .ok_or(OrderError::EmptyCheckout)?;
            (PlannedLine::from_cart(&cart), true)
        };

        let demand = demand(&lines);
        let mut products = HashMap::with_capacity(demand.len());
        for (product_id, _) in &demand {
            if let Some(product) = self.products.get(*product_id).await? {
                products.insert(*product_id, product);
            }
        }

        let items = stage(&lines, &products)?;
        self.reserve_stock(&demand, &products).await?;

        let computed = items.iter().map(|i| i.total_price).sum::<Money>();
        let total = match request.total_amount {
            Some(total) if total.is_positive() => {
                if total != computed {
                    tracing::warn!(%total, %computed, "Client total differs from computed total");
                }
                total
            }
            _ => computed,
        };

        let order = Order::place(customer, items, total, request.details);
        if let Err(e) = self.orders.insert(&order).await {
            self.release_stock(&demand).await;
            return Err(e);
        }

        if from_cart && let Err(e) = self.carts.delete(customer).await {
            tracing::error!(order_id = %order.id, error = %e, "Order placed but cart not cleared");
        }

        self.view(order).await
    }

    /// Decrements stock for each product, undoing earlier decrements if a
    /// later one would go negative.
    async fn reserve_stock(
        &self,
        demand: &[(ProductId, u32)],
        products: &HashMap<ProductId, Product>,
    ) -> Result<(), DomainError> {
        let mut reserved = Vec::with_capacity(demand.len());

        for &(product_id, quantity) in demand {
            match self
                .products
                .adjust_counter(product_id, "quantity", -i64::from(quantity), MAX_STOCK)
                .await
            {
                Ok(Some(_)) => reserved.push((product_id, quantity)),
                Ok(None) => {
                    self.release_stock(&reserved).await;
                    let available = match self.products.get(product_id).await {
                        Ok(Some(product)) => product.quantity,
                        _ => 0,
                    };
                    let product_name = products
                        .get(&product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_default();
                    return Err(OrderError::InsufficientStock {
                        product_name,
                        available,
                        requested: quantity,
                    }
                    .into());
                }
                Err(DomainError::Store(StoreError::NotFound { .. })) => {
                    self.release_stock(&reserved).await;
                    return Err(OrderError::ProductNotFound { product_id }.into());
                }
                Err(e) => {
                    self.release_stock(&reserved).await;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Adds units back to stock.
    ///
    /// Products deleted in the meantime are skipped, as are products whose
    /// stock would pass the largest storable quantity.
    async fn release_stock(&self, quantities: &[(ProductId, u32)]) {
        for &(product_id, quantity) in quantities {
            match self
                .products
                .adjust_counter(product_id, "quantity", i64::from(quantity), MAX_STOCK)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::warn!(%product_id, quantity, "Stock at capacity, not restored");
                }
                Err(DomainError::Store(StoreError::NotFound { .. })) => {
                    tracing::warn!(%product_id, quantity, "Product gone, stock not restored");
                }
                Err(e) => {
                    tracing::error!(%product_id, quantity, error = %e, "Failed to restore stock");
                }
            }
        }
    }

    /// Loads one order.
    pub async fn get(&self, id: OrderId) -> Result<Order, DomainError> {
        self.orders.require(id).await
    }

    /// The customer's orders, newest first.
    pub async fn customer_orders(&self, customer: UserId) -> Result<Vec<Order>, DomainError> {
        let query = self
            .orders
            .query()
            .filter(Order::customer_filter(customer))
            .newest_first();
        self.orders.find(query).await
    }

    /// Every order with at least one line sold by `merchant`, newest first.
    pub async fn orders_with_merchant(&self, merchant: UserId) -> Result<Vec<Order>, DomainError> {
        let query = self
            .orders
            .query()
            .filter(Order::merchant_filter(merchant))
            .newest_first();
        self.orders.find(query).await
    }

    /// The merchant's orders, each reduced to the merchant's own lines.
    #[tracing::instrument(skip(self))]
    pub async fn merchant_orders(
        &self,
        merchant: UserId,
    ) -> Result<Vec<MerchantOrderView>, DomainError> {
        let orders = self.orders_with_merchant(merchant).await?;
        let mut customers: HashMap<UserId, Option<UserSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(orders.len());

        for order in orders {
            let customer_details = self.summary_cached(&mut customers, order.customer).await?;
            views.push(MerchantOrderView {
                order: order.for_merchant(merchant),
                customer_details,
            });
        }

        Ok(views)
    }

    /// Merchant-requested status change.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        merchant: UserId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self.orders.require(order_id).await?;

        if !order.has_merchant(merchant) {
            return Err(DomainError::Forbidden(
                "Not authorized to update this order".to_string(),
            ));
        }

        let previous = order.status();
        order.update_status(status)?;
        self.orders.save(&order).await?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(%order_id, %previous, %status, "Order status updated");

        Ok(order)
    }

    /// Customer cancellation of a pending order. Stock is restored per line.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, customer: UserId, order_id: OrderId) -> Result<Order, DomainError> {
        let mut order = self.orders.require(order_id).await?;

        if order.customer != customer {
            return Err(DomainError::Forbidden(
                "Not authorized to cancel this order".to_string(),
            ));
        }

        order.cancel_by_customer()?;
        self.orders.save(&order).await?;

        let restored: Vec<(ProductId, u32)> = order
            .items()
            .iter()
            .map(|item: &OrderItem| (item.product_id, item.quantity))
            .collect();
        self.release_stock(&restored).await;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "Order cancelled by customer");

        Ok(order)
    }

    /// Sets the payment status. Allowed for the customer and any merchant on
    /// the order.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        user: UserId,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self.orders.require(order_id).await?;

        if order.customer != user && !order.has_merchant(user) {
            return Err(DomainError::Forbidden(
                "Not authorized to update this order".to_string(),
            ));
        }

        order.set_payment_status(payment_status);
        self.orders.save(&order).await?;
        Ok(order)
    }

    /// Sets the payment status of every order carrying `intent_id`.
    ///
    /// Returns the ids of the updated orders.
    #[tracing::instrument(skip(self))]
    pub async fn mark_payment_for_intent(
        &self,
        intent_id: &str,
        payment_status: PaymentStatus,
    ) -> Result<Vec<OrderId>, DomainError> {
        let orders = self
            .orders
            .find_where(Order::payment_intent_filter(intent_id))
            .await?;

        let mut updated = Vec::with_capacity(orders.len());
        for mut order in orders {
            order.set_payment_status(payment_status);
            self.orders.save(&order).await?;
            updated.push(order.id);
        }

        if updated.is_empty() {
            tracing::debug!("No order carries this payment intent");
        }
        Ok(updated)
    }

    /// Attaches customer and merchant summaries to an order.
    pub async fn view(&self, order: Order) -> Result<OrderView, DomainError> {
        let customer_details = self.users.get(order.customer).await?.map(|u| u.summary());

        let mut merchant_details = Vec::new();
        for merchant in order.merchants() {
            if let Some(user) = self.users.get(merchant).await? {
                merchant_details.push(user.summary());
            }
        }

        Ok(OrderView {
            order,
            customer_details,
            merchant_details,
        })
    }

    async fn summary_cached(
        &self,
        cache: &mut HashMap<UserId, Option<UserSummary>>,
        id: UserId,
    ) -> Result<Option<UserSummary>, DomainError> {
        if let Some(summary) = cache.get(&id) {
            return Ok(summary.clone());
        }
        let summary = self.users.get(id).await?.map(|u| u.summary());
        cache.insert(id, summary.clone());
        Ok(summary)
    }
}
