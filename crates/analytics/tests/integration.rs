//! Integration tests for merchant read models over the in-memory store.

use analytics::AnalyticsService;
use doc_store::InMemoryDocumentStore;
use domain::{
    CheckoutItem, CheckoutRequest, Money, OrderService, OrderStatus, Product, ProductDraft,
    ProductService, UserId,
};

struct Fixture {
    products: ProductService<InMemoryDocumentStore>,
    orders: OrderService<InMemoryDocumentStore>,
    analytics: AnalyticsService<InMemoryDocumentStore>,
}

fn fixture() -> Fixture {
    let store = InMemoryDocumentStore::new();
    Fixture {
        products: ProductService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        analytics: AnalyticsService::new(store),
    }
}

async fn listing(f: &Fixture, owner: UserId, name: &str, price: i64) -> Product {
    f.products
        .create(
            owner,
            ProductDraft {
                name: Some(name.to_string()),
                description: Some("desc".to_string()),
                price: Some(price),
                quantity: Some(100),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

async fn buy(f: &Fixture, lines: &[(&Product, i64)]) -> domain::Order {
    let items = lines
        .iter()
        .map(|(p, qty)| CheckoutItem {
            product_id: p.id,
            quantity: *qty,
            price: p.price,
        })
        .collect();
    f.orders
        .checkout(
            UserId::new(),
            CheckoutRequest {
                items,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .order
}

#[tokio::test]
async fn analytics_exclude_cancelled_and_foreign_lines() {
    let f = fixture();
    let me = UserId::new();
    let other = UserId::new();
    let lamp = listing(&f, me, "Lamp", 2000).await;
    let desk = listing(&f, me, "Desk", 15000).await;
    let chair = listing(&f, other, "Chair", 5000).await;

    buy(&f, &[(&lamp, 2), (&chair, 1)]).await;
    let shipped = buy(&f, &[(&desk, 1)]).await;
    let cancelled = buy(&f, &[(&lamp, 5)]).await;

    f.orders
        .update_status(me, shipped.id, OrderStatus::Processing)
        .await
        .unwrap();
    f.orders.cancel(cancelled.customer, cancelled.id).await.unwrap();

    let analytics = f.analytics.merchant_analytics(me).await.unwrap();

    assert_eq!(analytics.total_orders, 3);
    assert_eq!(analytics.cancelled_orders, 1);
    assert_eq!(analytics.active_orders, 2);
    assert_eq!(analytics.total_products, 2);
    assert_eq!(analytics.total_products_sold, 3);
    assert_eq!(analytics.total_revenue, Money::from_cents(19000));
    assert_eq!(analytics.average_order_value, Money::from_cents(9500));
    assert_eq!(analytics.orders_by_status.pending, 1);
    assert_eq!(analytics.orders_by_status.processing, 1);
    assert_eq!(analytics.orders_by_status.cancelled, 1);
    assert_eq!(analytics.top_products[0].name, "Desk");
    assert_eq!(analytics.revenue_by_month.len(), 1);
}

#[tokio::test]
async fn merchant_without_orders_gets_zeroes() {
    let f = fixture();
    let me = UserId::new();
    listing(&f, me, "Lamp", 2000).await;

    let analytics = f.analytics.merchant_analytics(me).await.unwrap();

    assert_eq!(analytics.total_orders, 0);
    assert_eq!(analytics.total_products, 1);
    assert_eq!(analytics.average_order_value, Money::zero());
}

#[tokio::test]
async fn sales_and_product_stats() {
    let f = fixture();
    let me = UserId::new();
    let other = UserId::new();
    let lamp = listing(&f, me, "Lamp", 2000).await;
    let unsold = listing(&f, me, "Unsold", 100).await;
    let chair = listing(&f, other, "Chair", 5000).await;

    buy(&f, &[(&lamp, 1), (&chair, 2)]).await;
    buy(&f, &[(&lamp, 3)]).await;

    let sales = f.analytics.merchant_sales(me).await.unwrap();
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].total_merchant_amount, Money::from_cents(6000));
    assert_eq!(sales[1].total_merchant_amount, Money::from_cents(2000));
    assert!(sales.iter().all(|s| s.order.items().len() == 1));

    let products = f.analytics.products_with_stats(me).await.unwrap();
    assert_eq!(products.len(), 2);
    let lamp_stats = products
        .iter()
        .find(|p| p.product.id == lamp.id)
        .unwrap()
        .stats;
    assert_eq!(lamp_stats.total_sold, 4);
    assert_eq!(lamp_stats.total_revenue, Money::from_cents(8000));
    assert_eq!(lamp_stats.total_orders, 2);
    let unsold_stats = products
        .iter()
        .find(|p| p.product.id == unsold.id)
        .unwrap()
        .stats;
    assert_eq!(unsold_stats.total_sold, 0);
}
