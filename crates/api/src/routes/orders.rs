//! Checkout and order lifecycle endpoints under `/api/orders`.

use std::sync::Arc;

use analytics::{MerchantAnalytics, MerchantSale};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use doc_store::DocumentStore;
use domain::{
    CheckoutItem, CheckoutRequest, MerchantOrderView, Money, Order, OrderDetails, OrderId,
    OrderStatus, OrderView, PaymentMethod, PaymentStatus, ShippingAddress,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, MerchantUser};
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutBody {
    pub items: Vec<CheckoutLine>,
    pub total_amount: Option<i64>,
    #[serde(alias = "shippingAddress")]
    pub delivery_address: Option<ShippingAddress>,
    pub phone_number: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutLine {
    #[serde(alias = "productId")]
    pub product: String,
    pub quantity: i64,
    /// Unit price in minor units.
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusBody {
    pub payment_status: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub order: T,
}

impl<T> OrderResponse<T> {
    fn new(message: &'static str, order: T) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            order,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MerchantOrdersResponse {
    pub success: bool,
    pub orders: Vec<MerchantOrderView>,
}

impl CheckoutBody {
    fn into_request(self) -> Result<CheckoutRequest, ApiError> {
        let items = self
            .items
            .into_iter()
            .map(|line| {
                Ok(CheckoutItem {
                    product_id: parse_id(&line.product)?,
                    quantity: line.quantity,
                    price: Money::from_cents(line.price),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let payment_method = non_empty(self.payment_method)
            .map(|m| m.parse::<PaymentMethod>())
            .transpose()
            .map_err(domain::DomainError::from)?;
        let payment_status = non_empty(self.payment_status)
            .map(|s| s.parse::<PaymentStatus>())
            .transpose()
            .map_err(domain::DomainError::from)?;

        Ok(CheckoutRequest {
            items,
            total_amount: self.total_amount.map(Money::from_cents),
            details: OrderDetails {
                shipping_address: self.delivery_address,
                phone_number: self.phone_number,
                payment_method,
                payment_status,
                payment_intent_id: non_empty(self.stripe_payment_intent_id),
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// -- Handlers --

/// POST /api/orders/create and /api/orders/checkout
///
/// Uses `items` when present, the caller's cart otherwise.
#[tracing::instrument(skip(state, user, body), fields(customer_id = %user.id))]
pub async fn checkout<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<OrderResponse<OrderView>>), ApiError> {
    let request = body.into_request()?;
    let order = state.orders.checkout(user.id, request).await?;
    Ok((
        StatusCode::CREATED,
        OrderResponse::new("Order created successfully", order),
    ))
}

/// GET /api/orders/my-orders
pub async fn my_orders<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state.orders.customer_orders(user.id).await?;
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        views.push(state.orders.view(order).await?);
    }
    Ok(Json(views))
}

/// PUT /api/orders/{id}/cancel
#[tracing::instrument(skip(state, user), fields(customer_id = %user.id))]
pub async fn cancel<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse<Order>>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state.orders.cancel(user.id, order_id).await?;
    Ok(OrderResponse::new("Order cancelled successfully", order))
}

/// PUT /api/orders/{id}/payment-status
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn payment_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<PaymentStatusBody>,
) -> Result<Json<OrderResponse<Order>>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let payment_status: PaymentStatus = body
        .payment_status
        .parse()
        .map_err(domain::DomainError::from)?;
    let order = state
        .orders
        .update_payment_status(user.id, order_id, payment_status)
        .await?;
    Ok(OrderResponse::new("Payment status updated successfully", order))
}

/// GET /api/orders/merchant
pub async fn merchant_orders<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
) -> Result<Json<MerchantOrdersResponse>, ApiError> {
    let orders = state.orders.merchant_orders(merchant.id).await?;
    Ok(Json(MerchantOrdersResponse {
        success: true,
        orders,
    }))
}

/// GET /api/orders/merchant/sales
pub async fn merchant_sales<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
) -> Result<Json<Vec<MerchantSale>>, ApiError> {
    Ok(Json(state.analytics.merchant_sales(merchant.id).await?))
}

/// GET /api/orders/merchant/analytics
pub async fn merchant_analytics<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
) -> Result<Json<MerchantAnalytics>, ApiError> {
    Ok(Json(state.analytics.merchant_analytics(merchant.id).await?))
}

/// PUT /api/orders/merchant/{id}/status
#[tracing::instrument(skip(state, merchant, body), fields(merchant_id = %merchant.id))]
pub async fn update_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<OrderResponse<Order>>, ApiError> {
    let status: OrderStatus = body.status.parse().map_err(domain::DomainError::from)?;
    let order_id: OrderId = parse_id(&id)?;
    let order = state
        .orders
        .update_status(merchant.id, order_id, status)
        .await?;
    Ok(OrderResponse::new("Order status updated successfully", order))
}
