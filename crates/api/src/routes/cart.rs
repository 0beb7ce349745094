//! Cart endpoints under `/api/cart`.
//!
//! The cart always belongs to the authenticated user; any `userId` in the
//! body is ignored.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use doc_store::DocumentStore;
use domain::{CartView, ProductId};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub message: &'static str,
    pub cart: CartView,
}

/// POST /api/cart/get-items
pub async fn items<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.carts.get(user.id).await?))
}

/// POST /api/cart/add-item
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn add_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    let product_id: ProductId = parse_id(&req.product_id)?;
    let cart = state.carts.add_item(user.id, product_id, req.quantity).await?;
    Ok(Json(cart))
}

/// POST /api/cart/remove-item
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn remove_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<RemoveItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    let product_id: ProductId = parse_id(&req.product_id)?;
    Ok(Json(state.carts.remove_item(user.id, product_id).await?))
}

/// POST /api/cart/update-quantity
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update_quantity<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    let product_id: ProductId = parse_id(&req.product_id)?;
    let cart = state
        .carts
        .update_quantity(user.id, product_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// POST or DELETE /api/cart/clear
pub async fn clear<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ClearedResponse>, ApiError> {
    let cart = state.carts.clear(user.id).await?;
    Ok(Json(ClearedResponse {
        message: "Cart cleared successfully",
        cart,
    }))
}
