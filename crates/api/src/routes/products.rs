//! Catalogue endpoints under `/api/shop`.

use std::sync::Arc;

use analytics::ProductWithStats;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use doc_store::DocumentStore;
use domain::{Category, Product, ProductDraft, ProductId, ProductListing};
use serde::Deserialize;

use crate::auth::MerchantUser;
use crate::error::ApiError;
use crate::routes::{MessageResponse, parse_id};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// GET /api/shop/products?category=
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductListing>>, ApiError> {
    let products = state.products.list(query.category.as_deref()).await?;
    Ok(Json(products))
}

/// GET /api/shop/categories
pub async fn categories<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<&'static [Category]> {
    Json(state.products.categories())
}

/// GET /api/shop/product/{id}
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    Ok(Json(state.products.get(id).await?))
}

/// POST /api/shop/add-product
#[tracing::instrument(skip(state, merchant, draft), fields(merchant_id = %merchant.id))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.products.create(merchant.id, draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/shop/user-products
///
/// The merchant's own products, each with its sales figures.
pub async fn owned<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
) -> Result<Json<Vec<ProductWithStats>>, ApiError> {
    let products = state.analytics.products_with_stats(merchant.id).await?;
    Ok(Json(products))
}

/// PUT /api/shop/product/{id}
#[tracing::instrument(skip(state, merchant, draft), fields(merchant_id = %merchant.id))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.products.update(merchant.id, id, draft).await?;
    Ok(Json(product))
}

/// DELETE /api/shop/product/{id}
#[tracing::instrument(skip(state, merchant), fields(merchant_id = %merchant.id))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MerchantUser(merchant): MerchantUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.products.delete(merchant.id, id).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
