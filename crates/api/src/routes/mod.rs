//! HTTP handlers grouped by route prefix.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// A bare `{"message": ...}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Parses a path identifier into a typed id.
pub(crate) fn parse_id<T: From<Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid =
        Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
