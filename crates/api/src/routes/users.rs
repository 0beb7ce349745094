//! Account endpoints: sign-up, login and profile.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use doc_store::DocumentStore;
use domain::{DomainError, ProfileUpdate, Registration, UserProfile};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Username or email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

/// POST /api/users/signup
#[tracing::instrument(skip(state, registration), fields(username = %registration.username))]
pub async fn signup<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state.users.register(registration).await?;
    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: Some("User registered successfully"),
            user: user.profile(),
            token,
        }),
    ))
}

/// POST /api/users/login
#[tracing::instrument(skip(state, req))]
pub async fn login<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = match state.users.authenticate(&req.username, &req.password).await {
        Ok(user) => user,
        Err(DomainError::NotFound { .. }) => {
            tracing::info!("Login attempt for a non-existent user");
            return Err(ApiError::NotFound(
                "User not found. This account may have been deleted.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        message: None,
        user: user.profile(),
        token,
    }))
}

/// POST /api/users/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "User logged out successfully",
    })
}

/// GET /api/users/profile
pub async fn profile(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user.profile())
}

/// PUT /api/users/profile
#[tracing::instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update_profile<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileUpdatedResponse>, ApiError> {
    let user = state.users.update_profile(user.id, update).await?;
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully",
        user: user.profile(),
    }))
}

fn issue_token<S: DocumentStore>(
    state: &AppState<S>,
    user: &domain::User,
) -> Result<String, ApiError> {
    state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}
