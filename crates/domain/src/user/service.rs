//! User account operations.

use std::sync::Arc;

use chrono::Utc;
use doc_store::{DocumentStore, StoreError};
use serde_json::json;

use crate::error::DomainError;
use crate::repository::Repository;
use crate::value_objects::UserId;

use super::{MIN_PASSWORD_LEN, PasswordHasher, ProfileUpdate, Registration, Role, User};

/// Service for registering, authenticating and updating users.
pub struct UserService<S: DocumentStore> {
    users: Repository<S, User>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<S: DocumentStore> UserService<S> {
    /// Creates a new user service.
    pub fn new(store: S, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users: Repository::new(store),
            hasher,
        }
    }

    /// Creates an account.
    #[tracing::instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<User, DomainError> {
        if registration.password != registration.confirm_password {
            return Err(DomainError::Validation("Passwords do not match".to_string()));
        }

        let required = [
            &registration.fullname,
            &registration.username,
            &registration.email,
            &registration.password,
            &registration.address,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(DomainError::Validation("All fields are required".to_string()));
        }

        let role = match registration.role.as_deref() {
            None | Some("") => Role::default(),
            Some(role) => role.parse()?,
        };

        if self.find_by_email(&registration.email).await?.is_some()
            || self.find_by_username(&registration.username).await?.is_some()
        {
            return Err(duplicate_account());
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            fullname: registration.fullname,
            username: registration.username,
            email: registration.email,
            password_hash: self.hasher.hash(&registration.password)?,
            address: registration.address,
            role,
            created_at: now,
            updated_at: now,
        };

        self.users.insert(&user).await.map_err(unique_violation)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(user)
    }

    /// Looks a user up by username or email and checks the password.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, DomainError> {
        if login.is_empty() || password.is_empty() {
            return Err(DomainError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = match self.find_by_email(login).await? {
            Some(user) => user,
            None => self
                .find_by_username(login)
                .await?
                .ok_or_else(|| DomainError::not_found("User", login))?,
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Loads a user, returning None if the account doesn't exist.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        self.users.get(id).await
    }

    /// Loads a user, failing with `NotFound` if the account doesn't exist.
    pub async fn profile(&self, id: UserId) -> Result<User, DomainError> {
        self.users.require(id).await
    }

    /// Applies a partial profile update.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut user = self.users.require(id).await?;

        if let Some(email) = non_empty(&update.email)
            && email != user.email
            && self
                .find_by_email(email)
                .await?
                .is_some_and(|other| other.id != id)
        {
            return Err(DomainError::Conflict("Email already exists".to_string()));
        }

        if let Some(username) = non_empty(&update.username)
            && username != user.username
            && self
                .find_by_username(username)
                .await?
                .is_some_and(|other| other.id != id)
        {
            return Err(DomainError::Conflict("Username already exists".to_string()));
        }

        if let Some(new_password) = non_empty(&update.new_password) {
            let current = non_empty(&update.current_password).ok_or_else(|| {
                DomainError::Validation(
                    "Current password is required to change password".to_string(),
                )
            })?;

            if !self.hasher.verify(current, &user.password_hash) {
                return Err(DomainError::Validation(
                    "Current password is incorrect".to_string(),
                ));
            }

            if new_password.chars().count() < MIN_PASSWORD_LEN {
                return Err(DomainError::Validation(format!(
                    "New password must be at least {MIN_PASSWORD_LEN} characters long"
                )));
            }

            user.password_hash = self.hasher.hash(new_password)?;
        }

        if let Some(fullname) = non_empty(&update.fullname) {
            user.fullname = fullname.to_string();
        }
        if let Some(email) = non_empty(&update.email) {
            user.email = email.to_string();
        }
        if let Some(username) = non_empty(&update.username) {
            user.username = username.to_string();
        }
        if let Some(address) = non_empty(&update.address) {
            user.address = address.to_string();
        }
        user.updated_at = Utc::now();

        self.users.save(&user).await.map_err(unique_violation)?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.users.find_one_where(json!({ "email": email })).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.users
            .find_one_where(json!({ "username": username }))
            .await
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn duplicate_account() -> DomainError {
    DomainError::Conflict("Email or Username already exists".to_string())
}

/// Maps a unique index violation raised by the store to a duplicate account.
fn unique_violation(err: DomainError) -> DomainError {
    match err {
        DomainError::Store(StoreError::Conflict { .. }) => duplicate_account(),
        other => other,
    }
}
