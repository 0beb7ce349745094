//! User accounts: consumers who buy and merchants who sell.

mod service;

pub use service::UserService;

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::repository::Entity;
use crate::value_objects::UserId;

/// What an account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Buys products. Default for new accounts.
    #[default]
    Consumer,

    /// Lists products and fulfills orders.
    Merchant,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Consumer => "consumer",
            Role::Merchant => "merchant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer" => Ok(Role::Consumer),
            "merchant" => Ok(Role::Merchant),
            _ => Err(DomainError::Validation(
                "Invalid role. Must be 'consumer' or 'merchant'".to_string(),
            )),
        }
    }
}

/// A stored user account.
///
/// Never serialize this to clients; use [`UserProfile`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns true if the account can sell.
    pub fn is_merchant(&self) -> bool {
        self.role == Role::Merchant
    }

    /// The public profile view of this account.
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }

    /// The short view embedded in products and orders.
    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const NAME: &'static str = "User";

    fn document_id(&self) -> DocumentId {
        self.id.into()
    }
}

/// A user as returned to clients, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Name and contact of a user, embedded in other views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub fullname: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
        }
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Registration {
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmpassword", alias = "confirmPassword")]
    pub confirm_password: String,
    pub address: String,
    pub role: Option<String>,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub fullname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// One-way password hashing.
///
/// Implemented outside the domain so the algorithm and its parameters can be
/// chosen by the binary.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Checks a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Minimum length for a new password.
pub const MIN_PASSWORD_LEN: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            fullname: "Ada Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            address: "London".to_string(),
            role: Role::Merchant,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!("consumer".parse::<Role>().unwrap(), Role::Consumer);
        assert_eq!("merchant".parse::<Role>().unwrap(), Role::Merchant);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Consumer);
    }

    #[test]
    fn profile_omits_password_hash() {
        let user = sample_user();
        let json = serde_json::to_value(user.profile()).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "merchant");
        assert_eq!(json["username"], "ada");
    }

    #[test]
    fn registration_fields_default_to_empty() {
        let reg: Registration = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(reg.email, "a@b.c");
        assert!(reg.fullname.is_empty());
        assert!(reg.role.is_none());
    }
}
