//! Account models.

use serde::Serialize;

use super::auth::AuthTokenValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_name(name: &str) -> Option<UserRole> {
        match name {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: UserRole,
    /// Unix seconds.
    pub created: i64,
}

#[derive(Clone, Debug)]
pub struct AuthToken {
    pub value: AuthTokenValue,
    pub user_id: i64,
    /// Unix seconds.
    pub created: i64,
}
