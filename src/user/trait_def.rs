//! UserStore trait definition.

use super::auth::AuthTokenValue;
use super::models::{AuthToken, User, UserRole};
use anyhow::Result;
use thiserror::Error;

/// Typed failures for account creation, so the HTTP layer can report which
/// unique field was already taken.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("email '{0}' is already registered")]
    EmailTaken(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub trait UserStore: Send + Sync {
    /// Create an account. The password hash and salt are computed by the
    /// caller; duplicate username/email are typed errors.
    fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        salt: &str,
        role: UserRole,
    ) -> Result<User, UserStoreError>;

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Store a freshly issued session token for the user.
    fn add_auth_token(&self, token: &AuthTokenValue, user_id: i64) -> Result<()>;

    /// Resolve a presented token, or None if it was never issued or has been
    /// invalidated.
    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Invalidate a token. Returns false if it did not exist.
    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<bool>;
}
