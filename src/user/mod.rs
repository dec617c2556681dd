mod auth;
mod models;
mod schema;
mod store;
mod trait_def;

pub use auth::{AuthTokenValue, PasswordHasher};
pub use models::{AuthToken, User, UserRole};
pub use schema::USERS_SCHEMA;
pub use store::SqliteUserStore;
pub use trait_def::{UserStore, UserStoreError};
