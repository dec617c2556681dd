//! SQLite-backed user store implementation.

use super::auth::AuthTokenValue;
use super::models::{AuthToken, User, UserRole};
use super::schema::USERS_SCHEMA;
use super::trait_def::{UserStore, UserStoreError};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const USER_COLUMNS: &str = "id, username, email, password_hash, salt, role, created";

#[derive(Clone)]
pub struct SqliteUserStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open user database")?;

        USERS_SCHEMA.initialize(&write_conn)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteUserStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
        let role_name: String = row.get(5)?;
        let role = UserRole::from_name(&role_name).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown role '{}'", role_name).into(),
            )
        })?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            salt: row.get(4)?,
            role,
            created: row.get(6)?,
        })
    }

    fn exists(conn: &Connection, sql: &str, value: &str) -> Result<bool> {
        match conn.query_row(sql, params![value], |r| r.get::<_, i32>(0)) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        salt: &str,
        role: UserRole,
    ) -> Result<User, UserStoreError> {
        let conn = self.write_conn.lock().unwrap();
        if Self::exists(&conn, "SELECT 1 FROM users WHERE username = ?1", username)? {
            return Err(UserStoreError::UsernameTaken(username.to_string()));
        }
        if Self::exists(&conn, "SELECT 1 FROM users WHERE email = ?1", email)? {
            return Err(UserStoreError::EmailTaken(email.to_string()));
        }

        conn.execute(
            "INSERT INTO users (username, email, password_hash, salt, role) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, email, password_hash, salt, role.as_str()],
        )
        .context("Could not insert user")?;
        let id = conn.last_insert_rowid();

        let mut stmt = conn
            .prepare_cached(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .context("prepare user lookup")?;
        let user = stmt
            .query_row(params![id], Self::parse_user_row)
            .context("read back created user")?;
        Ok(user)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM users WHERE username = ?1",
            USER_COLUMNS
        ))?;
        match stmt.query_row(params![username], Self::parse_user_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_auth_token(&self, token: &AuthTokenValue, user_id: i64) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_tokens (token, user_id) VALUES (?1, ?2)",
            params![token.0, user_id],
        )
        .context("Could not store auth token")?;
        Ok(())
    }

    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached("SELECT token, user_id, created FROM auth_tokens WHERE token = ?1")?;
        match stmt.query_row(params![token.0], |row| {
            Ok(AuthToken {
                value: AuthTokenValue(row.get(0)?),
                user_id: row.get(1)?,
                created: row.get(2)?,
            })
        }) {
            Ok(auth_token) => Ok(Some(auth_token)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM auth_tokens WHERE token = ?1", params![token.0])
            .context("Could not delete auth token")?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::PasswordHasher;

    fn test_store() -> (tempfile::TempDir, SqliteUserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteUserStore::new(dir.path().join("users.db"), 2).unwrap();
        (dir, store)
    }

    fn register(store: &SqliteUserStore, username: &str, email: &str) -> Result<User, UserStoreError> {
        store.create_user(username, email, "hash", "salt", UserRole::User)
    }

    #[test]
    fn create_then_lookup_roundtrip() {
        let (_dir, store) = test_store();
        let created = register(&store, "alice", "alice@example.com").unwrap();

        let fetched = store.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.email, "alice@example.com");
        assert_eq!(fetched.role, UserRole::User);
        assert!(fetched.created > 0);

        assert!(store.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_and_email_are_typed_errors() {
        let (_dir, store) = test_store();
        register(&store, "alice", "alice@example.com").unwrap();

        let err = register(&store, "alice", "other@example.com").unwrap_err();
        assert!(matches!(err, UserStoreError::UsernameTaken(_)));

        let err = register(&store, "bob", "alice@example.com").unwrap_err();
        assert!(matches!(err, UserStoreError::EmailTaken(_)));
    }

    #[test]
    fn token_lifecycle() {
        let (_dir, store) = test_store();
        let user = register(&store, "alice", "alice@example.com").unwrap();

        let token = AuthTokenValue::generate();
        store.add_auth_token(&token, user.id).unwrap();

        let found = store.get_auth_token(&token).unwrap().unwrap();
        assert_eq!(found.user_id, user.id);
        assert_eq!(found.value, token);

        assert!(store.delete_auth_token(&token).unwrap());
        assert!(store.get_auth_token(&token).unwrap().is_none());
        assert!(!store.delete_auth_token(&token).unwrap());
    }

    #[test]
    fn password_hasher_matches_stored_hash() {
        let (_dir, store) = test_store();
        let hasher = PasswordHasher;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash("secret123", &salt).unwrap();

        store
            .create_user("alice", "alice@example.com", &hash, &salt, UserRole::User)
            .unwrap();
        let user = store.get_user_by_username("alice").unwrap().unwrap();
        assert!(hasher.verify("secret123", &user.password_hash).unwrap());
        assert!(!hasher.verify("wrong", &user.password_hash).unwrap());
    }
}
