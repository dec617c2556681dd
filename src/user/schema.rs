//! SQLite schema for the user database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, Schema, SqlType, Table, DEFAULT_TIMESTAMP,
};

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("username", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("email", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_hash", SqlType::Text, non_null = true),
        sqlite_column!("salt", SqlType::Text, non_null = true),
        sqlite_column!("role", SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_users_username", "username")],
    unique_constraints: &[],
};

const AUTH_TOKENS_TABLE: Table = Table {
    name: "auth_tokens",
    columns: &[
        sqlite_column!("token", SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "user_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "created",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_auth_tokens_user", "user_id")],
    unique_constraints: &[],
};

pub const USERS_SCHEMA: Schema = Schema {
    version: 1,
    tables: &[USERS_TABLE, AUTH_TOKENS_TABLE],
};
