//! Connection pool and schema set-up for the SQLite store.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id BLOB PRIMARY KEY NOT NULL,
        title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 200),
        description TEXT,
        status TEXT NOT NULL DEFAULT 'todo',
        priority INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 5),
        due_date TEXT,
        created_at TEXT NOT NULL,
        created_by BLOB NOT NULL REFERENCES users (id),
        assigned_to BLOB REFERENCES users (id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at, id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_assigned_to ON tasks (assigned_to)",
];

/// Opens a pool to `database_url`.
///
/// For `sqlite::memory:` every connection is a separate database, so the pool is pinned to a
/// single connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);
    let in_memory = database_url.contains(":memory:");

    let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory {
        1
    } else {
        max_connections.max(1)
    });
    if in_memory {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options.connect_with(options).await
}

/// Creates tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    log::debug!("database schema ready");
    Ok(())
}
