//! Database migrations for the post store
//!
//! Each migration is applied atomically and tracked in the schema_version table.

use crate::core_post::errors::StorageResult;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial posts schema",
        up_sql: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,                 -- PostId, never reused
                creator TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                last_updated_at INTEGER NOT NULL
            );

            -- Editors keep their insertion order through `position`
            CREATE TABLE IF NOT EXISTS post_editors (
                post_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                editor TEXT NOT NULL,
                PRIMARY KEY (post_id, position),
                UNIQUE (post_id, editor),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_post_editors_editor ON post_editors(editor);

            CREATE TABLE IF NOT EXISTS post_counter (
                singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
                value INTEGER NOT NULL
            );

            INSERT OR IGNORE INTO post_counter (singleton, value) VALUES (1, 0);

            CREATE TABLE IF NOT EXISTS module_params (
                singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
                max_title_length INTEGER NOT NULL,
                max_body_length INTEGER NOT NULL
            );
        "#,
    }]
}

fn ensure_version_table(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get current schema version from database
pub fn get_current_version(conn: &Connection) -> StorageResult<i32> {
    ensure_version_table(conn)?;

    let version: Option<i32> = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations.
///
/// The version check and the migrations share one immediate transaction, so
/// processes opening a fresh database together apply each migration once.
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> StorageResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current_version = get_current_version(&tx)?;

    let pending: Vec<_> = get_migrations()
        .into_iter()
        .filter(|m| m.version > current_version)
        .collect();

    for migration in &pending {
        tx.execute_batch(migration.up_sql)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;
    }

    tx.commit()?;

    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_pool() -> Pool<SqliteConnectionManager> {
        let manager = SqliteConnectionManager::memory();
        Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("Failed to create pool")
    }

    #[test]
    fn test_initial_migration() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let conn = pool.get().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"posts".to_string()));
        assert!(tables.contains(&"post_editors".to_string()));
        assert!(tables.contains(&"post_counter".to_string()));
        assert!(tables.contains(&"module_params".to_string()));
    }

    #[test]
    fn test_counter_seeded_at_zero() {
        let pool = setup_test_pool();
        migrate(&pool).unwrap();

        let conn = pool.get().unwrap();
        let value: i64 = conn
            .query_row("SELECT value FROM post_counter WHERE singleton = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn test_idempotent_migrations() {
        let pool = setup_test_pool();

        migrate(&pool).expect("First migration failed");
        migrate(&pool).expect("Second migration failed");

        let conn = pool.get().unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_duplicate_editor_rejected_by_schema() {
        let pool = setup_test_pool();
        migrate(&pool).unwrap();
        let conn = pool.get().unwrap();

        conn.execute(
            "INSERT INTO posts (id, creator, title, body, created_at, last_updated_at)
             VALUES (1, 'alice', 't', 'b', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO post_editors (post_id, position, editor) VALUES (1, 0, 'alice')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO post_editors (post_id, position, editor) VALUES (1, 1, 'alice')",
            [],
        );
        assert!(dup.is_err());
    }
}
