//! SQL-based storage implementation for posts

use super::{migrations, PostBackend, PostTxn, WriteBatch, WriteOp};
use crate::core_post::errors::{StorageError, StorageResult};
use crate::core_post::params::Params;
use crate::core_post::post::Post;
use crate::core_post::types::{PostId, Timestamp, UserId};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw `posts` row before range checks
struct PostRow {
    creator: String,
    title: String,
    body: String,
    created_at: i64,
    last_updated_at: i64,
}

fn to_u64(value: i64, column: &str) -> StorageResult<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Corrupted(format!("negative value {} in {}", value, column)))
}

fn to_i64(value: u64, column: &str) -> StorageResult<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Corrupted(format!("value {} out of range for {}", value, column)))
}

/// SQL-based storage for posts
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteBackend {
    /// Create a new SQL store with the given connection pool
    pub fn new(pool: Pool<SqliteConnectionManager>) -> StorageResult<Self> {
        migrations::migrate(&pool)?;

        Ok(Self { pool })
    }

    /// Open (or create) a database file
    pub fn open(
        path: impl AsRef<Path>,
        pool_size: u32,
        busy_timeout: Duration,
    ) -> StorageResult<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        debug!(path = %path.as_ref().display(), pool_size, "Opened post database");
        Self::new(pool)
    }

    /// Create a new in-memory store.
    ///
    /// The pool holds a single connection since every in-memory SQLite
    /// connection is its own database.
    pub fn memory() -> StorageResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(1).build(manager)?;

        Self::new(pool)
    }

    fn write_post(conn: &Connection, post: &Post, upsert: bool) -> StorageResult<()> {
        let id = to_i64(post.id.get(), "posts.id")?;
        let sql = if upsert {
            "INSERT INTO posts (id, creator, title, body, created_at, last_updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                creator = excluded.creator,
                title = excluded.title,
                body = excluded.body,
                created_at = excluded.created_at,
                last_updated_at = excluded.last_updated_at"
        } else {
            "INSERT INTO posts (id, creator, title, body, created_at, last_updated_at)
             VALUES (?, ?, ?, ?, ?, ?)"
        };

        let inserted = conn.execute(
            sql,
            params![
                id,
                post.creator.as_str(),
                &post.title,
                &post.body,
                to_i64(post.created_at.as_millis(), "posts.created_at")?,
                to_i64(post.last_updated_at.as_millis(), "posts.last_updated_at")?,
            ],
        );
        match inserted {
            Err(rusqlite::Error::SqliteFailure(e, _))
                if !upsert && e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StorageError::DuplicatePost(post.id));
            }
            other => {
                other?;
            }
        }

        // Rewrite the editor list so positions stay dense
        conn.execute("DELETE FROM post_editors WHERE post_id = ?", params![id])?;
        for (position, editor) in post.editors.iter().enumerate() {
            conn.execute(
                "INSERT INTO post_editors (post_id, position, editor) VALUES (?, ?, ?)",
                params![id, position as i64, editor.as_str()],
            )?;
        }

        Ok(())
    }

    fn apply_op(tx: &Connection, op: &WriteOp) -> StorageResult<()> {
        match op {
            WriteOp::InsertPost(post) => Self::write_post(tx, post, false)?,
            WriteOp::PutPost(post) => Self::write_post(tx, post, true)?,
            WriteOp::DeletePost(id) => {
                let id = to_i64(id.get(), "posts.id")?;
                tx.execute("DELETE FROM post_editors WHERE post_id = ?", params![id])?;
                tx.execute("DELETE FROM posts WHERE id = ?", params![id])?;
            }
            WriteOp::PutCounter(value) => {
                tx.execute(
                    "INSERT INTO post_counter (singleton, value) VALUES (1, ?)
                     ON CONFLICT(singleton) DO UPDATE SET value = excluded.value",
                    params![to_i64(*value, "post_counter.value")?],
                )?;
            }
            WriteOp::PutParams(p) => {
                tx.execute(
                    "INSERT INTO module_params (singleton, max_title_length, max_body_length)
                     VALUES (1, ?, ?)
                     ON CONFLICT(singleton) DO UPDATE SET
                        max_title_length = excluded.max_title_length,
                        max_body_length = excluded.max_body_length",
                    params![
                        to_i64(p.max_title_length as u64, "module_params.max_title_length")?,
                        to_i64(p.max_body_length as u64, "module_params.max_body_length")?,
                    ],
                )?;
            }
        }
        Ok(())
    }
}

fn read_post(conn: &Connection, id: PostId) -> StorageResult<Option<Post>> {
    let raw_id = to_i64(id.get(), "posts.id")?;

    let row = conn
        .query_row(
            "SELECT creator, title, body, created_at, last_updated_at
             FROM posts WHERE id = ?",
            params![raw_id],
            |row| {
                Ok(PostRow {
                    creator: row.get(0)?,
                    title: row.get(1)?,
                    body: row.get(2)?,
                    created_at: row.get(3)?,
                    last_updated_at: row.get(4)?,
                })
            },
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT editor FROM post_editors WHERE post_id = ? ORDER BY position")?;
    let editors = stmt
        .query_map(params![raw_id], |row| row.get::<_, String>(0))?
        .map(|editor| editor.map(UserId::new))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Post {
        id,
        creator: UserId::new(row.creator),
        title: row.title,
        body: row.body,
        created_at: Timestamp::from_millis(to_u64(row.created_at, "posts.created_at")?),
        last_updated_at: Timestamp::from_millis(to_u64(
            row.last_updated_at,
            "posts.last_updated_at",
        )?),
        editors,
    }))
}

fn read_counter(conn: &Connection) -> StorageResult<u64> {
    let value: Option<i64> = conn
        .query_row(
            "SELECT value FROM post_counter WHERE singleton = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    to_u64(value.unwrap_or(0), "post_counter.value")
}

fn read_params(conn: &Connection) -> StorageResult<Option<Params>> {
    let row: Option<(i64, i64)> = conn
        .query_row(
            "SELECT max_title_length, max_body_length FROM module_params WHERE singleton = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    row.map(|(title, body)| {
        Ok(Params {
            max_title_length: to_u64(title, "module_params.max_title_length")? as usize,
            max_body_length: to_u64(body, "module_params.max_body_length")? as usize,
        })
    })
    .transpose()
}

impl PostBackend for SqliteBackend {
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        read_post(&*self.pool.get()?, id)
    }

    fn read_counter(&self) -> StorageResult<u64> {
        read_counter(&*self.pool.get()?)
    }

    fn read_params(&self) -> StorageResult<Option<Params>> {
        read_params(&*self.pool.get()?)
    }

    fn begin(&mut self) -> StorageResult<Box<dyn PostTxn + '_>> {
        let conn = self.pool.get()?;
        // Take the write lock before the first read so no other connection,
        // in this process or another, commits in between
        conn.execute_batch("BEGIN IMMEDIATE")?;

        Ok(Box::new(SqliteTxn {
            conn,
            finished: false,
        }))
    }
}

/// An open `BEGIN IMMEDIATE` transaction on one pooled connection
struct SqliteTxn {
    conn: PooledConnection<SqliteConnectionManager>,
    finished: bool,
}

impl PostTxn for SqliteTxn {
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        read_post(&self.conn, id)
    }

    fn read_counter(&self) -> StorageResult<u64> {
        read_counter(&self.conn)
    }

    fn read_params(&self) -> StorageResult<Option<Params>> {
        read_params(&self.conn)
    }

    fn commit(mut self: Box<Self>, batch: WriteBatch) -> StorageResult<()> {
        for op in batch.ops() {
            // Dropping `self` on error rolls the whole batch back
            SqliteBackend::apply_op(&self.conn, op)?;
        }

        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        debug!(writes = batch.len(), "Committed write batch");
        Ok(())
    }
}

impl Drop for SqliteTxn {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "Failed to roll back post transaction");
            }
        }
    }
}
