//! Storage substrate for posts
//!
//! The store sits on a linearized key-value substrate. Every backend must
//! guarantee that:
//! - a committed [`WriteBatch`] is applied entirely or not at all
//! - reads observe the latest committed batch and nothing uncommitted
//! - no other writer commits between the reads of a [`PostTxn`] and its
//!   commit, even when other processes share the substrate
//!
//! Persisted layout is one entry per post id, one singleton counter entry
//! and one singleton params entry.

pub mod memory_store;
pub mod migrations;
pub mod sql_store;

pub use memory_store::MemoryBackend;
pub use migrations::{migrate, CURRENT_SCHEMA_VERSION};
pub use sql_store::SqliteBackend;

use super::errors::StorageResult;
use super::params::Params;
use super::post::Post;
use super::types::PostId;

/// A single staged write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Store a record under an id that must not be taken
    InsertPost(Post),
    PutPost(Post),
    DeletePost(PostId),
    PutCounter(u64),
    PutParams(Params),
}

/// Ordered set of writes committed atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&mut self, post: Post) -> &mut Self {
        self.ops.push(WriteOp::InsertPost(post));
        self
    }

    pub fn put_post(&mut self, post: Post) -> &mut Self {
        self.ops.push(WriteOp::PutPost(post));
        self
    }

    pub fn delete_post(&mut self, id: PostId) -> &mut Self {
        self.ops.push(WriteOp::DeletePost(id));
        self
    }

    pub fn put_counter(&mut self, value: u64) -> &mut Self {
        self.ops.push(WriteOp::PutCounter(value));
        self
    }

    pub fn put_params(&mut self, params: Params) -> &mut Self {
        self.ops.push(WriteOp::PutParams(params));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Reads and a single commit that execute as one unit.
///
/// Dropping a transaction without committing discards it.
pub trait PostTxn {
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>>;

    fn read_counter(&self) -> StorageResult<u64>;

    fn read_params(&self) -> StorageResult<Option<Params>>;

    /// Apply every write in `batch` atomically and end the transaction
    fn commit(self: Box<Self>, batch: WriteBatch) -> StorageResult<()>;
}

/// Key-value substrate holding posts, the allocator counter and params.
///
/// Backends are synchronous. Every read-check-write goes through
/// [`PostBackend::begin`], which excludes other writers until the
/// transaction commits or is dropped.
pub trait PostBackend: Send {
    /// Load a post by id
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>>;

    /// Load the allocator counter. A fresh substrate returns 0.
    fn read_counter(&self) -> StorageResult<u64>;

    /// Load persisted params, if any were ever written
    fn read_params(&self) -> StorageResult<Option<Params>>;

    /// Start a write transaction
    fn begin(&mut self) -> StorageResult<Box<dyn PostTxn + '_>>;

    /// Apply `batch` in a transaction of its own
    fn commit(&mut self, batch: WriteBatch) -> StorageResult<()> {
        self.begin()?.commit(batch)
    }
}

impl<B: PostBackend + ?Sized> PostBackend for Box<B> {
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        (**self).read_post(id)
    }

    fn read_counter(&self) -> StorageResult<u64> {
        (**self).read_counter()
    }

    fn read_params(&self) -> StorageResult<Option<Params>> {
        (**self).read_params()
    }

    fn begin(&mut self) -> StorageResult<Box<dyn PostTxn + '_>> {
        (**self).begin()
    }

    fn commit(&mut self, batch: WriteBatch) -> StorageResult<()> {
        (**self).commit(batch)
    }
}
