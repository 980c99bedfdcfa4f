//! In-memory substrate
//!
//! Used for tests and ephemeral stores.

use super::{PostBackend, PostTxn, WriteBatch, WriteOp};
use crate::core_post::errors::{StorageError, StorageResult};
use crate::core_post::params::Params;
use crate::core_post::post::Post;
use crate::core_post::types::PostId;
use std::collections::HashMap;

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    posts: HashMap<PostId, Post>,
    counter: u64,
    params: Option<Params>,
    fail_next_commit: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail without applying anything
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    /// Number of live posts
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl MemoryBackend {
    fn apply(&mut self, batch: WriteBatch) -> StorageResult<()> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            return Err(StorageError::Injected(format!(
                "commit of {} writes rejected",
                batch.len()
            )));
        }

        // Checked up front so a rejected batch applies nothing
        for op in batch.ops() {
            if let WriteOp::InsertPost(post) = op {
                if self.posts.contains_key(&post.id) {
                    return Err(StorageError::DuplicatePost(post.id));
                }
            }
        }

        for op in batch.into_ops() {
            match op {
                WriteOp::InsertPost(post) | WriteOp::PutPost(post) => {
                    self.posts.insert(post.id, post);
                }
                WriteOp::DeletePost(id) => {
                    self.posts.remove(&id);
                }
                WriteOp::PutCounter(value) => self.counter = value,
                WriteOp::PutParams(params) => self.params = Some(params),
            }
        }

        Ok(())
    }
}

impl PostBackend for MemoryBackend {
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        Ok(self.posts.get(&id).cloned())
    }

    fn read_counter(&self) -> StorageResult<u64> {
        Ok(self.counter)
    }

    fn read_params(&self) -> StorageResult<Option<Params>> {
        Ok(self.params)
    }

    fn begin(&mut self) -> StorageResult<Box<dyn PostTxn + '_>> {
        Ok(Box::new(MemoryTxn { backend: self }))
    }
}

/// Exclusive borrow of the backend; nothing else can write until it ends
struct MemoryTxn<'a> {
    backend: &'a mut MemoryBackend,
}

impl PostTxn for MemoryTxn<'_> {
    fn read_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        self.backend.read_post(id)
    }

    fn read_counter(&self) -> StorageResult<u64> {
        self.backend.read_counter()
    }

    fn read_params(&self) -> StorageResult<Option<Params>> {
        self.backend.read_params()
    }

    fn commit(self: Box<Self>, batch: WriteBatch) -> StorageResult<()> {
        let MemoryTxn { backend } = *self;
        backend.apply(batch)
    }
}
