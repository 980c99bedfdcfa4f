//! Record store: keyed access to posts over a [`PostBackend`]

use super::allocator::IdAllocator;
use super::errors::{PostError, PostResult};
use super::params::Params;
use super::post::Post;
use super::storage::{PostBackend, PostTxn, WriteBatch};
use super::types::PostId;
use tracing::debug;

/// Owns the persisted representation of posts.
///
/// Callers receive copies; every change goes back through the store.
/// `modify`, `remove_if` and `insert_new` run their reads, checks and
/// write in one backend transaction.
pub struct PostStore<B: PostBackend> {
    backend: B,
    allocator: IdAllocator,
}

impl<B: PostBackend> PostStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            allocator: IdAllocator::new(),
        }
    }

    /// Get a post by id
    pub fn get(&self, id: PostId) -> PostResult<Post> {
        debug!(post_id = %id, "Loading post");
        self.backend.read_post(id)?.ok_or(PostError::NotFound(id))
    }

    /// Whether a live post exists for `id`
    pub fn contains(&self, id: PostId) -> PostResult<bool> {
        Ok(self.backend.read_post(id)?.is_some())
    }

    /// Unconditional upsert under `id`
    pub fn set(&mut self, id: PostId, post: &Post) -> PostResult<()> {
        let mut record = post.clone();
        record.id = id;

        let mut batch = WriteBatch::new();
        batch.put_post(record);
        self.backend.commit(batch)?;
        Ok(())
    }

    /// Unconditional removal; absent ids are not an error
    pub fn delete(&mut self, id: PostId) -> PostResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete_post(id);
        self.backend.commit(batch)?;
        Ok(())
    }

    /// Number of posts ever created, deleted ones included
    pub fn count(&self) -> PostResult<u64> {
        Ok(self.allocator.count(&self.backend)?)
    }

    /// Allocate an id and insert the record built for it in one commit
    pub fn insert_new<F>(&mut self, build: F) -> PostResult<Post>
    where
        F: FnOnce(PostId) -> Post,
    {
        let txn = self.backend.begin()?;
        let mut batch = WriteBatch::new();
        let id = self.allocator.next_id(&*txn, &mut batch)?;

        let mut post = build(id);
        post.id = id;
        batch.insert_post(post.clone());

        txn.commit(batch)?;
        Ok(post)
    }

    /// Load `id`, let `change` check and edit it, then write it back.
    ///
    /// Nothing is written when `change` fails.
    pub fn modify<T, F>(&mut self, id: PostId, change: F) -> PostResult<T>
    where
        F: FnOnce(&mut Post) -> PostResult<T>,
    {
        let txn = self.backend.begin()?;
        let mut post = txn.read_post(id)?.ok_or(PostError::NotFound(id))?;

        let value = change(&mut post)?;
        post.id = id;

        let mut batch = WriteBatch::new();
        batch.put_post(post);
        txn.commit(batch)?;
        Ok(value)
    }

    /// Load `id` and delete it if `check` accepts it
    pub fn remove_if<F>(&mut self, id: PostId, check: F) -> PostResult<Post>
    where
        F: FnOnce(&Post) -> PostResult<()>,
    {
        let txn = self.backend.begin()?;
        let post = txn.read_post(id)?.ok_or(PostError::NotFound(id))?;
        check(&post)?;

        let mut batch = WriteBatch::new();
        batch.delete_post(id);
        txn.commit(batch)?;
        Ok(post)
    }

    /// Persisted params, if any
    pub fn params(&self) -> PostResult<Option<Params>> {
        Ok(self.backend.read_params()?)
    }

    pub fn set_params(&mut self, params: Params) -> PostResult<()> {
        let mut batch = WriteBatch::new();
        batch.put_params(params);
        self.backend.commit(batch)?;
        Ok(())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
