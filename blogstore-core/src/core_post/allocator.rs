//! Sequential identifier allocation

use super::errors::{StorageError, StorageResult};
use super::storage::{PostBackend, PostTxn, WriteBatch};
use super::types::PostId;

/// Hands out strictly increasing post identifiers.
///
/// The counter lives in the substrate. `next_id` reads it inside the
/// caller's transaction and stages the increment into the caller's batch,
/// so the new id only becomes visible when that batch (which also carries
/// the new record) commits. A failed commit leaves the counter untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdAllocator;

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator
    }

    /// Reserve the next identifier within `batch`
    pub fn next_id(&self, txn: &dyn PostTxn, batch: &mut WriteBatch) -> StorageResult<PostId> {
        let next = txn
            .read_counter()?
            .checked_add(1)
            .ok_or_else(|| StorageError::Corrupted("post counter overflow".to_string()))?;

        batch.put_counter(next);
        Ok(PostId(next))
    }

    /// Number of identifiers ever allocated
    pub fn count<B: PostBackend + ?Sized>(&self, backend: &B) -> StorageResult<u64> {
        backend.read_counter()
    }
}
