/*
    core_post - Post store and authorization engine

    Authoritative state for blog posts:
    - Sequential id allocation
    - Keyed record store over a pluggable substrate (memory, SQLite)
    - Editor/owner authorization rules
    - Operations facade emitting events after each committed mutation
*/

pub mod allocator;
pub mod authz;
pub mod errors;
pub mod events;
pub mod params;
pub mod post;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod tests;

pub use allocator::IdAllocator;
pub use authz::{authorize, PostAction};
pub use errors::{ErrorKind, PostError, PostResult, StorageError, StorageResult};
pub use events::{EventBroadcaster, EventKind, EventSink, NoopSink, PostEvent};
pub use params::Params;
pub use post::Post;
pub use service::PostService;
pub use storage::{MemoryBackend, PostBackend, PostTxn, SqliteBackend, WriteBatch, WriteOp};
pub use store::PostStore;
pub use types::{PostId, Timestamp, UserId};
