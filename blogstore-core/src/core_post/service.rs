//! Post operations: create, update, delete and editor management
//!
//! Every operation loads the record, runs all checks, and only then writes.
//! A rejected operation never writes and never emits an event; an event is
//! emitted exactly when the write committed.
//!
//! ## Concurrency
//!
//! Mutations take `&mut self` and run synchronously. Each read-check-write
//! runs inside one backend transaction ([`PostBackend::begin`]), so services
//! in different threads or processes sharing a substrate never interleave
//! on the same record or the counter. Sharing one service value across
//! threads still needs a `Mutex`.

use super::authz::{self, PostAction};
use super::errors::{ErrorKind, PostError, PostResult};
use super::events::{EventSink, NoopSink, PostEvent};
use super::params::Params;
use super::post::Post;
use super::storage::PostBackend;
use super::store::PostStore;
use super::types::{PostId, Timestamp, UserId};
use crate::metrics::{self, Timer};
use tracing::{error, info, warn};

/// Facade composing the record store, allocator and authorization rules
pub struct PostService<B: PostBackend, S: EventSink = NoopSink> {
    store: PostStore<B>,
    events: S,
    authority: UserId,
    genesis_params: Params,
}

impl<B: PostBackend> PostService<B, NoopSink> {
    /// Service that discards events
    pub fn without_events(backend: B, authority: UserId) -> Self {
        Self::new(backend, NoopSink, authority)
    }
}

impl<B: PostBackend, S: EventSink> PostService<B, S> {
    /// Create a service over `backend`.
    ///
    /// `authority` is the only identity allowed to change params.
    pub fn new(backend: B, events: S, authority: UserId) -> Self {
        Self {
            store: PostStore::new(backend),
            events,
            authority,
            genesis_params: Params::default(),
        }
    }

    /// Params reported until the authority first updates them
    pub fn with_genesis_params(mut self, params: Params) -> Self {
        self.genesis_params = params;
        self
    }

    // ===== Mutations =====

    /// Create a post. Anyone may create.
    pub fn create_post(
        &mut self,
        creator: UserId,
        title: String,
        body: String,
        now: Timestamp,
    ) -> PostResult<PostId> {
        let timer = Self::begin("create");
        let result = self.try_create(creator, title, body, now);
        Self::finish("create", timer, result)
    }

    /// Replace title and body. Requires the actor to be an editor.
    pub fn update_post(
        &mut self,
        id: PostId,
        actor: &UserId,
        title: String,
        body: String,
        now: Timestamp,
    ) -> PostResult<()> {
        let timer = Self::begin("update");
        let result = self.try_update(id, actor, title, body, now);
        Self::finish("update", timer, result)
    }

    /// Delete a post permanently. Requires the actor to be an editor.
    pub fn delete_post(&mut self, id: PostId, actor: &UserId) -> PostResult<()> {
        let timer = Self::begin("delete");
        let result = self.try_delete(id, actor);
        Self::finish("delete", timer, result)
    }

    /// Grant edit rights. Only the creator may add editors.
    pub fn add_editor(&mut self, id: PostId, actor: &UserId, editor: UserId) -> PostResult<()> {
        let timer = Self::begin("add_editor");
        let result = self.try_add_editor(id, actor, editor);
        Self::finish("add_editor", timer, result)
    }

    /// Revoke edit rights. Only the creator may remove editors, and the
    /// creator itself can never be removed.
    pub fn remove_editor(
        &mut self,
        id: PostId,
        actor: &UserId,
        editor: &UserId,
    ) -> PostResult<()> {
        let timer = Self::begin("remove_editor");
        let result = self.try_remove_editor(id, actor, editor);
        Self::finish("remove_editor", timer, result)
    }

    /// Replace params. Only the configured authority may do this.
    pub fn update_params(&mut self, authority: &UserId, params: Params) -> PostResult<()> {
        let timer = Self::begin("update_params");
        let result = self.try_update_params(authority, params);
        Self::finish("update_params", timer, result)
    }

    // ===== Queries =====

    pub fn get_post(&self, id: PostId) -> PostResult<Post> {
        self.store.get(id)
    }

    /// Number of posts ever created
    pub fn post_count(&self) -> PostResult<u64> {
        self.store.count()
    }

    /// Current params
    pub fn params(&self) -> PostResult<Params> {
        Ok(self.store.params()?.unwrap_or(self.genesis_params))
    }

    pub fn authority(&self) -> &UserId {
        &self.authority
    }

    pub fn store(&self) -> &PostStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PostStore<B> {
        &mut self.store
    }

    pub fn events(&self) -> &S {
        &self.events
    }

    // ===== Internals =====

    fn begin(operation: &'static str) -> Timer {
        metrics::record_operation(operation);
        Timer::new(operation)
    }

    fn finish<T>(operation: &'static str, timer: Timer, result: PostResult<T>) -> PostResult<T> {
        timer.stop();

        if let Err(err) = &result {
            let kind = err.kind();
            metrics::record_error(operation, kind);
            if kind == ErrorKind::Storage {
                error!(operation, error = %err, "Post operation failed in storage");
            } else {
                warn!(operation, error = %err, "Post operation rejected");
            }
        }

        result
    }

    fn try_create(
        &mut self,
        creator: UserId,
        title: String,
        body: String,
        now: Timestamp,
    ) -> PostResult<PostId> {
        let post = self
            .store
            .insert_new(|id| Post::new(id, creator, title, body, now))?;

        info!(post_id = %post.id, creator = %post.creator, "Created post");
        metrics::record_counter(metrics::POSTS_CREATED, 1);
        self.events.emit(PostEvent::PostCreated {
            post_id: post.id,
            creator: post.creator,
            title: post.title,
        });

        Ok(post.id)
    }

    fn try_update(
        &mut self,
        id: PostId,
        actor: &UserId,
        title: String,
        body: String,
        now: Timestamp,
    ) -> PostResult<()> {
        self.store.modify(id, |post| {
            authz::authorize(post, actor, PostAction::Update)?;
            if now < post.created_at {
                return Err(PostError::invalid_input(format!(
                    "update time {} precedes creation time {}",
                    now, post.created_at
                )));
            }

            post.apply_update(title, body, now);
            Ok(())
        })?;

        info!(post_id = %id, editor = %actor, "Updated post");
        self.events.emit(PostEvent::PostUpdated {
            post_id: id,
            editor: actor.clone(),
            update_time: now,
        });

        Ok(())
    }

    fn try_delete(&mut self, id: PostId, actor: &UserId) -> PostResult<()> {
        self.store
            .remove_if(id, |post| authz::authorize(post, actor, PostAction::Delete))?;

        info!(post_id = %id, deleter = %actor, "Deleted post");
        metrics::record_counter(metrics::POSTS_DELETED, 1);
        self.events.emit(PostEvent::PostDeleted {
            post_id: id,
            deleter: actor.clone(),
        });

        Ok(())
    }

    fn try_add_editor(&mut self, id: PostId, actor: &UserId, editor: UserId) -> PostResult<()> {
        self.store.modify(id, |post| {
            authz::authorize(post, actor, PostAction::AddEditor(&editor))?;
            post.add_editor(editor.clone())
        })?;

        info!(post_id = %id, creator = %actor, editor = %editor, "Added editor");
        metrics::record_counter(metrics::EDITORS_CHANGED, 1);
        self.events.emit(PostEvent::EditorAdded {
            post_id: id,
            creator: actor.clone(),
            editor,
        });

        Ok(())
    }

    fn try_remove_editor(
        &mut self,
        id: PostId,
        actor: &UserId,
        editor: &UserId,
    ) -> PostResult<()> {
        self.store.modify(id, |post| {
            authz::authorize(post, actor, PostAction::RemoveEditor(editor))?;
            post.remove_editor(editor)
        })?;

        info!(post_id = %id, creator = %actor, editor = %editor, "Removed editor");
        metrics::record_counter(metrics::EDITORS_CHANGED, 1);
        self.events.emit(PostEvent::EditorRemoved {
            post_id: id,
            creator: actor.clone(),
            editor: editor.clone(),
        });

        Ok(())
    }

    fn try_update_params(&mut self, authority: &UserId, params: Params) -> PostResult<()> {
        if authority != &self.authority {
            return Err(PostError::unauthorized(format!(
                "invalid authority; expected {}, got {}",
                self.authority, authority
            )));
        }
        params.validate()?;

        self.store.set_params(params)?;

        info!(authority = %authority, params = %params, "Updated params");
        self.events.emit(PostEvent::ParamsUpdated {
            authority: authority.clone(),
            params,
        });

        Ok(())
    }
}
