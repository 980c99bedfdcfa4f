//! Message server: validate, timestamp, dispatch

use super::clock::{Clock, SystemClock};
use super::messages::{
    Msg, MsgAddEditor, MsgCreatePost, MsgDeleteEditor, MsgDeletePost, MsgResponse,
    MsgUpdateParams, MsgUpdatePost,
};
use super::validation::{BasicIdentityValidator, IdentityValidator};
use crate::core_post::{EventSink, PostBackend, PostId, PostResult, PostService};
use tracing::debug;

/// Front door for externally supplied requests.
///
/// Rejects malformed identities and content with `InvalidInput` before the
/// service is touched, and supplies `now` for create and update.
pub struct MsgServer<B, S, C = SystemClock, V = BasicIdentityValidator>
where
    B: PostBackend,
    S: EventSink,
{
    service: PostService<B, S>,
    clock: C,
    validator: V,
}

impl<B: PostBackend, S: EventSink> MsgServer<B, S> {
    /// Server using the wall clock and the default identity rules
    pub fn new(service: PostService<B, S>) -> Self {
        Self::with_parts(service, SystemClock, BasicIdentityValidator)
    }
}

impl<B, S, C, V> MsgServer<B, S, C, V>
where
    B: PostBackend,
    S: EventSink,
    C: Clock,
    V: IdentityValidator,
{
    pub fn with_parts(service: PostService<B, S>, clock: C, validator: V) -> Self {
        Self {
            service,
            clock,
            validator,
        }
    }

    pub fn create_post(&mut self, msg: MsgCreatePost) -> PostResult<PostId> {
        let params = self.service.params()?;
        msg.validate_basic(&self.validator, &params)?;

        let now = self.clock.now();
        self.service.create_post(msg.creator, msg.title, msg.body, now)
    }

    pub fn update_post(&mut self, msg: MsgUpdatePost) -> PostResult<()> {
        let params = self.service.params()?;
        msg.validate_basic(&self.validator, &params)?;

        let now = self.clock.now();
        self.service
            .update_post(msg.id, &msg.creator, msg.title, msg.body, now)
    }

    pub fn delete_post(&mut self, msg: MsgDeletePost) -> PostResult<()> {
        msg.validate_basic(&self.validator)?;
        self.service.delete_post(msg.id, &msg.creator)
    }

    pub fn add_editor(&mut self, msg: MsgAddEditor) -> PostResult<()> {
        msg.validate_basic(&self.validator)?;
        self.service.add_editor(msg.id, &msg.creator, msg.editor)
    }

    pub fn delete_editor(&mut self, msg: MsgDeleteEditor) -> PostResult<()> {
        msg.validate_basic(&self.validator)?;
        self.service.remove_editor(msg.id, &msg.creator, &msg.editor)
    }

    pub fn update_params(&mut self, msg: MsgUpdateParams) -> PostResult<()> {
        msg.validate_basic(&self.validator)?;
        self.service.update_params(&msg.authority, msg.params)
    }

    /// Dispatch any message
    pub fn handle(&mut self, msg: Msg) -> PostResult<MsgResponse> {
        debug!(signer = %msg.signer(), "Handling message");

        match msg {
            Msg::CreatePost(m) => self.create_post(m).map(|id| MsgResponse::Created { id }),
            Msg::UpdatePost(m) => self.update_post(m).map(|_| MsgResponse::Empty {}),
            Msg::DeletePost(m) => self.delete_post(m).map(|_| MsgResponse::Empty {}),
            Msg::AddEditor(m) => self.add_editor(m).map(|_| MsgResponse::Empty {}),
            Msg::DeleteEditor(m) => self.delete_editor(m).map(|_| MsgResponse::Empty {}),
            Msg::UpdateParams(m) => self.update_params(m).map(|_| MsgResponse::Empty {}),
        }
    }

    pub fn service(&self) -> &PostService<B, S> {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut PostService<B, S> {
        &mut self.service
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_service(self) -> PostService<B, S> {
        self.service
    }
}
