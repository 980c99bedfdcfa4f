//! Message layer
//!
//! Validates externally supplied requests before they reach the post core:
//! identities are checked by an [`IdentityValidator`], titles and bodies
//! against the current [`Params`](crate::core_post::Params). The
//! [`MsgServer`] reads the clock and dispatches valid messages to a
//! [`PostService`](crate::core_post::PostService).

pub mod clock;
pub mod messages;
pub mod server;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use messages::{
    Msg, MsgAddEditor, MsgCreatePost, MsgDeleteEditor, MsgDeletePost, MsgResponse,
    MsgUpdateParams, MsgUpdatePost,
};
pub use server::MsgServer;
pub use validation::{validate_content, BasicIdentityValidator, IdentityValidator};
