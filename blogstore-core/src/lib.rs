//! Post store and authorization engine
//!
//! - [`core_post`]: posts, id allocation, storage substrates, authorization
//!   rules and the operations facade
//! - [`core_msg`]: request messages, input validation and dispatch
//! - [`config`], [`logging`], [`metrics`]: ambient services

pub mod config;
pub mod core_msg;
pub mod core_post;
pub mod logging;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use core_msg::{Msg, MsgResponse, MsgServer};
pub use core_post::{ErrorKind, Post, PostError, PostEvent, PostId, PostService, UserId};
pub use logging::{init_logging, LogLevel};
