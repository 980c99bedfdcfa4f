//! Module parameters governed by a single authority

use super::errors::{PostError, PostResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MAX_TITLE_LENGTH: usize = 140;
pub const DEFAULT_MAX_BODY_LENGTH: usize = 4096;

/// Content limits enforced by the message validation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub max_title_length: usize,
    pub max_body_length: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            max_body_length: DEFAULT_MAX_BODY_LENGTH,
        }
    }
}

impl Params {
    pub fn validate(&self) -> PostResult<()> {
        if self.max_title_length == 0 {
            return Err(PostError::invalid_input(
                "max_title_length must be greater than 0",
            ));
        }
        if self.max_body_length == 0 {
            return Err(PostError::invalid_input(
                "max_body_length must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_title_length:{} max_body_length:{}",
            self.max_title_length, self.max_body_length
        )
    }
}
