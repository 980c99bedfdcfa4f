//! Identity and content validation

use crate::core_post::{Params, PostError, PostResult, UserId};

/// Longest identity accepted by [`BasicIdentityValidator`]
pub const MAX_IDENTITY_LENGTH: usize = 128;

/// Checks that an identity string is well formed.
///
/// `field` names the message field being checked and appears in the error.
pub trait IdentityValidator: Send + Sync {
    fn validate(&self, field: &str, identity: &UserId) -> PostResult<()>;
}

/// Accepts non-empty identities of ASCII alphanumerics and `.`, `_`, `:`, `-`
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicIdentityValidator;

impl IdentityValidator for BasicIdentityValidator {
    fn validate(&self, field: &str, identity: &UserId) -> PostResult<()> {
        let value = identity.as_str();

        if value.is_empty() {
            return Err(PostError::invalid_input(format!("empty {field} address")));
        }
        if value.len() > MAX_IDENTITY_LENGTH {
            return Err(PostError::invalid_input(format!(
                "invalid {field} address ({} chars exceeds {MAX_IDENTITY_LENGTH})",
                value.len()
            )));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-')))
        {
            return Err(PostError::invalid_input(format!(
                "invalid {field} address (unexpected character {c:?})"
            )));
        }

        Ok(())
    }
}

impl<V: IdentityValidator + ?Sized> IdentityValidator for Box<V> {
    fn validate(&self, field: &str, identity: &UserId) -> PostResult<()> {
        (**self).validate(field, identity)
    }
}

/// Check title and body against the content limits.
///
/// The title must be non-empty; the body may be empty. Lengths are counted
/// in characters.
pub fn validate_content(title: &str, body: &str, params: &Params) -> PostResult<()> {
    if title.trim().is_empty() {
        return Err(PostError::invalid_input("empty title"));
    }

    let title_len = title.chars().count();
    if title_len > params.max_title_length {
        return Err(PostError::invalid_input(format!(
            "title too long ({title_len} > {})",
            params.max_title_length
        )));
    }

    let body_len = body.chars().count();
    if body_len > params.max_body_length {
        return Err(PostError::invalid_input(format!(
            "body too long ({body_len} > {})",
            params.max_body_length
        )));
    }

    Ok(())
}
