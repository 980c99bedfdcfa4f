//! Authorization rules for post mutations
//!
//! Pure functions over a [`Post`] value and an actor. Nothing here touches
//! storage.
//!
//! | Action          | Required relation                      |
//! |-----------------|----------------------------------------|
//! | Update          | actor is an editor                     |
//! | Delete          | actor is an editor                     |
//! | AddEditor       | actor is the creator                   |
//! | RemoveEditor    | actor is the creator, target is not    |

use super::errors::{PostError, PostResult};
use super::post::Post;
use super::types::UserId;

/// Mutation requested against an existing post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction<'a> {
    Update,
    Delete,
    AddEditor(&'a UserId),
    RemoveEditor(&'a UserId),
}

impl PostAction<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            PostAction::Update => "update",
            PostAction::Delete => "delete",
            PostAction::AddEditor(_) => "add_editor",
            PostAction::RemoveEditor(_) => "remove_editor",
        }
    }
}

/// True iff `actor` appears in the editor list
pub fn is_editor(post: &Post, actor: &UserId) -> bool {
    editor_index(post, actor).is_some()
}

/// True iff `actor` created the post
pub fn is_owner(post: &Post, actor: &UserId) -> bool {
    &post.creator == actor
}

/// Position of `actor` in the editor list
pub fn editor_index(post: &Post, actor: &UserId) -> Option<usize> {
    post.editors.iter().position(|editor| editor == actor)
}

/// Decide whether `actor` may perform `action` on `post`.
///
/// Checks run in the order callers observe them: relation first, then the
/// creator guard, then editor membership.
pub fn authorize(post: &Post, actor: &UserId, action: PostAction<'_>) -> PostResult<()> {
    match action {
        PostAction::Update | PostAction::Delete => {
            if !is_editor(post, actor) {
                return Err(PostError::unauthorized("incorrect editor"));
            }
        }
        PostAction::AddEditor(target) => {
            if !is_owner(post, actor) {
                return Err(PostError::unauthorized("incorrect owner"));
            }
            if is_editor(post, target) {
                return Err(PostError::conflict("editor already exists"));
            }
        }
        PostAction::RemoveEditor(target) => {
            if !is_owner(post, actor) {
                return Err(PostError::unauthorized("incorrect owner"));
            }
            if is_owner(post, target) {
                return Err(PostError::unauthorized(
                    "creator cannot be deleted from editors",
                ));
            }
            if !is_editor(post, target) {
                return Err(PostError::EditorNotFound {
                    post_id: post.id,
                    editor: target.clone(),
                });
            }
        }
    }

    Ok(())
}
