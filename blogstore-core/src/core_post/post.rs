//! Post data structure and in-place mutations

use super::authz;
use super::errors::{PostError, PostResult};
use super::types::{PostId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A Post is the only persisted record of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Sequential identifier, assigned once at creation
    pub id: PostId,

    /// Identity that created the post. Permanent editor.
    pub creator: UserId,

    pub title: String,

    pub body: String,

    /// When the post was created
    pub created_at: Timestamp,

    /// Last time title/body were changed
    pub last_updated_at: Timestamp,

    /// Identities allowed to edit or delete the post, in insertion order.
    /// Always contains `creator`, never contains duplicates.
    pub editors: Vec<UserId>,
}

impl Post {
    /// Build a freshly created post with `creator` as its only editor
    pub fn new(
        id: PostId,
        creator: UserId,
        title: String,
        body: String,
        now: Timestamp,
    ) -> Self {
        Post {
            id,
            editors: vec![creator.clone()],
            creator,
            title,
            body,
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Replace title and body and bump `last_updated_at`
    pub fn apply_update(&mut self, title: String, body: String, now: Timestamp) {
        self.title = title;
        self.body = body;
        self.last_updated_at = now;
    }

    /// Append an editor, preserving the order of existing ones
    pub fn add_editor(&mut self, editor: UserId) -> PostResult<()> {
        if authz::is_editor(self, &editor) {
            return Err(PostError::conflict("editor already exists"));
        }

        self.editors.push(editor);
        Ok(())
    }

    /// Remove an editor, preserving the relative order of the rest
    pub fn remove_editor(&mut self, editor: &UserId) -> PostResult<()> {
        if editor == &self.creator {
            return Err(PostError::unauthorized(
                "creator cannot be deleted from editors",
            ));
        }

        let index = authz::editor_index(self, editor).ok_or_else(|| PostError::EditorNotFound {
            post_id: self.id,
            editor: editor.clone(),
        })?;

        self.editors.remove(index);
        Ok(())
    }

    /// Check the record-level invariants
    pub fn check_invariants(&self) -> bool {
        let creator_present = self.editors.contains(&self.creator);
        let unique = self
            .editors
            .iter()
            .enumerate()
            .all(|(i, e)| !self.editors[..i].contains(e));
        creator_present && unique && self.last_updated_at >= self.created_at
    }
}
