//! Post events
//!
//! Emitted by [`PostService`](super::service::PostService) once a mutation
//! has committed, for consumption by notification collaborators.

use super::params::Params;
use super::types::{PostId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub const ATTRIBUTE_KEY_POST_ID: &str = "post_id";
pub const ATTRIBUTE_KEY_CREATOR: &str = "creator";
pub const ATTRIBUTE_KEY_TITLE: &str = "title";
pub const ATTRIBUTE_KEY_DELETER: &str = "deleter";
pub const ATTRIBUTE_KEY_EDITOR: &str = "editor";
pub const ATTRIBUTE_KEY_UPDATE_TIME: &str = "update_time";
pub const ATTRIBUTE_KEY_AUTHORITY: &str = "authority";
pub const ATTRIBUTE_KEY_PARAMS: &str = "params";

/// Event kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CreatePost,
    UpdatePost,
    DeletePost,
    AddEditor,
    DeleteEditor,
    UpdateParams,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CreatePost => "create_post",
            EventKind::UpdatePost => "update_post",
            EventKind::DeletePost => "delete_post",
            EventKind::AddEditor => "add_editor",
            EventKind::DeleteEditor => "delete_editor",
            EventKind::UpdateParams => "update_params",
        }
    }
}

/// Committed mutation notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostEvent {
    PostCreated {
        post_id: PostId,
        creator: UserId,
        title: String,
    },

    PostUpdated {
        post_id: PostId,
        editor: UserId,
        update_time: Timestamp,
    },

    PostDeleted {
        post_id: PostId,
        deleter: UserId,
    },

    EditorAdded {
        post_id: PostId,
        creator: UserId,
        editor: UserId,
    },

    EditorRemoved {
        post_id: PostId,
        creator: UserId,
        editor: UserId,
    },

    ParamsUpdated {
        authority: UserId,
        params: Params,
    },
}

impl PostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PostEvent::PostCreated { .. } => EventKind::CreatePost,
            PostEvent::PostUpdated { .. } => EventKind::UpdatePost,
            PostEvent::PostDeleted { .. } => EventKind::DeletePost,
            PostEvent::EditorAdded { .. } => EventKind::AddEditor,
            PostEvent::EditorRemoved { .. } => EventKind::DeleteEditor,
            PostEvent::ParamsUpdated { .. } => EventKind::UpdateParams,
        }
    }

    /// Post the event refers to. Params updates are module-wide.
    pub fn post_id(&self) -> Option<PostId> {
        match self {
            PostEvent::PostCreated { post_id, .. }
            | PostEvent::PostUpdated { post_id, .. }
            | PostEvent::PostDeleted { post_id, .. }
            | PostEvent::EditorAdded { post_id, .. }
            | PostEvent::EditorRemoved { post_id, .. } => Some(*post_id),
            PostEvent::ParamsUpdated { .. } => None,
        }
    }

    /// Identity that performed the mutation
    pub fn actor(&self) -> &UserId {
        match self {
            PostEvent::PostCreated { creator, .. } => creator,
            PostEvent::PostUpdated { editor, .. } => editor,
            PostEvent::PostDeleted { deleter, .. } => deleter,
            PostEvent::EditorAdded { creator, .. } => creator,
            PostEvent::EditorRemoved { creator, .. } => creator,
            PostEvent::ParamsUpdated { authority, .. } => authority,
        }
    }

    /// Flat key/value attributes
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            PostEvent::PostCreated {
                post_id,
                creator,
                title,
            } => vec![
                (ATTRIBUTE_KEY_POST_ID, post_id.to_string()),
                (ATTRIBUTE_KEY_CREATOR, creator.to_string()),
                (ATTRIBUTE_KEY_TITLE, title.clone()),
            ],
            PostEvent::PostUpdated {
                post_id,
                editor,
                update_time,
            } => vec![
                (ATTRIBUTE_KEY_POST_ID, post_id.to_string()),
                (ATTRIBUTE_KEY_CREATOR, editor.to_string()),
                (ATTRIBUTE_KEY_UPDATE_TIME, update_time.to_string()),
            ],
            PostEvent::PostDeleted { post_id, deleter } => vec![
                (ATTRIBUTE_KEY_POST_ID, post_id.to_string()),
                (ATTRIBUTE_KEY_DELETER, deleter.to_string()),
            ],
            PostEvent::EditorAdded {
                post_id,
                creator,
                editor,
            }
            | PostEvent::EditorRemoved {
                post_id,
                creator,
                editor,
            } => vec![
                (ATTRIBUTE_KEY_POST_ID, post_id.to_string()),
                (ATTRIBUTE_KEY_CREATOR, creator.to_string()),
                (ATTRIBUTE_KEY_EDITOR, editor.to_string()),
            ],
            PostEvent::ParamsUpdated { authority, params } => vec![
                (ATTRIBUTE_KEY_AUTHORITY, authority.to_string()),
                (ATTRIBUTE_KEY_PARAMS, params.to_string()),
            ],
        }
    }
}

/// Receiver of committed mutation events
pub trait EventSink {
    fn emit(&self, event: PostEvent);
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: PostEvent) {
        (**self).emit(event)
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: PostEvent) {}
}

/// Event broadcaster for post events
///
/// Uses a tokio broadcast channel so any number of subscribers can follow
/// committed mutations. Emitting with no subscribers is not an error.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<PostEvent>,
}

impl EventBroadcaster {
    /// Create a broadcaster buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PostEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventSink for EventBroadcaster {
    fn emit(&self, event: PostEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> PostEvent {
        PostEvent::PostCreated {
            post_id: PostId(1),
            creator: UserId::new("alice"),
            title: "Hello".to_string(),
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = created();
        assert_eq!(event.kind(), EventKind::CreatePost);
        assert_eq!(event.kind().as_str(), "create_post");
        assert_eq!(event.post_id(), Some(PostId(1)));
        assert_eq!(event.actor(), &UserId::new("alice"));
    }

    #[test]
    fn test_attributes_use_wire_keys() {
        let event = PostEvent::PostDeleted {
            post_id: PostId(4),
            deleter: UserId::new("bob"),
        };
        assert_eq!(
            event.attributes(),
            vec![("post_id", "4".to_string()), ("deleter", "bob".to_string())]
        );
    }

    #[test]
    fn test_params_event_has_no_post() {
        let event = PostEvent::ParamsUpdated {
            authority: UserId::new("gov"),
            params: Params::default(),
        };
        assert_eq!(event.post_id(), None);
        assert_eq!(event.kind().as_str(), "update_params");
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let json = serde_json::to_value(created()).unwrap();
        assert_eq!(json["kind"], "post_created");
        assert_eq!(json["post_id"], 1);
    }

    #[tokio::test]
    async fn test_broadcaster_delivers_to_subscriber() {
        let broadcaster = EventBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.emit(created());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, created());
    }

    #[test]
    fn test_emit_without_subscribers() {
        let broadcaster = EventBroadcaster::default();
        broadcaster.emit(created());
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
