//! Test fixtures for creating common test objects
//!
//! Provides builder patterns and factory functions for creating test data.

use crate::core_post::{
    ErrorKind, EventBroadcaster, MemoryBackend, NoopSink, Post, PostEvent, PostId, PostResult,
    PostService, SqliteBackend, StorageResult, Timestamp, UserId,
};
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;

/// Authority used by every fixture service
pub const TEST_AUTHORITY: &str = "gov";

/// Builder for creating test posts
pub struct PostBuilder {
    id: u64,
    creator: String,
    title: String,
    body: String,
    created_at: u64,
    updated_at: Option<u64>,
    editors: Vec<String>,
}

impl PostBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            creator: "alice".to_string(),
            title: format!("Post {}", id),
            body: "body".to_string(),
            created_at: 1_000,
            updated_at: None,
            editors: Vec::new(),
        }
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn created_at(mut self, millis: u64) -> Self {
        self.created_at = millis;
        self
    }

    pub fn updated_at(mut self, millis: u64) -> Self {
        self.updated_at = Some(millis);
        self
    }

    /// Extra editor appended after the creator
    pub fn editor(mut self, editor: impl Into<String>) -> Self {
        self.editors.push(editor.into());
        self
    }

    pub fn build(self) -> Post {
        let mut post = Post::new(
            PostId(self.id),
            UserId::new(self.creator),
            self.title,
            self.body,
            Timestamp(self.created_at),
        );
        if let Some(updated) = self.updated_at {
            post.last_updated_at = Timestamp(updated);
        }
        for editor in self.editors {
            let editor = UserId::new(editor);
            if !post.editors.contains(&editor) {
                post.editors.push(editor);
            }
        }
        post
    }
}

/// In-memory service that discards events
pub fn memory_service() -> PostService<MemoryBackend, NoopSink> {
    PostService::without_events(MemoryBackend::new(), UserId::new(TEST_AUTHORITY))
}

/// In-memory service with a subscribed event receiver
pub fn observed_service() -> (
    PostService<MemoryBackend, EventBroadcaster>,
    broadcast::Receiver<PostEvent>,
) {
    let events = EventBroadcaster::new(256);
    let rx = events.subscribe();
    (
        PostService::new(MemoryBackend::new(), events, UserId::new(TEST_AUTHORITY)),
        rx,
    )
}

/// SQLite-backed service over a database file at `path`
pub fn sqlite_service(path: &Path) -> StorageResult<PostService<SqliteBackend, NoopSink>> {
    let backend = SqliteBackend::open(path, 2, Duration::from_secs(1))?;
    Ok(PostService::without_events(backend, UserId::new(TEST_AUTHORITY)))
}

/// Drain every event currently buffered in `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<PostEvent>) -> Vec<PostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert that `result` failed with `kind` and return the error message
pub fn assert_kind<T: std::fmt::Debug>(result: PostResult<T>, kind: ErrorKind) -> String {
    match result {
        Ok(value) => panic!("Expected {:?}, got Ok({:?})", kind, value),
        Err(e) => {
            assert_eq!(e.kind(), kind, "unexpected error: {}", e);
            e.to_string()
        }
    }
}
