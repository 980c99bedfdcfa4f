/*
    Authorization boundary tests

    Each mutation is attempted by the creator, a co-editor and a stranger.
    Rejected attempts must leave the stored record untouched.
*/

use crate::core_post::{
    ErrorKind, MemoryBackend, NoopSink, Post, PostError, PostId, PostService, Timestamp, UserId,
};

struct Fixture {
    service: PostService<MemoryBackend, NoopSink>,
    id: PostId,
    creator: UserId,
    editor: UserId,
    stranger: UserId,
}

impl Fixture {
    fn new() -> Self {
        let creator = UserId::new("alice");
        let editor = UserId::new("bob");
        let stranger = UserId::new("mallory");

        let mut service = PostService::without_events(MemoryBackend::new(), UserId::new("gov"));
        let id = service
            .create_post(creator.clone(), "T".to_string(), "B".to_string(), Timestamp(1))
            .unwrap();
        service.add_editor(id, &creator, editor.clone()).unwrap();

        Self {
            service,
            id,
            creator,
            editor,
            stranger,
        }
    }

    fn snapshot(&self) -> Post {
        self.service.get_post(self.id).unwrap()
    }

    fn assert_rejected_unchanged(&self, before: &Post, result: Result<(), PostError>, kind: ErrorKind) {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), kind, "unexpected error: {err}");
        assert_eq!(&self.snapshot(), before);
    }
}

#[test]
fn test_update_allowed_for_any_editor() {
    let mut f = Fixture::new();
    let (id, creator, editor) = (f.id, f.creator.clone(), f.editor.clone());

    f.service
        .update_post(id, &creator, "a".to_string(), "a".to_string(), Timestamp(2))
        .unwrap();
    f.service
        .update_post(id, &editor, "b".to_string(), "b".to_string(), Timestamp(3))
        .unwrap();

    let post = f.snapshot();
    assert_eq!(post.title, "b");
    assert_eq!(post.last_updated_at, Timestamp(3));
}

#[test]
fn test_update_rejected_for_stranger() {
    let mut f = Fixture::new();
    let before = f.snapshot();
    let (id, stranger) = (f.id, f.stranger.clone());

    let result = f
        .service
        .update_post(id, &stranger, "x".to_string(), "x".to_string(), Timestamp(9));

    f.assert_rejected_unchanged(&before, result, ErrorKind::Unauthorized);
}

#[test]
fn test_co_editor_may_delete() {
    let mut f = Fixture::new();
    let (id, editor) = (f.id, f.editor.clone());

    f.service.delete_post(id, &editor).unwrap();
    assert_eq!(f.service.get_post(id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_delete_rejection_reports_incorrect_editor() {
    let mut f = Fixture::new();
    let (id, stranger) = (f.id, f.stranger.clone());

    let err = f.service.delete_post(id, &stranger).unwrap_err();
    assert_eq!(err.to_string(), "incorrect editor: unauthorized");
}

#[test]
fn test_co_editor_cannot_manage_editors() {
    let mut f = Fixture::new();
    let before = f.snapshot();
    let (id, editor, stranger, creator) =
        (f.id, f.editor.clone(), f.stranger.clone(), f.creator.clone());

    let result = f.service.add_editor(id, &editor, stranger.clone());
    f.assert_rejected_unchanged(&before, result, ErrorKind::Unauthorized);

    let result = f.service.remove_editor(id, &editor, &editor);
    f.assert_rejected_unchanged(&before, result, ErrorKind::Unauthorized);

    let result = f.service.remove_editor(id, &editor, &creator);
    f.assert_rejected_unchanged(&before, result, ErrorKind::Unauthorized);
}

#[test]
fn test_owner_check_precedes_membership_check() {
    let mut f = Fixture::new();
    let before = f.snapshot();
    let (id, stranger, editor) = (f.id, f.stranger.clone(), f.editor.clone());

    // Already-present editor, but the actor is not the owner
    let result = f.service.add_editor(id, &stranger, editor);
    f.assert_rejected_unchanged(&before, result, ErrorKind::Unauthorized);

    // Non-member target, but the actor is not the owner
    let result = f.service.remove_editor(id, &stranger, &UserId::new("nobody"));
    f.assert_rejected_unchanged(&before, result, ErrorKind::Unauthorized);
}

#[test]
fn test_removing_non_member_is_not_found() {
    let mut f = Fixture::new();
    let before = f.snapshot();
    let (id, creator, stranger) = (f.id, f.creator.clone(), f.stranger.clone());

    let result = f.service.remove_editor(id, &creator, &stranger);
    let err = result.as_ref().unwrap_err();
    assert!(matches!(err, PostError::EditorNotFound { .. }));
    f.assert_rejected_unchanged(&before, result, ErrorKind::NotFound);
}

#[test]
fn test_missing_post_reported_before_authorization() {
    let mut f = Fixture::new();
    let stranger = f.stranger.clone();
    let missing = PostId(42);

    let cases = vec![
        f.service
            .update_post(missing, &stranger, "x".to_string(), "x".to_string(), Timestamp(5)),
        f.service.delete_post(missing, &stranger),
        f.service.add_editor(missing, &stranger, UserId::new("x")),
        f.service.remove_editor(missing, &stranger, &UserId::new("x")),
    ];

    for result in cases {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
