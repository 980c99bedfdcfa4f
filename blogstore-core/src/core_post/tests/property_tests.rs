/*
    Randomized operation sequences

    Runs arbitrary interleavings of create/update/delete/add/remove from a
    small pool of users against the service and a plain reference model,
    checking after every step that:
    1. Returned ids are strictly increasing and count() tracks creations
    2. Every live post keeps its creator as an editor, without duplicates
    3. Outcomes follow the editor/owner boundary
    4. Rejected operations leave the store unchanged
*/

use crate::core_post::{
    ErrorKind, MemoryBackend, NoopSink, Post, PostId, PostService, Timestamp, UserId,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

#[derive(Debug, Clone)]
enum Op {
    Create { creator: usize },
    Update { post: u64, actor: usize },
    Delete { post: u64, actor: usize },
    AddEditor { post: u64, actor: usize, editor: usize },
    RemoveEditor { post: u64, actor: usize, editor: usize },
}

fn user() -> impl Strategy<Value = usize> {
    0..USERS.len()
}

// Ids up to 8 so that some operations target posts never created
fn post_id() -> impl Strategy<Value = u64> {
    1..8u64
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        user().prop_map(|creator| Op::Create { creator }),
        (post_id(), user()).prop_map(|(post, actor)| Op::Update { post, actor }),
        (post_id(), user()).prop_map(|(post, actor)| Op::Delete { post, actor }),
        (post_id(), user(), user())
            .prop_map(|(post, actor, editor)| Op::AddEditor { post, actor, editor }),
        (post_id(), user(), user())
            .prop_map(|(post, actor, editor)| Op::RemoveEditor { post, actor, editor }),
    ]
}

fn uid(index: usize) -> UserId {
    UserId::new(USERS[index])
}

/// Expected outcome computed from the reference model alone
fn expected(model: &BTreeMap<u64, Post>, op: &Op) -> Result<(), ErrorKind> {
    let post = match op {
        Op::Create { .. } => return Ok(()),
        Op::Update { post, .. }
        | Op::Delete { post, .. }
        | Op::AddEditor { post, .. }
        | Op::RemoveEditor { post, .. } => model.get(post).ok_or(ErrorKind::NotFound)?,
    };

    match op {
        Op::Create { .. } => Ok(()),
        Op::Update { actor, .. } | Op::Delete { actor, .. } => {
            if post.editors.contains(&uid(*actor)) {
                Ok(())
            } else {
                Err(ErrorKind::Unauthorized)
            }
        }
        Op::AddEditor { actor, editor, .. } => {
            if post.creator != uid(*actor) {
                Err(ErrorKind::Unauthorized)
            } else if post.editors.contains(&uid(*editor)) {
                Err(ErrorKind::Conflict)
            } else {
                Ok(())
            }
        }
        Op::RemoveEditor { actor, editor, .. } => {
            if post.creator != uid(*actor) || post.creator == uid(*editor) {
                Err(ErrorKind::Unauthorized)
            } else if !post.editors.contains(&uid(*editor)) {
                Err(ErrorKind::NotFound)
            } else {
                Ok(())
            }
        }
    }
}

fn snapshot(service: &PostService<MemoryBackend, NoopSink>, upto: u64) -> BTreeMap<u64, Post> {
    (1..=upto)
        .filter_map(|id| service.get_post(PostId(id)).ok().map(|post| (id, post)))
        .collect()
}

proptest! {
    #[test]
    fn prop_random_operations_preserve_invariants(ops in prop::collection::vec(op(), 1..60)) {
        let mut service = PostService::without_events(MemoryBackend::new(), UserId::new("gov"));
        let mut model: BTreeMap<u64, Post> = BTreeMap::new();
        let mut created: u64 = 0;
        let mut last_id: u64 = 0;

        for (step, op) in ops.iter().enumerate() {
            let now = Timestamp(step as u64 + 1);
            let want = expected(&model, op);
            let before = snapshot(&service, 8.max(created));

            let got: Result<(), ErrorKind> = match op {
                Op::Create { creator } => {
                    let id = service
                        .create_post(uid(*creator), "t".to_string(), "b".to_string(), now)
                        .unwrap();
                    prop_assert!(id.get() > last_id);
                    last_id = id.get();
                    created += 1;
                    model.insert(
                        id.get(),
                        Post::new(id, uid(*creator), "t".to_string(), "b".to_string(), now),
                    );
                    Ok(())
                }
                Op::Update { post, actor } => service
                    .update_post(PostId(*post), &uid(*actor), format!("t{step}"), format!("b{step}"), now)
                    .map_err(|e| e.kind()),
                Op::Delete { post, actor } => service
                    .delete_post(PostId(*post), &uid(*actor))
                    .map_err(|e| e.kind()),
                Op::AddEditor { post, actor, editor } => service
                    .add_editor(PostId(*post), &uid(*actor), uid(*editor))
                    .map_err(|e| e.kind()),
                Op::RemoveEditor { post, actor, editor } => service
                    .remove_editor(PostId(*post), &uid(*actor), &uid(*editor))
                    .map_err(|e| e.kind()),
            };

            prop_assert_eq!(got, want, "step {} op {:?}", step, op);

            if got.is_err() {
                prop_assert_eq!(&snapshot(&service, 8.max(created)), &before);
            } else {
                match op {
                    Op::Create { .. } => {}
                    Op::Update { post, .. } => {
                        let record = model.get_mut(post).unwrap();
                        let prior = record.clone();
                        record.apply_update(format!("t{step}"), format!("b{step}"), now);
                        let stored = service.get_post(PostId(*post)).unwrap();
                        prop_assert_eq!(&stored.editors, &prior.editors);
                        prop_assert_eq!(stored.created_at, prior.created_at);
                        prop_assert_eq!(stored.last_updated_at, now);
                    }
                    Op::Delete { post, .. } => {
                        model.remove(post);
                    }
                    Op::AddEditor { post, editor, .. } => {
                        model.get_mut(post).unwrap().editors.push(uid(*editor));
                    }
                    Op::RemoveEditor { post, editor, .. } => {
                        model.get_mut(post).unwrap().editors.retain(|e| e != &uid(*editor));
                    }
                }
            }

            prop_assert_eq!(service.post_count().unwrap(), created);
            let live = snapshot(&service, 8.max(created));
            prop_assert_eq!(&live, &model);
            for post in live.values() {
                prop_assert!(post.check_invariants());
            }
        }
    }

    #[test]
    fn prop_creator_never_removable(extra in prop::collection::vec(1..USERS.len(), 0..3), actor in user()) {
        let mut service = PostService::without_events(MemoryBackend::new(), UserId::new("gov"));
        let id = service
            .create_post(uid(0), "t".to_string(), "b".to_string(), Timestamp(1))
            .unwrap();
        for editor in extra {
            let _ = service.add_editor(id, &uid(0), uid(editor));
        }

        let err = service.remove_editor(id, &uid(actor), &uid(0)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Unauthorized);
        prop_assert!(service.get_post(id).unwrap().editors.contains(&uid(0)));
    }
}
