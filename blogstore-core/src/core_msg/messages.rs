//! Request messages
//!
//! `creator` is always the identity submitting the message. Each message
//! performs stateless checks in `validate_basic`; anything that needs the
//! stored post is left to the service.

use super::validation::{validate_content, IdentityValidator};
use crate::core_post::{Params, PostId, PostResult, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreatePost {
    pub creator: UserId,
    pub title: String,
    pub body: String,
}

impl MsgCreatePost {
    pub fn new(creator: impl Into<UserId>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn validate_basic(&self, validator: &dyn IdentityValidator, params: &Params) -> PostResult<()> {
        validator.validate("creator", &self.creator)?;
        validate_content(&self.title, &self.body, params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdatePost {
    pub creator: UserId,
    pub id: PostId,
    pub title: String,
    pub body: String,
}

impl MsgUpdatePost {
    pub fn new(
        creator: impl Into<UserId>,
        id: PostId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            creator: creator.into(),
            id,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn validate_basic(&self, validator: &dyn IdentityValidator, params: &Params) -> PostResult<()> {
        validator.validate("creator", &self.creator)?;
        validate_content(&self.title, &self.body, params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeletePost {
    pub creator: UserId,
    pub id: PostId,
}

impl MsgDeletePost {
    pub fn new(creator: impl Into<UserId>, id: PostId) -> Self {
        Self {
            creator: creator.into(),
            id,
        }
    }

    pub fn validate_basic(&self, validator: &dyn IdentityValidator) -> PostResult<()> {
        validator.validate("creator", &self.creator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddEditor {
    pub creator: UserId,
    pub id: PostId,
    pub editor: UserId,
}

impl MsgAddEditor {
    pub fn new(creator: impl Into<UserId>, id: PostId, editor: impl Into<UserId>) -> Self {
        Self {
            creator: creator.into(),
            id,
            editor: editor.into(),
        }
    }

    pub fn validate_basic(&self, validator: &dyn IdentityValidator) -> PostResult<()> {
        validator.validate("creator", &self.creator)?;
        validator.validate("editor", &self.editor)
    }
}

/// Remove an editor from a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeleteEditor {
    pub creator: UserId,
    pub id: PostId,
    pub editor: UserId,
}

impl MsgDeleteEditor {
    pub fn new(creator: impl Into<UserId>, id: PostId, editor: impl Into<UserId>) -> Self {
        Self {
            creator: creator.into(),
            id,
            editor: editor.into(),
        }
    }

    pub fn validate_basic(&self, validator: &dyn IdentityValidator) -> PostResult<()> {
        validator.validate("creator", &self.creator)?;
        validator.validate("editor", &self.editor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub authority: UserId,
    pub params: Params,
}

impl MsgUpdateParams {
    pub fn new(authority: impl Into<UserId>, params: Params) -> Self {
        Self {
            authority: authority.into(),
            params,
        }
    }

    pub fn validate_basic(&self, validator: &dyn IdentityValidator) -> PostResult<()> {
        validator.validate("authority", &self.authority)?;
        self.params.validate()
    }
}

/// Any request the [`MsgServer`](super::MsgServer) can dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    CreatePost(MsgCreatePost),
    UpdatePost(MsgUpdatePost),
    DeletePost(MsgDeletePost),
    AddEditor(MsgAddEditor),
    DeleteEditor(MsgDeleteEditor),
    UpdateParams(MsgUpdateParams),
}

impl Msg {
    /// Identity on whose behalf the message runs
    pub fn signer(&self) -> &UserId {
        match self {
            Msg::CreatePost(m) => &m.creator,
            Msg::UpdatePost(m) => &m.creator,
            Msg::DeletePost(m) => &m.creator,
            Msg::AddEditor(m) => &m.creator,
            Msg::DeleteEditor(m) => &m.creator,
            Msg::UpdateParams(m) => &m.authority,
        }
    }
}

/// Result of a dispatched message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MsgResponse {
    Created { id: PostId },
    Empty {},
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_msg::validation::BasicIdentityValidator;
    use crate::core_post::ErrorKind;

    #[test]
    fn test_create_post_validate_basic() {
        let params = Params::default();

        let ok = MsgCreatePost::new("alice", "title", "");
        assert!(ok.validate_basic(&BasicIdentityValidator, &params).is_ok());

        let bad_creator = MsgCreatePost::new("invalid address", "title", "");
        let err = bad_creator
            .validate_basic(&BasicIdentityValidator, &params)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let no_title = MsgCreatePost::new("alice", "", "body");
        assert!(no_title.validate_basic(&BasicIdentityValidator, &params).is_err());
    }

    #[test]
    fn test_editor_messages_check_both_identities() {
        let add = MsgAddEditor::new("alice", PostId(1), "not valid");
        let err = add.validate_basic(&BasicIdentityValidator).unwrap_err();
        assert!(err.to_string().contains("editor"));

        let remove = MsgDeleteEditor::new("", PostId(1), "bob");
        let err = remove.validate_basic(&BasicIdentityValidator).unwrap_err();
        assert!(err.to_string().contains("creator"));
    }

    #[test]
    fn test_update_params_rejects_zero_limits() {
        let msg = MsgUpdateParams::new(
            "gov",
            Params {
                max_title_length: 0,
                max_body_length: 10,
            },
        );
        assert_eq!(
            msg.validate_basic(&BasicIdentityValidator).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_msg_json_shape() {
        let msg = Msg::AddEditor(MsgAddEditor::new("alice", PostId(3), "bob"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "add_editor");
        assert_eq!(json["id"], 3);
        assert_eq!(json["editor"], "bob");

        let back: Msg = serde_json::from_value(json).unwrap();
        assert_eq!(back.signer(), &UserId::new("alice"));
    }

    #[test]
    fn test_response_json_shape() {
        let created = serde_json::to_value(MsgResponse::Created { id: PostId(7) }).unwrap();
        assert_eq!(created, serde_json::json!({ "id": 7 }));

        let empty = serde_json::to_value(MsgResponse::Empty {}).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }
}
