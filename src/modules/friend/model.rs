use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::Validate;

/// Payload of a new friend request. The sender is the authenticated caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendFriendRequestBody {
    #[serde(default)]
    #[validate(length(max = 128, message = "receiverId is too long"))]
    pub receiver_id: Option<String>,
}

/// Payload of an answer to a pending request addressed to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondFriendRequestBody {
    #[serde(default)]
    #[validate(length(max = 128, message = "senderId is too long"))]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendAction {
    Accept,
    Reject,
}

impl FriendAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendAction::Accept => "accept",
            FriendAction::Reject => "reject",
        }
    }
}

impl std::str::FromStr for FriendAction {
    type Err = ();

    /// Exact match only: `"Accept"` or `" accept"` are not actions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(FriendAction::Accept),
            "reject" => Ok(FriendAction::Reject),
            _ => Err(()),
        }
    }
}

/// Result of a committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendActionResponse {
    pub success: bool,
    pub message: Cow<'static, str>,
}

impl FriendActionResponse {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self { success: true, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parsing_is_exact() {
        assert_eq!("accept".parse::<FriendAction>(), Ok(FriendAction::Accept));
        assert_eq!("reject".parse::<FriendAction>(), Ok(FriendAction::Reject));
        assert!("Accept".parse::<FriendAction>().is_err());
        assert!("bogus".parse::<FriendAction>().is_err());
        assert!("".parse::<FriendAction>().is_err());
    }

    #[test]
    fn bodies_use_camel_case_and_tolerate_missing_fields() {
        let body: RespondFriendRequestBody =
            serde_json::from_str(r#"{"senderId":"alice","action":"accept"}"#).unwrap();
        assert_eq!(body.sender_id.as_deref(), Some("alice"));
        assert_eq!(body.action.as_deref(), Some("accept"));

        let body: SendFriendRequestBody = serde_json::from_str("{}").unwrap();
        assert!(body.receiver_id.is_none());
    }

    #[test]
    fn overlong_ids_fail_validation() {
        let body = SendFriendRequestBody { receiver_id: Some("x".repeat(129)) };
        assert!(body.validate().is_err());

        let body = SendFriendRequestBody { receiver_id: Some("x".repeat(128)) };
        assert!(body.validate().is_ok());
    }
}
