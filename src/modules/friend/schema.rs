use serde::Serialize;
use sqlx::prelude::FromRow;

/// Identity of a pending request: the ordered pair (sender, receiver).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub sender: String,
    pub receiver: String,
}

impl RequestKey {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self { sender: sender.into(), receiver: receiver.into() }
    }

    pub fn reversed(&self) -> Self {
        Self { sender: self.receiver.clone(), receiver: self.sender.clone() }
    }

    /// Document id, `"<sender>_<receiver>"`.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.sender, self.receiver)
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.sender, self.receiver)
    }
}

/// A pending friend request. Existence is the pending state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct FriendRequestEntity {
    pub id: String,
    pub sender: String,
    pub receiver: String,
}

impl FriendRequestEntity {
    pub fn new(key: &RequestKey) -> Self {
        Self { id: key.document_id(), sender: key.sender.clone(), receiver: key.receiver.clone() }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.sender.clone(), self.receiver.clone())
    }
}

/// One direction of a friendship, owned by `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct FriendEntity {
    pub owner_id: String,
    pub friend_id: String,
    pub added_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_sender_then_receiver() {
        let key = RequestKey::new("alice", "bob");
        assert_eq!(key.document_id(), "alice_bob");
        assert_eq!(key.reversed().document_id(), "bob_alice");
    }

    #[test]
    fn entity_carries_its_key() {
        let key = RequestKey::new("alice", "bob");
        let entity = FriendRequestEntity::new(&key);
        assert_eq!(entity.id, "alice_bob");
        assert_eq!(entity.key(), key);
    }
}
