use futures_util::future::BoxFuture;

use crate::api::error;
use crate::modules::friend::schema::{FriendEntity, FriendRequestEntity, RequestKey};

/// A write staged inside a transaction. Nothing is visible to other
/// transactions until the store commits the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    CreateRequest(FriendRequestEntity),
    /// Both directed friendship records, stamped with one commit timestamp.
    EstablishFriendship { user_a: String, user_b: String },
    DeleteRequest(RequestKey),
}

/// Reads see committed state; writes are buffered and applied at commit in
/// the order they were staged.
#[async_trait::async_trait]
pub trait FriendTransaction: Send {
    /// Fetches the request stored under `key.document_id()`. Ids containing
    /// `_` can map two pairs onto one document, so the result may belong to
    /// a different pair; compare its `key()` before acting on it.
    async fn get_friend_request(
        &mut self,
        key: &RequestKey,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn get_friend(
        &mut self,
        owner_id: &str,
        friend_id: &str,
    ) -> Result<Option<FriendEntity>, error::SystemError>;

    fn pending_writes(&mut self) -> &mut Vec<PendingWrite>;

    fn create_friend_request(&mut self, key: &RequestKey) {
        self.pending_writes().push(PendingWrite::CreateRequest(FriendRequestEntity::new(key)));
    }

    fn establish_friendship(&mut self, user_a: &str, user_b: &str) {
        self.pending_writes().push(PendingWrite::EstablishFriendship {
            user_a: user_a.to_owned(),
            user_b: user_b.to_owned(),
        });
    }

    fn delete_friend_request(&mut self, key: &RequestKey) {
        self.pending_writes().push(PendingWrite::DeleteRequest(key.clone()));
    }
}

pub type TransactionWork<'t, T> = BoxFuture<'t, Result<T, error::SystemError>>;

#[async_trait::async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Runs `work` inside one atomic transaction. The store may call `work`
    /// more than once when it loses a conflict; an `Err` from `work` aborts
    /// without applying any staged write.
    async fn run_transaction<T, F>(&self, work: F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: for<'t> Fn(&'t mut dyn FriendTransaction) -> TransactionWork<'t, T>
            + Send
            + Sync
            + 'static;
}
