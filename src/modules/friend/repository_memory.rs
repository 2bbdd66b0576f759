use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    api::error,
    modules::friend::{
        repository::{FriendTransaction, PendingWrite, TransactionWork, TransactionalStore},
        schema::{FriendEntity, FriendRequestEntity, RequestKey},
    },
};

#[derive(Debug, Clone, Default)]
pub struct FriendDocuments {
    /// Keyed by document id, as the `friend_requests` primary key.
    pub requests: BTreeMap<String, FriendRequestEntity>,
    /// Keyed by (owner, friend).
    pub friends: BTreeMap<(String, String), FriendEntity>,
}

impl FriendDocuments {
    fn apply(
        &mut self,
        writes: Vec<PendingWrite>,
        committed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), error::SystemError> {
        for write in writes {
            match write {
                PendingWrite::CreateRequest(request) => {
                    if self.requests.contains_key(&request.id) {
                        log::warn!("Request document {} already exists", request.id);
                        return Err(error::SystemError::already_exists("Request was already sent"));
                    }
                    self.requests.insert(request.id.clone(), request);
                }
                PendingWrite::EstablishFriendship { user_a, user_b } => {
                    for (owner_id, friend_id) in [(&user_a, &user_b), (&user_b, &user_a)] {
                        self.friends.insert(
                            (owner_id.clone(), friend_id.clone()),
                            FriendEntity {
                                owner_id: owner_id.clone(),
                                friend_id: friend_id.clone(),
                                added_at: committed_at,
                            },
                        );
                    }
                }
                PendingWrite::DeleteRequest(key) => {
                    self.requests.remove(&key.document_id());
                }
            }
        }

        Ok(())
    }
}

/// In-process store. Transactions run one at a time behind a single lock,
/// which gives serializable isolation without conflict retries.
#[derive(Clone, Default)]
pub struct FriendRepositoryMemory {
    documents: Arc<Mutex<FriendDocuments>>,
}

impl FriendRepositoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> FriendDocuments {
        self.documents.lock().await.clone()
    }
}

struct MemoryTransaction<'d> {
    documents: &'d FriendDocuments,
    writes: Vec<PendingWrite>,
}

#[async_trait::async_trait]
impl FriendTransaction for MemoryTransaction<'_> {
    async fn get_friend_request(
        &mut self,
        key: &RequestKey,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self.documents.requests.get(&key.document_id()).cloned())
    }

    async fn get_friend(
        &mut self,
        owner_id: &str,
        friend_id: &str,
    ) -> Result<Option<FriendEntity>, error::SystemError> {
        let key = (owner_id.to_owned(), friend_id.to_owned());
        Ok(self.documents.friends.get(&key).cloned())
    }

    fn pending_writes(&mut self) -> &mut Vec<PendingWrite> {
        &mut self.writes
    }
}

#[async_trait::async_trait]
impl TransactionalStore for FriendRepositoryMemory {
    async fn run_transaction<T, F>(&self, work: F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: for<'t> Fn(&'t mut dyn FriendTransaction) -> TransactionWork<'t, T>
            + Send
            + Sync
            + 'static,
    {
        let mut documents = self.documents.lock().await;

        let mut tx = MemoryTransaction { documents: &*documents, writes: Vec::new() };
        let value = work(&mut tx).await?;
        let writes = tx.writes;

        // staged on a copy so a rejected write leaves nothing behind
        let mut next = (*documents).clone();
        next.apply(writes, chrono::Utc::now())?;
        *documents = next;
        Ok(value)
    }
}
