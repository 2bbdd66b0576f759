use crate::{
    api::error,
    modules::friend::{
        repository::{FriendTransaction, TransactionWork, TransactionalStore},
        repository_memory::FriendRepositoryMemory,
        repository_pg::FriendRepositoryPg,
    },
};

/// Backend picked from `STORE_BACKEND` at startup.
#[derive(Clone)]
pub enum FriendStore {
    Postgres(FriendRepositoryPg),
    Memory(FriendRepositoryMemory),
}

#[async_trait::async_trait]
impl TransactionalStore for FriendStore {
    async fn run_transaction<T, F>(&self, work: F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: for<'t> Fn(&'t mut dyn FriendTransaction) -> TransactionWork<'t, T>
            + Send
            + Sync
            + 'static,
    {
        match self {
            FriendStore::Postgres(store) => store.run_transaction(work).await,
            FriendStore::Memory(store) => store.run_transaction(work).await,
        }
    }
}
