use std::future::Future;

use sqlx::Postgres;

use crate::{
    api::error,
    modules::friend::{
        repository::{FriendTransaction, PendingWrite, TransactionWork, TransactionalStore},
        schema::{FriendEntity, FriendRequestEntity, RequestKey},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
    max_attempts: u32,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool, max_attempts: u32) -> Self {
        Self { pool, max_attempts: max_attempts.max(1) }
    }

    async fn attempt<T, F>(&self, work: &F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: for<'t> Fn(&'t mut dyn FriendTransaction) -> TransactionWork<'t, T> + Send + Sync,
    {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE").execute(&mut *tx).await?;

        let mut friend_tx = PgFriendTransaction { tx, writes: Vec::new() };
        // an Err here drops the transaction, which rolls it back
        let value = work(&mut friend_tx).await?;

        let PgFriendTransaction { mut tx, writes } = friend_tx;
        for write in &writes {
            apply_write(&mut tx, write).await?;
        }

        tx.commit().await?;
        Ok(value)
    }
}

async fn apply_write(
    tx: &mut sqlx::Transaction<'static, Postgres>,
    write: &PendingWrite,
) -> Result<(), error::SystemError> {
    match write {
        PendingWrite::CreateRequest(request) => {
            sqlx::query("INSERT INTO friend_requests (id, sender, receiver) VALUES ($1, $2, $3)")
                .bind(&request.id)
                .bind(&request.sender)
                .bind(&request.receiver)
                .execute(&mut **tx)
                .await?;
        }
        PendingWrite::EstablishFriendship { user_a, user_b } => {
            // NOW() is fixed for the whole transaction, so both rows match
            sqlx::query(
                r#"
                INSERT INTO user_friends (owner_id, friend_id, added_at)
                VALUES ($1, $2, NOW()), ($2, $1, NOW())
                "#,
            )
            .bind(user_a)
            .bind(user_b)
            .execute(&mut **tx)
            .await?;
        }
        PendingWrite::DeleteRequest(key) => {
            sqlx::query("DELETE FROM friend_requests WHERE id = $1")
                .bind(key.document_id())
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(())
}

struct PgFriendTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
    writes: Vec<PendingWrite>,
}

#[async_trait::async_trait]
impl FriendTransaction for PgFriendTransaction {
    async fn get_friend_request(
        &mut self,
        key: &RequestKey,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT id, sender, receiver FROM friend_requests WHERE id = $1",
        )
        .bind(key.document_id())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(request)
    }

    async fn get_friend(
        &mut self,
        owner_id: &str,
        friend_id: &str,
    ) -> Result<Option<FriendEntity>, error::SystemError> {
        let friend = sqlx::query_as::<_, FriendEntity>(
            r#"
            SELECT owner_id, friend_id, added_at
            FROM user_friends
            WHERE owner_id = $1 AND friend_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(friend_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(friend)
    }

    fn pending_writes(&mut self) -> &mut Vec<PendingWrite> {
        &mut self.writes
    }
}

#[async_trait::async_trait]
impl TransactionalStore for FriendRepositoryPg {
    async fn run_transaction<T, F>(&self, work: F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: for<'t> Fn(&'t mut dyn FriendTransaction) -> TransactionWork<'t, T>
            + Send
            + Sync
            + 'static,
    {
        retry_on_conflict(self.max_attempts, |_| self.attempt(&work)).await
    }
}

/// Runs `attempt` (numbered from 1) until it returns something other than a
/// retryable conflict, or `max_attempts` runs have been spent.
async fn retry_on_conflict<T, Fut, A>(
    max_attempts: u32,
    mut attempt: A,
) -> Result<T, error::SystemError>
where
    A: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, error::SystemError>>,
{
    let mut n = 1;
    loop {
        match attempt(n).await {
            Err(e) if e.is_retryable() && n < max_attempts => {
                log::warn!("Transaction conflict on attempt {n}, retrying: {e}");
                n += 1;
            }
            result => return result,
        }
    }
}
