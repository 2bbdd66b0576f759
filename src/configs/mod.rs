use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    api::error,
    constants::StoreBackend,
    modules::friend::{
        repository_memory::FriendRepositoryMemory, repository_pg::FriendRepositoryPg,
        store::FriendStore,
    },
    ENV,
};

pub async fn connect_database(database_url: &str) -> Result<PgPool, error::SystemError> {
    let pool = PgPoolOptions::new()
        .max_connections(ENV.db_max_connections)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| error::SystemError::InternalError(Box::new(e)))?;
    log::info!("Database migrations applied");

    Ok(pool)
}

pub async fn build_store() -> Result<FriendStore, error::SystemError> {
    match ENV.store_backend {
        StoreBackend::Postgres => {
            let database_url = ENV.database_url.as_deref().ok_or_else(|| {
                error::SystemError::InternalError("DATABASE_URL is not set".into())
            })?;
            let pool = connect_database(database_url).await?;
            Ok(FriendStore::Postgres(FriendRepositoryPg::new(pool, ENV.transaction_max_attempts)))
        }
        StoreBackend::Memory => {
            log::warn!("Using in-memory store; state is lost on restart");
            Ok(FriendStore::Memory(FriendRepositoryMemory::new()))
        }
    }
}
