use std::sync::Arc;

use crate::{
    api::error,
    modules::friend::{
        model::{FriendAction, FriendActionResponse},
        repository::{FriendTransaction, TransactionWork, TransactionalStore},
        schema::RequestKey,
    },
};

fn require_caller(caller_id: &str) -> Result<&str, error::SystemError> {
    if caller_id.is_empty() {
        log::error!("No auth");
        return Err(error::SystemError::unauthenticated("Reauth required"));
    }
    Ok(caller_id)
}

fn require_field<'a>(
    value: Option<&'a str>,
    message: &'static str,
) -> Result<&'a str, error::SystemError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            log::warn!("{message}");
            Err(error::SystemError::invalid_argument(message))
        }
    }
}

fn parse_action(action: Option<&str>) -> Result<FriendAction, error::SystemError> {
    action.and_then(|a| a.parse::<FriendAction>().ok()).ok_or_else(|| {
        log::warn!("Invalid action: {action:?}");
        error::SystemError::invalid_argument("Action must be accept or reject.")
    })
}

/// Pending request and friendship transitions. All state lives in the store;
/// the service itself is stateless and cheap to clone.
#[derive(Clone)]
pub struct FriendService<S>
where
    S: TransactionalStore + 'static,
{
    store: Arc<S>,
}

impl<S> FriendService<S>
where
    S: TransactionalStore + 'static,
{
    pub fn with_dependencies(store: Arc<S>) -> Self {
        log::info!("FriendService initialized with dependencies");
        FriendService { store }
    }

    /// Runs `work` as one transaction on its own task, so it completes or
    /// aborts even if the caller stops waiting.
    async fn commit<T, F>(&self, work: F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: for<'t> Fn(&'t mut dyn FriendTransaction) -> TransactionWork<'t, T>
            + Send
            + Sync
            + 'static,
    {
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move { store.run_transaction(work).await });

        handle.await.map_err(|e| error::SystemError::InternalError(Box::new(e)))?
    }

    /// `NONE -> PENDING` for the ordered pair (caller, receiver).
    pub async fn send_friend_request(
        &self,
        caller_id: &str,
        receiver_id: Option<&str>,
    ) -> Result<FriendActionResponse, error::SystemError> {
        let sender_id = require_caller(caller_id)?;
        let receiver_id = require_field(receiver_id, "No ID of friend")?;

        if sender_id == receiver_id {
            log::warn!("User {sender_id} tried to befriend themselves");
            return Err(error::SystemError::invalid_argument(
                "You cannot send a request to yourself",
            ));
        }

        let key = RequestKey::new(sender_id, receiver_id);
        let work_key = key.clone();
        self.commit(move |tx| {
            let key = work_key.clone();
            Box::pin(async move {
                let outgoing = tx.get_friend_request(&key).await?;
                let incoming = tx.get_friend_request(&key.reversed()).await?;
                if outgoing.is_some() || incoming.is_some() {
                    return Err(error::SystemError::already_exists("Request was already sent"));
                }

                if tx.get_friend(&key.sender, &key.receiver).await?.is_some() {
                    return Err(error::SystemError::already_exists("You are friends already"));
                }

                tx.create_friend_request(&key);
                Ok::<_, error::SystemError>(())
            })
        })
        .await?;

        log::info!("Request sent: {key}");
        Ok(FriendActionResponse::new("Request sent successfully"))
    }

    /// `PENDING -> FRIENDS` or `PENDING -> NONE` for the request addressed to
    /// the caller by `sender_id`.
    pub async fn respond_friend_request(
        &self,
        caller_id: &str,
        sender_id: Option<&str>,
        action: Option<&str>,
    ) -> Result<FriendActionResponse, error::SystemError> {
        let receiver_id = require_caller(caller_id)?;
        let sender_id = require_field(sender_id, "No sender id provided")?;
        let action = parse_action(action)?;

        // always keyed sender -> caller
        let key = RequestKey::new(sender_id, receiver_id);
        let work_key = key.clone();
        let message = self
            .commit(move |tx| {
                let key = work_key.clone();
                Box::pin(async move {
                    let request = tx.get_friend_request(&key).await?;
                    // a document under the same id may belong to another pair
                    if !matches!(request, Some(ref r) if r.key() == key) {
                        log::warn!("Request {key} does not exist");
                        return Err(error::SystemError::not_found("Friend request does not exist"));
                    }

                    let message = match action {
                        FriendAction::Accept => {
                            tx.establish_friendship(&key.receiver, &key.sender);
                            "Accepted successfully"
                        }
                        FriendAction::Reject => "Rejected successfully",
                    };

                    tx.delete_friend_request(&key);
                    Ok::<_, error::SystemError>(message)
                })
            })
            .await?;

        log::info!("{message}: {key} ({})", action.as_str());
        Ok(FriendActionResponse::new(message))
    }
}
