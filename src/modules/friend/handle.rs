use actix_web::{post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::friend::{
        model::{FriendActionResponse, RespondFriendRequestBody, SendFriendRequestBody},
        service::FriendService,
        store::FriendStore,
    },
    utils::ValidatedJson,
};

pub type FriendSvc = FriendService<FriendStore>;

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<SendFriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendActionResponse>, error::Error> {
    let caller_id = get_claims(&req)?.sub;
    let response =
        friend_service.send_friend_request(&caller_id, body.0.receiver_id.as_deref()).await?;

    Ok(success::Success::ok(response))
}

#[post("/requests/respond")]
pub async fn respond_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<RespondFriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendActionResponse>, error::Error> {
    let caller_id = get_claims(&req)?.sub;
    let RespondFriendRequestBody { sender_id, action } = body.0;
    let response = friend_service
        .respond_friend_request(&caller_id, sender_id.as_deref(), action.as_deref())
        .await?;

    Ok(success::Success::ok(response))
}
