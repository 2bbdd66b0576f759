use std::sync::{Arc, LazyLock, Once};

use actix_web::{http::StatusCode, middleware::from_fn, test, web, App};
use serde_json::{json, Value};

use crate::{
    middlewares::authentication,
    modules::friend::{
        repository_memory::FriendRepositoryMemory, route, service::FriendService,
        store::FriendStore,
    },
    utils::Claims,
    ENV,
};

const SECRET: &str = "friendship-test-secret";

static SETUP: Once = Once::new();

fn setup() {
    SETUP.call_once(|| {
        std::env::set_var("SECRET_KEY", SECRET);
        std::env::set_var("STORE_BACKEND", "memory");
        let _ = LazyLock::force(&ENV);
    });
}

fn bearer(user_id: &str) -> (&'static str, String) {
    let token = Claims::new(user_id, 900).encode(SECRET.as_bytes()).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! test_app {
    () => {{
        setup();
        let store = FriendStore::Memory(FriendRepositoryMemory::new());
        let service = FriendService::with_dependencies(Arc::new(store));
        test::init_service(
            App::new().app_data(web::Data::new(service)).service(
                web::scope("/api").wrap(from_fn(authentication)).configure(route::configure),
            ),
        )
        .await
    }};
}

/// Middleware failures surface as `Err` from the service; handler failures
/// are already rendered into responses.
macro_rules! call {
    ($app:expr, $req:expr) => {{
        match test::try_call_service($app, $req.to_request()).await {
            Ok(resp) => {
                let status = resp.status();
                let body: Value = test::read_body_json(resp).await;
                (status, body)
            }
            Err(err) => {
                let resp = err.error_response();
                let status = resp.status();
                let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
                (status, serde_json::from_slice::<Value>(&bytes).unwrap())
            }
        }
    }};
}

fn send(caller: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/friends/requests")
        .insert_header(bearer(caller))
        .set_json(body)
}

fn respond(caller: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/friends/requests/respond")
        .insert_header(bearer(caller))
        .set_json(body)
}

#[actix_web::test]
async fn missing_token_is_unauthenticated() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/friends/requests")
        .set_json(json!({ "receiverId": "bob" }));

    let (status, body) = call!(&app, req);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn forged_token_is_unauthenticated() {
    let app = test_app!();
    let token = Claims::new("alice", 900).encode(b"not-the-secret").unwrap();
    let req = test::TestRequest::post()
        .uri("/api/friends/requests")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "receiverId": "bob" }));

    let (status, _) = call!(&app, req);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn send_then_accept_round_trip() {
    let app = test_app!();

    let (status, body) = call!(&app, send("alice", json!({ "receiverId": "bob" })));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Request sent successfully" }));

    let (status, body) =
        call!(&app, respond("bob", json!({ "senderId": "alice", "action": "accept" })));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Accepted successfully" }));

    let (status, body) =
        call!(&app, respond("bob", json!({ "senderId": "alice", "action": "accept" })));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Friend request does not exist" }));

    let (status, body) = call!(&app, send("alice", json!({ "receiverId": "bob" })));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You are friends already");
}

#[actix_web::test]
async fn duplicate_request_is_conflict() {
    let app = test_app!();
    call!(&app, send("alice", json!({ "receiverId": "bob" })));

    let (status, body) = call!(&app, send("bob", json!({ "receiverId": "alice" })));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Request was already sent");
}

#[actix_web::test]
async fn invalid_payloads_are_bad_requests() {
    let app = test_app!();

    let (status, _) = call!(&app, send("alice", json!({})));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call!(&app, send("alice", json!({ "receiverId": "alice" })));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call!(&app, send("alice", json!({ "receiverId": "b".repeat(200) })));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        call!(&app, respond("bob", json!({ "senderId": "alice", "action": "bogus" })));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Action must be accept or reject.");
}

#[actix_web::test]
async fn body_cannot_choose_the_acting_user() {
    let app = test_app!();

    // a senderId smuggled into the body is ignored; alice is the sender
    call!(&app, send("alice", json!({ "receiverId": "bob", "senderId": "mallory" })));

    let (status, _) =
        call!(&app, respond("bob", json!({ "senderId": "mallory", "action": "accept" })));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        call!(&app, respond("bob", json!({ "senderId": "alice", "action": "reject" })));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rejected successfully");
}
