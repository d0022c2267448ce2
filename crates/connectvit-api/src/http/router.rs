//! Axum router configuration with middleware.
//!
//! REST routes live under `/api`, the realtime socket at `/ws`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.server.cors_permissive {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let api_routes = Router::new()
        // Users
        .route("/signup", post(handlers::user::signup))
        .route("/login", post(handlers::user::login))
        .route("/users", get(handlers::user::list_users))
        .route("/user-profile", get(handlers::user::user_profile))
        .route("/update-bio", post(handlers::user::update_bio))
        // Message history
        .route("/messages", get(handlers::message::direct_messages))
        .route("/chat-history", get(handlers::message::chat_history))
        // Groups
        .route("/groups", get(handlers::group::user_groups))
        .route("/all-groups", get(handlers::group::all_groups))
        .route("/groups/create", post(handlers::group::create_group))
        .route("/groups/{id}", get(handlers::group::group_details))
        .route("/groups/{id}/members", post(handlers::group::add_member))
        .route("/groups/{id}/messages", get(handlers::message::group_messages))
        .route("/groups/{id}/leave", post(handlers::group::leave_group))
        // Posts
        .route("/posts", get(handlers::post::feed))
        .route("/posts/create", post(handlers::post::create_post))
        .route("/posts/{id}/like", post(handlers::post::toggle_like));

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/ws", get(handlers::ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use connectvit_core::realtime::room_for_direct;
    use connectvit_infra::gateway::Gateway;
    use connectvit_types::config::ServerConfig;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    use super::*;

    /// Serve the router on an ephemeral port backed by a fresh SQLite file.
    async fn spawn_app() -> (tempfile::TempDir, String, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::default();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
        let gateway = Gateway::connect(&url, &config.database).await.unwrap();
        let state = AppState::with_gateway(gateway, config);
        let app_state = state.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (dir, format!("http://{addr}"), app_state)
    }

    async fn signup(client: &reqwest::Client, base: &str, username: &str) -> reqwest::Response {
        client
            .post(format!("{base}/api/signup"))
            .json(&json!({
                "fullName": username.to_uppercase(),
                "username": username,
                "email": format!("{username}@vitstudent.ac.in"),
                "password": "hunter2",
            }))
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn root_and_health() {
        let (_dir, base, _) = spawn_app().await;
        let body = reqwest::get(format!("{base}/")).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ConnectVit Backend is Running!");

        let health: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["database"], "sqlite");
    }

    #[tokio::test]
    async fn signup_login_and_profile() {
        let (_dir, base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        assert_eq!(signup(&client, &base, "alice").await.status(), 201);
        assert_eq!(signup(&client, &base, "alice").await.status(), 409);

        let bad_email = client
            .post(format!("{base}/api/signup"))
            .json(&json!({
                "fullName": "Mallory",
                "username": "mallory",
                "email": "mallory@gmail.com",
                "password": "pw",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_email.status(), 400);
        let err: Value = bad_email.json().await.unwrap();
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let login: Value = client
            .post(format!("{base}/api/login"))
            .json(&json!({ "username": "alice", "password": "hunter2" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(login["user"]["username"], "alice");
        assert!(login["user"].get("password_hash").is_none());

        let wrong = client
            .post(format!("{base}/api/login"))
            .json(&json!({ "username": "alice", "password": "nope" }))
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), 401);

        client
            .post(format!("{base}/api/update-bio"))
            .json(&json!({ "username": "alice", "bio": "CSE, final year" }))
            .send()
            .await
            .unwrap();
        let profile: Value = reqwest::get(format!("{base}/api/user-profile?username=alice"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(profile["bio"], "CSE, final year");

        let missing = reqwest::get(format!("{base}/api/user-profile?username=nobody"))
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn group_lifecycle() {
        let (_dir, base, _) = spawn_app().await;
        let client = reqwest::Client::new();
        signup(&client, &base, "alice").await;
        signup(&client, &base, "bob").await;

        let created = client
            .post(format!("{base}/api/groups/create"))
            .json(&json!({ "name": "ML Club", "username": "alice" }))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status(), 201);
        let group_id = created.json::<Value>().await.unwrap()["group_id"].as_i64().unwrap();

        let forbidden = client
            .post(format!("{base}/api/groups/{group_id}/members"))
            .json(&json!({ "username": "alice", "added_by": "bob" }))
            .send()
            .await
            .unwrap();
        assert_eq!(forbidden.status(), 403);

        let joined = client
            .post(format!("{base}/api/groups/{group_id}/members"))
            .json(&json!({ "username": "bob", "added_by": "bob" }))
            .send()
            .await
            .unwrap();
        assert_eq!(joined.status(), 200);

        let details: Value = reqwest::get(format!("{base}/api/groups/{group_id}"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(details["members"].as_array().unwrap().len(), 2);

        let admin_leave = client
            .post(format!("{base}/api/groups/{group_id}/leave"))
            .json(&json!({ "username": "alice" }))
            .send()
            .await
            .unwrap();
        assert_eq!(admin_leave.status(), 400);

        let history: Value = reqwest::get(format!("{base}/api/chat-history?username=bob"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history[0]["type"], "group");
        assert_eq!(history[0]["lastMessage"], "No messages yet");
    }

    #[tokio::test]
    async fn posts_and_likes() {
        let (_dir, base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        let created: Value = client
            .post(format!("{base}/api/posts/create"))
            .json(&json!({ "username": "alice", "image_url": "https://img.example/a.jpg" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let post_id = created["post"]["id"].as_i64().unwrap();

        let liked: Value = client
            .post(format!("{base}/api/posts/{post_id}/like"))
            .json(&json!({ "username": "bob" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(liked["message"], "Post liked successfully");
        assert_eq!(liked["likes"], json!(["bob"]));

        let missing = client
            .post(format!("{base}/api/posts/999/like"))
            .json(&json!({ "username": "bob" }))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }

    type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn connect_ws(base: &str) -> WsClient {
        let url = format!("{}/ws", base.replacen("http", "ws", 1));
        let (socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        socket
    }

    async fn send_json(socket: &mut WsClient, frame: Value) {
        socket.send(WsMessage::text(frame.to_string())).await.unwrap();
    }

    async fn next_frame(socket: &mut WsClient) -> WsMessage {
        tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket ended without a frame")
            .unwrap()
    }

    async fn next_event(socket: &mut WsClient) -> Value {
        let frame = next_frame(socket).await;
        serde_json::from_str(frame.to_text().unwrap()).unwrap()
    }

    async fn join(socket: &mut WsClient, sender: &str, receiver: &str) {
        send_json(
            socket,
            json!({ "event": "join", "data": { "sender": sender, "receiver": receiver } }),
        )
        .await;
        let ack = next_event(socket).await;
        assert_eq!(ack["event"], "joined");
        assert_eq!(ack["data"]["room"], "dm:alice:bob");
    }

    #[tokio::test]
    async fn malformed_frame_closes_only_the_sending_session() {
        let (_dir, base, state) = spawn_app().await;
        let room = room_for_direct("alice", "bob").unwrap();

        let mut alice = connect_ws(&base).await;
        let mut bob_phone = connect_ws(&base).await;
        let mut bob_laptop = connect_ws(&base).await;
        join(&mut alice, "alice", "bob").await;
        join(&mut bob_phone, "bob", "alice").await;
        join(&mut bob_laptop, "bob", "alice").await;
        assert_eq!(state.sessions.active_count(), 3);
        assert_eq!(state.messaging.registry().member_count(&room), 3);

        bob_phone.send(WsMessage::text("garbage")).await.unwrap();
        let error = next_event(&mut bob_phone).await;
        assert_eq!(error["event"], "error");
        assert_eq!(error["data"]["code"], "INVALID_MESSAGE");
        assert!(matches!(next_frame(&mut bob_phone).await, WsMessage::Close(_)));

        // Teardown runs after the close frame is written.
        tokio::time::timeout(Duration::from_secs(2), async {
            while state.sessions.active_count() != 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("session was not closed");
        assert_eq!(state.messaging.registry().member_count(&room), 2);

        send_json(
            &mut alice,
            json!({
                "event": "send_message",
                "data": { "sender": "alice", "receiver": "bob", "message": "hello" },
            }),
        )
        .await;
        for socket in [&mut alice, &mut bob_laptop] {
            let event = next_event(socket).await;
            assert_eq!(event["event"], "receive_message");
            assert_eq!(event["data"]["sender"], "alice");
            assert_eq!(event["data"]["message"], "hello");
        }

        let stored: Vec<Value> = reqwest::get(format!(
            "{base}/api/messages?sender=bob&receiver=alice"
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(stored.len(), 1);
    }
}
