//! End-to-end flows: frame client <-> transport <-> frame bus <-> store

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use frame_bus::{Config, FrameBus, MemoryStore, Server, ServerState, SessionState};
use frame_client::{ClientError, FrameClient, FrameClientConfig};
use serde_json::{Value, json};
use shared::AppResult;
use shared::message::{AdminAction, Envelope, MessageType, OrderCreatedPayload};
use shared::models::{
    ORDERS_COLLECTION, Order, OrderItem, OrderStatus, SessionUser, USERS_COLLECTION, User,
};
use shared::transport::{MemoryTransport, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

fn order(id: &str, status: OrderStatus, day: u32) -> Order {
    let at = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
    Order {
        id: id.to_string(),
        email: "buyer@example.com".to_string(),
        items: vec![OrderItem {
            id: "p1".to_string(),
            name: "Tea".to_string(),
            price: 4.5,
            quantity: 2,
            options: None,
        }],
        subtotal: 9.0,
        tax: 0.9,
        shipping: 0.0,
        total: 9.9,
        status,
        created_at: at,
        updated_at: at,
    }
}

fn fixtures() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store
        .seed(
            ORDERS_COLLECTION,
            [
                order("o1", OrderStatus::Pending, 1),
                order("o2", OrderStatus::Shipped, 2),
            ],
        )
        .unwrap();
    store
        .seed(
            USERS_COLLECTION,
            [User {
                id: "u1".to_string(),
                email: "admin@example.com".to_string(),
                created_at: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
                last_login_at: None,
                is_active: true,
            }],
        )
        .unwrap();
    Arc::new(store)
}

fn state(store: Arc<MemoryStore>) -> ServerState {
    ServerState::new(Config::with_overrides("/tmp/unused", "127.0.0.1:0"), store)
}

fn start_bus(state: &ServerState) -> (MemoryTransport, JoinHandle<AppResult<()>>) {
    let (host, frame) = MemoryTransport::pair();
    let bus = FrameBus::new(Arc::new(host), state.router());
    (frame, tokio::spawn(bus.run()))
}

/// Serve `state` on an ephemeral port; returns the address and the shutdown token
async fn spawn_server(
    config: Config,
    state: ServerState,
) -> (String, CancellationToken, JoinHandle<AppResult<()>>) {
    let server = Arc::new(Server::new(config, state));
    let shutdown = server.shutdown_token();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let serving = tokio::spawn(async move { server.serve(listener).await });
    (addr, shutdown, serving)
}

async fn write_raw(stream: &mut TcpStream, payload: &[u8]) {
    stream
        .write_all(&(payload.len() as u32).to_le_bytes())
        .await
        .unwrap();
    stream.write_all(payload).await.unwrap();
}

async fn read_raw(stream: &mut TcpStream) -> Value {
    let mut len = [0u8; 4];
    stream.read_exact(&mut len).await.unwrap();
    let mut payload = vec![0u8; u32::from_le_bytes(len) as usize];
    stream.read_exact(&mut payload).await.unwrap();
    serde_json::from_slice(&payload).unwrap()
}

async fn connected_client(state: &ServerState) -> (FrameClient, JoinHandle<AppResult<()>>) {
    let (frame, handle) = start_bus(state);
    let client = FrameClient::new(Arc::new(frame), FrameClientConfig::default());
    client.ready().await.unwrap();
    (client, handle)
}

#[tokio::test]
async fn test_update_status_echoes_correlation_id() {
    let store = fixtures();
    let (frame, handle) = start_bus(&state(store.clone()));

    frame.write_message(&Envelope::ready()).await.unwrap();
    frame
        .write_message(&Envelope::request(
            MessageType::UpdateOrderStatus,
            json!({"orderId": "o1", "newStatus": "shipped"}),
            "r1",
        ))
        .await
        .unwrap();

    let reply = frame.read_message().await.unwrap();
    assert!(reply.is(MessageType::UpdateOrderStatus));
    assert_eq!(reply.id, Some("r1".into()));
    assert_eq!(reply.data["orderId"], "o1");
    assert_eq!(reply.data["newStatus"], "shipped");
    assert_eq!(reply.data["success"], true);
    assert_eq!(reply.data["message"], "Order status updated to shipped");

    frame.close().await.unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_order_is_error_reply() {
    let (client, _handle) = connected_client(&state(fixtures())).await;

    let err = client
        .update_order_status("missing", "shipped")
        .await
        .unwrap_err();
    assert_eq!(err.remote_message(), Some("Order not found: missing"));
}

#[tokio::test]
async fn test_invalid_status_lists_allowed_values() {
    let (client, _handle) = connected_client(&state(fixtures())).await;

    let err = client.update_order_status("o1", "lost").await.unwrap_err();
    assert_eq!(
        err.remote_message(),
        Some("Invalid status: lost. Must be one of: pending, processing, shipped, delivered, cancelled")
    );

    // Nothing was written
    let orders = client.fetch_orders().await.unwrap();
    let o1 = orders.iter().find(|o| o.id == "o1").unwrap();
    assert_eq!(o1.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_replies_before_ready_flush_in_order() {
    let (frame, _handle) = start_bus(&state(fixtures()));

    frame
        .write_message(&Envelope::request(MessageType::FetchOrders, Value::Null, 1i64))
        .await
        .unwrap();
    frame
        .write_message(&Envelope::request(MessageType::FetchUsers, Value::Null, 2i64))
        .await
        .unwrap();

    // Give the bus time to handle both while the gate is closed
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(frame.try_read_message().await.is_none());

    frame.write_message(&Envelope::ready()).await.unwrap();

    let first = frame.read_message().await.unwrap();
    let second = frame.read_message().await.unwrap();
    assert!(first.is(MessageType::FetchOrdersResponse));
    assert_eq!(first.id, Some(1i64.into()));
    assert!(second.is(MessageType::FetchUsersResponse));
    assert_eq!(second.id, Some(2i64.into()));

    // Newest first
    let ids: Vec<&str> = first.data["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["o2", "o1"]);
}

#[tokio::test]
async fn test_unknown_type_gets_error_with_same_id() {
    let (frame, _handle) = start_bus(&state(fixtures()));
    frame.write_message(&Envelope::ready()).await.unwrap();

    frame
        .write_message(&Envelope {
            message_type: "FLY_TO_MOON".to_string(),
            data: json!({}),
            id: Some("x1".into()),
        })
        .await
        .unwrap();

    let reply = frame.read_message().await.unwrap();
    assert!(reply.is_error());
    assert_eq!(reply.id, Some("x1".into()));
    assert!(reply.error_message().unwrap().contains("Unknown message type"));
}

#[tokio::test]
async fn test_order_created_then_fetched() {
    let store = fixtures();
    let (client, _handle) = connected_client(&state(store.clone())).await;

    let created = client
        .create_order(OrderCreatedPayload {
            email: "new@example.com".to_string(),
            items: vec![OrderItem {
                id: "p2".to_string(),
                name: "Cake".to_string(),
                price: 3.0,
                quantity: 1,
                options: None,
            }],
            shipping: None,
            subtotal: 3.0,
            tax: 0.3,
            total: 3.3,
        })
        .await
        .unwrap();
    assert!(created.success);
    assert_eq!(store.len(ORDERS_COLLECTION), 3);

    let orders = client.fetch_orders().await.unwrap();
    assert_eq!(orders[0].id, created.order_id);
    assert_eq!(orders[0].status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_user_data_reflects_session() {
    let session = SessionState::signed_in(SessionUser {
        id: "u1".to_string(),
        email: "admin@example.com".to_string(),
    });
    let state = state(fixtures()).with_session(session.clone());
    let (client, _handle) = connected_client(&state).await;

    let data = client.user_data().await.unwrap();
    let user = data.user.unwrap();
    assert_eq!(user.id, "u1");
    assert!(user.is_logged_in);

    session.sign_out().await;
    assert!(client.user_data().await.unwrap().user.is_none());
}

#[tokio::test]
async fn test_checkout_acknowledged() {
    let (client, _handle) = connected_client(&state(fixtures())).await;

    let ack = client
        .checkout(json!({"cart": [], "total": 0}))
        .await
        .unwrap();
    assert!(ack.success);
    assert_eq!(ack.message, "Checkout data received");
}

#[tokio::test]
async fn test_admin_actions() {
    let (client, _handle) = connected_client(&state(fixtures())).await;

    let changed = client
        .admin(
            AdminAction::UpdateOrder,
            json!({"orderId": "o2", "status": "delivered"}),
        )
        .await
        .unwrap();
    assert!(changed.success);
    assert_eq!(
        changed.details["message"],
        "Order status changed from shipped to delivered"
    );

    let viewed = client
        .admin(AdminAction::ViewUser, json!({"userId": "u1"}))
        .await
        .unwrap();
    assert!(viewed.success);
    assert_eq!(viewed.details["user"]["email"], "admin@example.com");

    let missing = client
        .admin(AdminAction::ViewUser, json!({"userId": "nobody"}))
        .await
        .unwrap();
    assert!(!missing.success);
    assert_eq!(missing.error.as_deref(), Some("User not found: nobody"));

    let mailed = client
        .admin(
            AdminAction::SendEmail,
            json!({"to": "a@b.com", "subject": "Hi", "body": "Hello"}),
        )
        .await
        .unwrap();
    assert!(mailed.success);
    assert_eq!(mailed.details["message"], "Email sent to a@b.com");
}

#[tokio::test]
async fn test_unknown_admin_action_is_error() {
    let (frame, _handle) = start_bus(&state(fixtures()));
    frame.write_message(&Envelope::ready()).await.unwrap();

    frame
        .write_message(&Envelope::request(
            MessageType::AdminAction,
            json!({"action": "DELETE_EVERYTHING", "data": {}}),
            "a1",
        ))
        .await
        .unwrap();

    let reply = frame.read_message().await.unwrap();
    assert!(reply.is_error());
    assert_eq!(reply.id, Some("a1".into()));
    assert!(reply.error_message().unwrap().contains("Unknown admin action"));
}

#[tokio::test]
async fn test_serve_over_tcp() {
    let state = state(fixtures());
    let (addr, shutdown, serving) = spawn_server(state.config.clone(), state).await;

    let client = FrameClient::connect(&addr, FrameClientConfig::default())
        .await
        .unwrap();
    client.ready().await.unwrap();

    let users = client.fetch_users().await.unwrap();
    assert_eq!(users.len(), 1);

    let updated = client.update_order_status("o1", "processing").await.unwrap();
    assert_eq!(updated.new_status, OrderStatus::Processing);

    let err = client.update_order_status("o1", "").await.unwrap_err();
    assert!(matches!(err, ClientError::Remote(_)));

    client.close().await.unwrap();
    shutdown.cancel();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_oversized_reply_is_answered_with_error() {
    let store = fixtures();
    store
        .seed(
            ORDERS_COLLECTION,
            (10..60).map(|i| order(&format!("bulk-{i}"), OrderStatus::Pending, 3)),
        )
        .unwrap();
    let state = state(store);
    let mut config = state.config.clone();
    config.max_frame_bytes = 2048;
    let (addr, shutdown, serving) = spawn_server(config, state).await;

    let client = FrameClient::connect(&addr, FrameClientConfig::default())
        .await
        .unwrap();

    // Queued before readiness, rejected when the queue is flushed
    let early = tokio::spawn({
        let client = client.clone();
        async move { client.fetch_orders().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.ready().await.unwrap();
    let err = early.await.unwrap().unwrap_err();
    assert!(err.remote_message().unwrap().contains("exceeds limit of 2048"));

    // Sent directly once ready
    let err = client.fetch_orders().await.unwrap_err();
    assert!(err.remote_message().unwrap().contains("exceeds limit of 2048"));

    // Small replies still go through and nothing extra was sent
    let mut events = client.subscribe();
    assert_eq!(client.fetch_users().await.unwrap().len(), 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());

    client.close().await.unwrap();
    shutdown.cancel();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_float_and_large_ids_are_echoed() {
    let (frame, _handle) = start_bus(&state(fixtures()));
    frame.write_message(&Envelope::ready()).await.unwrap();

    for id in [json!(0.5), json!(18446744073709551615u64), json!(-1)] {
        let request: Envelope =
            serde_json::from_value(json!({"type": "FETCH_USERS", "id": id})).unwrap();
        frame.write_message(&request).await.unwrap();

        let reply = frame.read_message().await.unwrap();
        assert!(reply.is(MessageType::FetchUsersResponse));
        assert_eq!(serde_json::to_value(&reply).unwrap()["id"], id);
    }
}

#[tokio::test]
async fn test_malformed_envelope_with_id_gets_error_over_tcp() {
    let state = state(fixtures());
    let (addr, shutdown, serving) = spawn_server(state.config.clone(), state).await;

    let mut stream = TcpStream::connect(&addr).await.unwrap();
    write_raw(&mut stream, br#"{"type":"IFRAME_READY"}"#).await;
    write_raw(&mut stream, br#"{"type":"FETCH_ORDERS","id":0.5}"#).await;
    write_raw(&mut stream, br#"{"type":7,"id":"bad-1"}"#).await;
    write_raw(&mut stream, br#"{"type":7}"#).await;
    write_raw(&mut stream, br#"{"type":"FETCH_USERS","id":18446744073709551615}"#).await;

    // Each request runs in its own task, so match replies by id
    let mut replies = Vec::new();
    for _ in 0..3 {
        replies.push(read_raw(&mut stream).await);
    }
    let by_id = |id: Value| replies.iter().find(|r| r["id"] == id).unwrap().clone();

    let orders = by_id(json!(0.5));
    assert_eq!(orders["type"], "FETCH_ORDERS_RESPONSE");

    let malformed = by_id(json!("bad-1"));
    assert_eq!(malformed["type"], "ERROR");
    assert!(
        malformed["data"]["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed envelope")
    );

    let users = by_id(json!(18446744073709551615u64));
    assert_eq!(users["type"], "FETCH_USERS_RESPONSE");

    // The id-less malformed frame got no reply
    let extra = tokio::time::timeout(Duration::from_millis(100), read_raw(&mut stream)).await;
    assert!(extra.is_err());

    drop(stream);
    shutdown.cancel();
    serving.await.unwrap().unwrap();
}
