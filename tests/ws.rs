//! Наблюдатели через настоящий WebSocket: сервер на локальном порту,
//! клиент на tokio-tungstenite.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use seat_reservation::{
    build_router,
    config::ReservationConfig,
    ledger::InMemoryOrderLedger,
    lock_store::InMemoryLockStore,
    models::Venue,
    services::HubHandle,
    AppState,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    router: Router,
    hub: HubHandle,
}

impl Server {
    async fn start() -> Self {
        let venue = Venue::from_bytes(r#"{"sections": []}"#, 100).unwrap();
        let state = AppState::new(
            &ReservationConfig::default(),
            Arc::new(InMemoryLockStore::new()),
            Arc::new(InMemoryOrderLedger::new()),
            venue,
        );
        let router = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router.clone();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self { addr, router, hub: state.hub.clone() }
    }

    async fn connect(&self) -> Client {
        let (client, _) = connect_async(format!("ws://{}/ws", self.addr)).await.unwrap();
        client
    }

    async fn hold(&self, seat: &str, user: &str) -> StatusCode {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/hold")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"seatId": seat, "userId": user}).to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap().status()
    }

    /// Ждёт, пока хаб не увидит ровно `expected` соединений.
    async fn wait_for_connections(&self, expected: usize) {
        let settled = tokio::time::timeout(WAIT, async {
            while self.hub.connection_count().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(settled.is_ok(), "hub did not reach {expected} connections");
    }
}

async fn next_update(client: &mut Client) -> Value {
    let frame = tokio::time::timeout(WAIT, async {
        while let Some(msg) = client.next().await {
            if let Message::Text(text) = msg.unwrap() {
                return serde_json::from_str::<Value>(&text).unwrap();
            }
        }
        panic!("socket closed before an update arrived");
    })
    .await;
    frame.expect("no SEAT_UPDATE frame within timeout")
}

#[tokio::test]
async fn upgraded_socket_receives_updates_and_unregisters_on_close() {
    let server = Server::start().await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;

    assert_eq!(server.hold("r1-c1", "alice").await, StatusCode::OK);
    assert_eq!(
        next_update(&mut client).await,
        json!({"type": "SEAT_UPDATE", "payload": {"seatId": "r1-c1", "status": "HELD", "ownerId": "alice"}})
    );

    client.close(None).await.unwrap();
    server.wait_for_connections(0).await;

    // После отключения рассылка продолжает работать
    assert_eq!(server.hold("r1-c2", "bob").await, StatusCode::OK);
    assert_eq!(server.hub.connection_count().await, 0);
}

#[tokio::test]
async fn dropped_socket_is_unregistered() {
    let server = Server::start().await;
    let client = server.connect().await;
    server.wait_for_connections(1).await;

    // Без close-фрейма: сервер видит конец потока
    drop(client);
    server.wait_for_connections(0).await;
}

#[tokio::test]
async fn every_observer_gets_the_same_frames_in_order() {
    let server = Server::start().await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    server.wait_for_connections(2).await;

    assert_eq!(server.hold("r2-c1", "alice").await, StatusCode::OK);
    assert_eq!(server.hold("r2-c2", "bob").await, StatusCode::OK);

    for client in [&mut first, &mut second] {
        assert_eq!(next_update(client).await["payload"]["seatId"], "r2-c1");
        assert_eq!(next_update(client).await["payload"]["seatId"], "r2-c2");
    }

    first.close(None).await.unwrap();
    server.wait_for_connections(1).await;

    assert_eq!(server.hold("r2-c3", "carol").await, StatusCode::OK);
    assert_eq!(next_update(&mut second).await["payload"]["ownerId"], "carol");
    second.send(Message::Close(None)).await.unwrap();
    server.wait_for_connections(0).await;
}
