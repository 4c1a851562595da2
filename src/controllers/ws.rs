use async_trait::async_trait;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::{
    services::hub::{ConnectionId, HubHandle, ObserverConnection, SendError},
    AppState,
};

/// Пишущая половина WebSocket, которой владеет хаб.
struct WsConnection {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl ObserverConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), SendError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SendError(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

// GET /ws
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => {
            let hub = state.hub.clone();
            ws.on_upgrade(move |socket| handle_socket(socket, hub))
        }
        Err(rejection) => {
            debug!("websocket upgrade rejected: {}", rejection);
            (StatusCode::UPGRADE_REQUIRED, "Upgrade Required").into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, hub: HubHandle) {
    let (sink, mut stream) = socket.split();
    let id = ConnectionId::new();
    hub.register(id, Box::new(WsConnection { sink }));

    // Клиенты ничего не присылают; читаем, только чтобы заметить обрыв
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(connection_id = %id, "websocket read error: {}", e);
                break;
            }
        }
    }

    hub.unregister(id);
}
