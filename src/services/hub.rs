//! hub.rs
//!
//! Рассылка изменений состояния мест всем подключённым наблюдателям.
//!
//! Набор соединений принадлежит одной задаче ([`BroadcastHub`]). Регистрация,
//! отключение и рассылка приходят к ней через одну FIFO-очередь, поэтому
//! набор никогда не меняется во время обхода, а сообщения уходят в том
//! порядке, в котором их отправил координатор. Снаружи с хабом работают только
//! через клонируемый [`HubHandle`].
//!
//! Рассылка работает в пределах одного процесса: наблюдатели, подключённые к
//! другому экземпляру сервиса, этих событий не увидят.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::SeatState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
#[error("connection write failed: {0}")]
pub struct SendError(pub String);

/// Пишущая половина соединения наблюдателя.
#[async_trait]
pub trait ObserverConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), SendError>;

    /// Ошибки закрытия игнорируются: соединение уже может быть мёртвым.
    async fn close(&mut self);
}

/// Кадр, который получают наблюдатели:
/// `{"type":"SEAT_UPDATE","payload":{"seatId":..,"status":..,"ownerId":..}}`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum HubMessage {
    #[serde(rename = "SEAT_UPDATE")]
    SeatUpdate(SeatState),
}

enum HubCommand {
    Register {
        id: ConnectionId,
        connection: Box<dyn ObserverConnection>,
    },
    Unregister(ConnectionId),
    Broadcast(SeatState),
    Count(oneshot::Sender<usize>),
}

#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn register(&self, id: ConnectionId, connection: Box<dyn ObserverConnection>) {
        self.send(HubCommand::Register { id, connection });
    }

    pub fn unregister(&self, id: ConnectionId) {
        self.send(HubCommand::Unregister(id));
    }

    pub fn broadcast(&self, update: SeatState) {
        self.send(HubCommand::Broadcast(update));
    }

    /// Число соединений после обработки всех ранее отправленных команд.
    pub async fn connection_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Count(tx));
        rx.await.unwrap_or(0)
    }

    fn send(&self, command: HubCommand) {
        if self.commands.send(command).is_err() {
            error!("broadcast hub is not running, command dropped");
        }
    }
}

pub struct BroadcastHub {
    connections: HashMap<ConnectionId, Box<dyn ObserverConnection>>,
    commands: mpsc::UnboundedReceiver<HubCommand>,
    write_timeout: Duration,
}

impl BroadcastHub {
    /// Запускает задачу хаба. Она живёт, пока жив хотя бы один `HubHandle`.
    pub fn spawn(write_timeout: Duration) -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = BroadcastHub {
            connections: HashMap::new(),
            commands: rx,
            write_timeout,
        };
        tokio::spawn(hub.run());
        HubHandle { commands: tx }
    }

    async fn run(mut self) {
        info!("📡 Broadcast hub started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { id, connection } => self.register(id, connection).await,
                HubCommand::Unregister(id) => self.unregister(id).await,
                HubCommand::Broadcast(update) => self.broadcast(update).await,
                HubCommand::Count(reply) => {
                    let _ = reply.send(self.connections.len());
                }
            }
        }

        for (_, mut connection) in self.connections.drain() {
            connection.close().await;
        }
        info!("📡 Broadcast hub stopped");
    }

    async fn register(&mut self, id: ConnectionId, mut connection: Box<dyn ObserverConnection>) {
        if self.connections.contains_key(&id) {
            // Повторная регистрация: оставляем уже известное соединение
            warn!(connection_id = %id, "connection already registered");
            connection.close().await;
            return;
        }
        self.connections.insert(id, connection);
        info!(connection_id = %id, total = self.connections.len(), "Client connected");
    }

    async fn unregister(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.remove(&id) {
            close_with_timeout(id, connection, self.write_timeout).await;
            info!(connection_id = %id, total = self.connections.len(), "Client disconnected");
        }
    }

    async fn broadcast(&mut self, update: SeatState) {
        let text = match serde_json::to_string(&HubMessage::SeatUpdate(update)) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to serialize seat update: {}", e);
                return;
            }
        };

        let mut failed = Vec::new();
        for (id, connection) in self.connections.iter_mut() {
            match timeout(self.write_timeout, connection.send_text(text.clone())).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(connection_id = %id, error = %e, "Write error");
                    failed.push(*id);
                }
                Err(_) => {
                    warn!(connection_id = %id, timeout = ?self.write_timeout, "Write timed out");
                    failed.push(*id);
                }
            }
        }

        // Удаляем после обхода, остальные соединения уже получили сообщение
        for id in failed {
            if let Some(connection) = self.connections.remove(&id) {
                close_with_timeout(id, connection, self.write_timeout).await;
            }
        }

        debug!(recipients = self.connections.len(), "seat update delivered");
    }
}

async fn close_with_timeout(id: ConnectionId, mut connection: Box<dyn ObserverConnection>, limit: Duration) {
    if timeout(limit, connection.close()).await.is_err() {
        debug!(connection_id = %id, "close timed out");
    }
}
