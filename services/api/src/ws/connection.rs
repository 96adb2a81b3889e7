//! The client connection as the relay sees it.

use super::protocol::ServerMessage;
use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::sync::Mutex;
use tracing::debug;

/// One inbound unit from the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Disconnect,
    Binary(Bytes),
    Text(String),
}

/// A bidirectional client connection.
///
/// Methods take `&self` so that the upstream and downstream pumps can use
/// the connection at the same time.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn accept(&self) -> Result<()> {
        Ok(())
    }

    async fn receive(&self) -> Result<Frame>;

    async fn send(&self, msg: &ServerMessage) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// An upgraded axum websocket. The upgrade has already accepted the socket.
pub struct AxumConnection {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl AxumConnection {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

#[async_trait]
impl Connection for AxumConnection {
    async fn receive(&self) -> Result<Frame> {
        let mut stream = self.stream.lock().await;
        loop {
            let frame = match stream.next().await {
                None => Frame::Disconnect,
                Some(msg) => match msg? {
                    Message::Binary(data) => Frame::Binary(data),
                    Message::Text(text) => Frame::Text(text.to_string()),
                    Message::Close(close_frame) => {
                        debug!(?close_frame, "Client sent close frame.");
                        Frame::Disconnect
                    }
                    Message::Ping(_) | Message::Pong(_) => continue,
                },
            };
            return Ok(frame);
        }
    }

    async fn send(&self, msg: &ServerMessage) -> Result<()> {
        let serialized = serde_json::to_string(msg)?;
        self.sink
            .lock()
            .await
            .send(Message::Text(serialized.into()))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.sink.lock().await.close().await?;
        Ok(())
    }
}
