//! Websocket connection to the Gemini Live API.

use crate::types::{
    BidiGenerateContentClientContent, BidiGenerateContentRealtimeInput,
    BidiGenerateContentSetup, BidiGenerateContentToolResponse, Blob, ClientMessage, Content,
    FunctionResponse, Part, ServerMessage,
};
use anyhow::{Result, anyhow};
use base64::Engine;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde_json::Value;
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message as WsMessage,
};
use tracing::{debug, info, warn};

pub const LIVE_API_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

type LiveSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Builds the Live endpoint URL for an API key.
pub fn live_url(api_key: &str) -> String {
    format!("{}?key={}", LIVE_API_URL, api_key)
}

/// Opens a Live session and completes the setup handshake.
///
/// Returns once the server has acknowledged the setup with `setupComplete`.
pub async fn connect(
    api_key: &str,
    setup: BidiGenerateContentSetup,
) -> Result<(LiveSender, LiveReceiver)> {
    let (ws_stream, _) = connect_async(live_url(api_key)).await?;
    info!(model = %setup.model, "Connected to Gemini Live WebSocket.");
    let (ws_tx, ws_rx) = ws_stream.split();

    let sender = LiveSender {
        inner: Mutex::new(ws_tx),
    };
    let mut receiver = LiveReceiver { inner: ws_rx };

    sender.send(&ClientMessage::Setup(setup)).await?;

    while let Some(message) = receiver.next_message().await {
        let message = message?;
        match serde_json::from_value::<ServerMessage>(message.clone()) {
            Ok(parsed) if parsed.setup_complete.is_some() => {
                info!("Gemini session setup is complete. Ready for bidirectional streaming.");
                return Ok((sender, receiver));
            }
            _ => warn!(%message, "Received unexpected message during Gemini setup"),
        }
    }
    Err(anyhow!("Gemini Live connection closed before setup completed"))
}

/// Write half of a Live session. Sends are serialized by an internal lock.
pub struct LiveSender {
    inner: Mutex<SplitSink<LiveSocket, WsMessage>>,
}

impl LiveSender {
    pub async fn send(&self, msg: &ClientMessage) -> Result<()> {
        let payload = serde_json::to_string(msg)?;
        self.inner
            .lock()
            .await
            .send(WsMessage::Text(payload.into()))
            .await?;
        Ok(())
    }

    /// Streams one chunk of raw audio.
    pub async fn send_audio(&self, mime_type: &str, data: &[u8]) -> Result<()> {
        let audio = Blob {
            mime_type: mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        };
        self.send(&ClientMessage::RealtimeInput(
            BidiGenerateContentRealtimeInput { audio },
        ))
        .await
    }

    /// Sends a complete user text turn.
    pub async fn send_text(&self, text: String) -> Result<()> {
        self.send(&ClientMessage::ClientContent(
            BidiGenerateContentClientContent {
                turns: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![Part { text }],
                }],
                turn_complete: true,
            },
        ))
        .await
    }

    pub async fn send_tool_response(&self, function_responses: Vec<FunctionResponse>) -> Result<()> {
        self.send(&ClientMessage::ToolResponse(
            BidiGenerateContentToolResponse { function_responses },
        ))
        .await
    }

    pub async fn close(&self) -> Result<()> {
        self.inner.lock().await.close().await?;
        Ok(())
    }
}

/// Read half of a Live session.
pub struct LiveReceiver {
    inner: SplitStream<LiveSocket>,
}

impl LiveReceiver {
    /// Returns the next server message as JSON, or `None` once the socket
    /// has closed. The server may frame JSON as text or binary.
    pub async fn next_message(&mut self) -> Option<Result<Value>> {
        while let Some(frame) = self.inner.next().await {
            let parsed = match frame {
                Ok(WsMessage::Text(text)) => serde_json::from_str::<Value>(text.as_str()),
                Ok(WsMessage::Binary(data)) => serde_json::from_slice::<Value>(&data),
                Ok(WsMessage::Close(close_frame)) => {
                    info!(?close_frame, "Gemini WebSocket connection closed by server.");
                    return None;
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            };
            match parsed {
                Ok(value) => return Some(Ok(value)),
                Err(e) => debug!(error = %e, "Skipping non-JSON frame from Gemini"),
            }
        }
        None
    }
}
