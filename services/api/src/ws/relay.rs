//! Session relay between one client connection and one live agent.
//!
//! A relay moves through `Connecting → Active → Draining → Closed`, or ends
//! in `Failed` when any step errors. While active, an upstream pump feeds
//! client frames into the agent sink and a downstream pump turns agent events
//! into `adkEvent` and `worldPatch` messages. The first pump to finish ends
//! the session and the other one is dropped.

use super::connection::{Connection, Frame};
use super::protocol::{ClientMessage, ServerMessage};
use anyhow::Result;
use ego_core::{
    live::{AgentLink, EventStream, LiveAgent, LiveRequestSink, RealtimeChunk, release_sink},
    locator::find_patch,
    normalize::normalize,
    session::{SessionKey, SessionService, get_or_create_session},
};
use futures_util::StreamExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Connecting,
    Active,
    Draining,
    Closed,
    Failed,
}

pub struct SessionRelay<C: Connection> {
    conn: C,
    key: SessionKey,
    state: RelayState,
}

impl<C: Connection> SessionRelay<C> {
    pub fn new(conn: C, key: SessionKey) -> Self {
        Self {
            conn,
            key,
            state: RelayState::Connecting,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Runs the session to completion and returns the terminal state.
    pub async fn run(
        &mut self,
        sessions: &dyn SessionService,
        agent: &dyn LiveAgent,
    ) -> RelayState {
        self.state = RelayState::Connecting;
        let AgentLink { sink, mut events } = match self.connect(sessions, agent).await {
            Ok(link) => link,
            Err(e) => {
                error!(error = ?e, "Failed to start voice session.");
                self.state = RelayState::Draining;
                self.report(&e).await;
                self.close().await;
                self.state = RelayState::Failed;
                return self.state;
            }
        };

        self.state = RelayState::Active;
        info!(session = %self.key, "Voice session active.");
        let outcome = tokio::select! {
            result = pump_upstream(&self.conn, sink.as_ref()) => result,
            result = pump_downstream(&self.conn, &mut events) => result,
        };

        self.state = RelayState::Draining;
        if let Err(e) = &outcome {
            error!(error = ?e, "Voice session failed.");
            self.report(e).await;
        }
        if let Err(e) = release_sink(sink.as_ref()).await {
            warn!(error = ?e, "Failed to release agent sink.");
        }
        self.close().await;

        self.state = match outcome {
            Ok(()) => RelayState::Closed,
            Err(_) => RelayState::Failed,
        };
        info!(state = ?self.state, "Voice session finished.");
        self.state
    }

    async fn connect(
        &self,
        sessions: &dyn SessionService,
        agent: &dyn LiveAgent,
    ) -> Result<AgentLink> {
        self.conn.accept().await?;
        let session = get_or_create_session(sessions, &self.key).await?;
        agent.start(&session).await
    }

    async fn report(&self, e: &anyhow::Error) {
        if let Err(send_err) = self.conn.send(&ServerMessage::error(e.to_string())).await {
            warn!(error = ?send_err, "Failed to send error message to client.");
        }
    }

    async fn close(&self) {
        if let Err(e) = self.conn.close().await {
            warn!(error = ?e, "Failed to close client connection.");
        }
    }
}

/// Forwards client frames to the agent until the client disconnects.
async fn pump_upstream<C: Connection + ?Sized>(
    conn: &C,
    sink: &dyn LiveRequestSink,
) -> Result<()> {
    loop {
        match conn.receive().await? {
            Frame::Disconnect => {
                info!("Client disconnected.");
                return Ok(());
            }
            Frame::Binary(data) if data.is_empty() => debug!("Skipping empty audio frame."),
            Frame::Binary(data) => sink.send_realtime(RealtimeChunk::pcm16(data)).await?,
            Frame::Text(text) if text.is_empty() => debug!("Skipping empty text frame."),
            Frame::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Text { text }) if text.is_empty() => {
                    debug!("Skipping empty text message.")
                }
                Ok(ClientMessage::Text { text }) => sink.send_content(text).await?,
                Err(e) => debug!(error = %e, "Ignoring unrecognized client message."),
            },
        }
    }
}

/// Relays agent events to the client until the agent's stream ends.
async fn pump_downstream<C: Connection + ?Sized>(
    conn: &C,
    events: &mut EventStream,
) -> Result<()> {
    while let Some(event) = events.next().await {
        let payload = normalize(&event?);
        let turn_complete = payload.get("turnComplete").map(is_truthy);
        let patch = find_patch(&payload).cloned();

        conn.send(&ServerMessage::event(payload, turn_complete)).await?;
        match patch {
            Some(patch) => conn.send(&ServerMessage::patch(patch)).await?,
            None => debug!("Event carries no world patch."),
        }
    }
    info!("Agent event stream ended.");
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}
