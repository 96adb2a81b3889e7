//! Accepts voice websocket connections and hands them to a session relay.

use super::{
    connection::AxumConnection,
    relay::{RelayState, SessionRelay},
};
use crate::state::AppState;
use axum::{
    extract::{
        Path, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use ego_core::session::SessionKey;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((user_id, session_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, SessionKey::new(user_id, session_id), state))
}

/// Runs one relay over an upgraded socket.
#[instrument(
    name = "ws_session",
    skip_all,
    fields(
        user_id = %key.user_id,
        session_id = %key.session_id,
        connection_id = %Uuid::new_v4(),
    )
)]
async fn handle_socket(socket: WebSocket, key: SessionKey, state: Arc<AppState>) {
    info!("New voice WebSocket connection.");
    let mut relay = SessionRelay::new(AxumConnection::new(socket), key);
    match relay.run(state.sessions.as_ref(), state.agent.as_ref()).await {
        RelayState::Failed => warn!("Voice connection ended after a failure."),
        _ => info!("Voice connection closed."),
    }
}
