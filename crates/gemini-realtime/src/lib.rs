//! Client for the Gemini Live bidirectional streaming API.
//!
//! - `types`: the JSON messages exchanged over the Live websocket.
//! - `client`: connection setup and a split sender/receiver pair.

pub mod client;
pub mod types;

pub use client::{LiveReceiver, LiveSender, connect};
