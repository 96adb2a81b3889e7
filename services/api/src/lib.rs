//! Echo Genesis API Library Crate
//!
//! This library contains the web service that relays live voice sessions
//! between game clients and the world agent: configuration, application
//! state, REST handlers, the WebSocket relay, live agent providers, and
//! routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod live;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
