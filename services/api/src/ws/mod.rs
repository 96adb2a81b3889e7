//! WebSocket Session Management
//!
//! This module contains the logic for relaying live voice sessions over
//! WebSockets. It is structured into submodules:
//!
//! - `protocol`: Defines the JSON message format for client-server communication.
//! - `connection`: Wraps the socket behind the `Connection` trait used by the relay.
//! - `relay`: Runs the upstream and downstream pumps for one session.
//! - `session`: Upgrades HTTP requests and starts a relay per connection.

pub mod connection;
pub mod protocol;
pub mod relay;
pub mod session;

pub use session::ws_handler;
