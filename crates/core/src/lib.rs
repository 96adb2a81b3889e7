//! Core domain of the Echo Genesis Online voice relay.
//!
//! - `world_patch`: the canonical world mutation and its parameter normalizer.
//! - `normalize`: turns opaque agent events into JSON-safe values.
//! - `locator`: finds a world patch anywhere inside a normalized event.
//! - `live`: the sink/stream contract every live agent provider implements.
//! - `session`: voice session bookkeeping.
//! - `agent`: the world agent definition and its MCP tool server.

pub mod agent;
pub mod live;
pub mod locator;
pub mod normalize;
pub mod session;
pub mod world_patch;
