//! Live Agent Link
//!
//! The contract between the session relay and a live conversational agent:
//! a request sink for client audio and text, and a stream of opaque events
//! coming back. Providers implement `LiveAgent`; the relay never knows which
//! one it is talking to.

use crate::normalize::RawValue;
use crate::session::Session;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures::future::BoxFuture;
use std::pin::Pin;

/// Sample format of every audio frame the client streams in.
pub const REALTIME_AUDIO_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// A raw audio buffer forwarded to the agent as it arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeChunk {
    pub mime_type: String,
    pub data: Bytes,
}

impl RealtimeChunk {
    /// Wraps little-endian 16-bit PCM captured at 16kHz.
    pub fn pcm16(data: Bytes) -> Self {
        Self {
            mime_type: REALTIME_AUDIO_MIME_TYPE.to_string(),
            data,
        }
    }
}

/// The stream of events produced by the agent for one session.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<RawValue>> + Send>>;

/// How a sink releases its resources.
pub enum Release<'a> {
    /// The release already ran.
    Done(Result<()>),
    /// The release completes when this future does.
    Pending(BoxFuture<'a, Result<()>>),
}

/// Accepts client input on behalf of the agent.
#[async_trait]
pub trait LiveRequestSink: Send + Sync {
    async fn send_realtime(&self, chunk: RealtimeChunk) -> Result<()>;

    async fn send_content(&self, text: String) -> Result<()>;

    /// Returns the sink's release operation, if it has one.
    fn release(&self) -> Option<Release<'_>> {
        None
    }
}

/// Runs the sink's release operation, whichever form it takes.
pub async fn release_sink(sink: &dyn LiveRequestSink) -> Result<()> {
    match sink.release() {
        None => Ok(()),
        Some(Release::Done(result)) => result,
        Some(Release::Pending(release)) => release.await,
    }
}

/// Both halves of a running agent conversation.
pub struct AgentLink {
    pub sink: Box<dyn LiveRequestSink>,
    pub events: EventStream,
}

/// Starts agent conversations.
#[async_trait]
pub trait LiveAgent: Send + Sync {
    async fn start(&self, session: &Session) -> Result<AgentLink>;
}

/// Stand-in agent used when no live provider is configured.
///
/// It accepts and drops all input and never speaks, so a session stays open
/// until the client goes away.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAgent;

struct DiscardingSink;

#[async_trait]
impl LiveRequestSink for DiscardingSink {
    async fn send_realtime(&self, chunk: RealtimeChunk) -> Result<()> {
        tracing::trace!(bytes = chunk.data.len(), "Silent agent dropped audio");
        Ok(())
    }

    async fn send_content(&self, text: String) -> Result<()> {
        tracing::trace!(chars = text.chars().count(), "Silent agent dropped text");
        Ok(())
    }
}

#[async_trait]
impl LiveAgent for SilentAgent {
    async fn start(&self, session: &Session) -> Result<AgentLink> {
        tracing::info!(session = %session.key, "Starting silent agent");
        Ok(AgentLink {
            sink: Box::new(DiscardingSink),
            events: Box::pin(futures::stream::pending::<Result<RawValue>>()),
        })
    }
}
