//! Gemini Live provider for the world agent.
//!
//! Each session gets its own Live websocket and its own in-process MCP tool
//! server. A reader task turns server messages into agent events and answers
//! tool calls on the model's behalf.

use super::event::{JsonDump, LiveEvent, tool_output_value};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use ego_core::{
    agent::{ResponseModality, WorldAgent, WorldAgentService},
    live::{AgentLink, LiveAgent, LiveRequestSink, RealtimeChunk, Release},
    normalize::RawValue,
    session::Session,
};
use gemini_realtime::{
    LiveReceiver, LiveSender,
    types::{
        AudioTranscriptionConfig, BidiGenerateContentSetup, Content, FunctionCall,
        FunctionDeclaration, FunctionResponse, GenerationConfig, Part,
        ResponseModality as WireModality, ServerMessage, Tool,
    },
};
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, RawContent},
    service::{RoleClient, RunningService},
};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::{io::DuplexStream, sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, debug, error, info, info_span, warn};

type ToolClient = RunningService<RoleClient, ()>;
type EventSender = mpsc::Sender<Result<RawValue>>;

pub struct GeminiLiveAgent {
    api_key: String,
    agent: WorldAgent,
}

impl GeminiLiveAgent {
    pub fn new(api_key: impl Into<String>, agent: WorldAgent) -> Self {
        Self {
            api_key: api_key.into(),
            agent,
        }
    }

    async fn connect(
        &self,
        transport: DuplexStream,
    ) -> Result<(LiveSender, LiveReceiver, ToolClient)> {
        let tools = ()
            .serve(transport)
            .await
            .context("Failed to start world tool client")?;
        let available = tools
            .list_all_tools()
            .await
            .context("Failed to list world tools")?;
        let setup = build_setup(&self.agent, function_declarations(&self.agent, available));
        let (sender, receiver) = gemini_realtime::connect(&self.api_key, setup)
            .await
            .context("Failed to connect to Gemini Live")?;
        Ok((sender, receiver, tools))
    }
}

#[async_trait]
impl LiveAgent for GeminiLiveAgent {
    async fn start(&self, session: &Session) -> Result<AgentLink> {
        info!(session = %session.key, model = %self.agent.model, "Starting Gemini live agent");
        let (server_transport, client_transport) = tokio::io::duplex(4096);

        // The world tool server runs for as long as the session does.
        let tool_server = tokio::spawn(serve_world_tools(server_transport));

        let (sender, receiver, tools) = match self.connect(client_transport).await {
            Ok(connected) => connected,
            Err(e) => {
                tool_server.abort();
                return Err(e);
            }
        };

        let sender = Arc::new(sender);
        let (event_tx, event_rx) = mpsc::channel(32);
        let reader_span = info_span!("gemini_reader", session = %session.key);
        let reader = tokio::spawn(
            read_server_messages(
                receiver,
                sender.clone(),
                tools,
                self.agent.name.clone(),
                event_tx,
            )
            .instrument(reader_span),
        );

        Ok(AgentLink {
            sink: Box::new(GeminiSink {
                sender,
                reader,
                tool_server,
            }),
            events: Box::pin(ReceiverStream::new(event_rx)),
        })
    }
}

/// Serves the world tools over `transport` until the client side goes away.
async fn serve_world_tools(transport: DuplexStream) {
    let service = match WorldAgentService::new().serve(transport).await {
        Ok(service) => service,
        Err(e) => {
            warn!(error = %e, "World tool server failed to start");
            return;
        }
    };
    match service.waiting().await {
        Ok(reason) => debug!(?reason, "World tool server stopped"),
        Err(e) => warn!(error = %e, "World tool server task failed"),
    }
}

struct GeminiSink {
    sender: Arc<LiveSender>,
    reader: JoinHandle<()>,
    tool_server: JoinHandle<()>,
}

#[async_trait]
impl LiveRequestSink for GeminiSink {
    async fn send_realtime(&self, chunk: RealtimeChunk) -> Result<()> {
        self.sender
            .send_audio(&chunk.mime_type, &chunk.data)
            .await
            .context("Failed to stream audio to Gemini")
    }

    async fn send_content(&self, text: String) -> Result<()> {
        self.sender
            .send_text(text)
            .await
            .context("Failed to send text to Gemini")
    }

    fn release(&self) -> Option<Release<'_>> {
        Some(Release::Pending(Box::pin(async move {
            self.reader.abort();
            self.tool_server.abort();
            self.sender
                .close()
                .await
                .context("Failed to close Gemini Live connection")
        })))
    }
}

impl Drop for GeminiSink {
    fn drop(&mut self) {
        self.reader.abort();
        self.tool_server.abort();
    }
}

/// Describes the agent's MCP tools as Gemini function declarations.
fn function_declarations(
    agent: &WorldAgent,
    available: Vec<rmcp::model::Tool>,
) -> Vec<FunctionDeclaration> {
    available
        .into_iter()
        .filter(|tool| agent.tools.iter().any(|name| *name == tool.name))
        .map(|tool| {
            let mut schema = (*tool.input_schema).clone();
            schema.remove("$schema");
            FunctionDeclaration {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
                parameters_json_schema: Value::Object(schema),
            }
        })
        .collect()
}

fn build_setup(
    agent: &WorldAgent,
    function_declarations: Vec<FunctionDeclaration>,
) -> BidiGenerateContentSetup {
    let run_config = &agent.run_config;
    let model = if agent.model.starts_with("models/") {
        agent.model.clone()
    } else {
        format!("models/{}", agent.model)
    };
    let instruction = agent.instruction.trim();

    BidiGenerateContentSetup {
        model,
        generation_config: GenerationConfig {
            response_modalities: run_config
                .response_modalities
                .iter()
                .map(|modality| match modality {
                    ResponseModality::Text => WireModality::Text,
                    ResponseModality::Audio => WireModality::Audio,
                })
                .collect(),
        },
        system_instruction: (!instruction.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: instruction.to_string(),
            }],
        }),
        tools: if function_declarations.is_empty() {
            vec![]
        } else {
            vec![Tool {
                function_declarations,
            }]
        },
        input_audio_transcription: run_config
            .input_audio_transcription
            .then(AudioTranscriptionConfig::default),
        output_audio_transcription: run_config
            .output_audio_transcription
            .then(AudioTranscriptionConfig::default),
    }
}

/// Pumps Live server messages into the session's event channel.
///
/// Ends when the server closes, the channel's consumer goes away, or a
/// message cannot be handled; in the last case the error is the final item.
async fn read_server_messages(
    mut receiver: LiveReceiver,
    sender: Arc<LiveSender>,
    tools: ToolClient,
    author: String,
    events: EventSender,
) {
    while let Some(message) = receiver.next_message().await {
        let handled = match message {
            Ok(message) => handle_server_message(message, &sender, &tools, &author, &events).await,
            Err(e) => Err(e.context("Gemini Live stream failed")),
        };
        if let Err(e) = handled {
            error!(error = ?e, "Stopping Gemini reader.");
            let _ = events.send(Err(e)).await;
            return;
        }
    }
    info!("Gemini Live stream ended.");
}

async fn handle_server_message(
    message: Value,
    sender: &LiveSender,
    tools: &ToolClient,
    author: &str,
    events: &EventSender,
) -> Result<()> {
    let parsed = match serde_json::from_value::<ServerMessage>(message.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "Forwarding unrecognized Gemini message as-is");
            return emit(events, RawValue::from(message)).await;
        }
    };

    if let Some(content) = &parsed.server_content {
        return emit(
            events,
            RawValue::dump(LiveEvent::from_server_content(author, content)),
        )
        .await;
    }

    if let Some(tool_call) = parsed.tool_call {
        emit(events, RawValue::dump(JsonDump(message))).await?;
        let responses = call_tools(tools, &tool_call.function_calls).await?;
        sender
            .send_tool_response(responses.clone())
            .await
            .context("Failed to send tool response to Gemini")?;
        return emit(
            events,
            RawValue::dump(LiveEvent::function_responses(author, responses)),
        )
        .await;
    }

    emit(events, RawValue::from(message)).await
}

async fn emit(events: &EventSender, event: RawValue) -> Result<()> {
    events
        .send(Ok(event))
        .await
        .map_err(|_| anyhow!("Agent event consumer went away"))
}

/// Executes each function call against the world tool server, in order.
async fn call_tools(tools: &ToolClient, calls: &[FunctionCall]) -> Result<Vec<FunctionResponse>> {
    let mut responses = Vec::with_capacity(calls.len());
    for call in calls {
        info!(tool = %call.name, "Executing tool call from Gemini");
        let arguments = match &call.args {
            Value::Object(arguments) => arguments.clone(),
            _ => Map::new(),
        };
        let result = tools
            .peer()
            .call_tool(CallToolRequestParam {
                name: call.name.clone().into(),
                arguments: Some(arguments),
            })
            .await
            .with_context(|| format!("Tool call '{}' failed", call.name))?;

        let annotated_content = result
            .content
            .context("Tool call returned no content")?
            .pop()
            .context("Content list was empty")?;
        let response = match annotated_content.raw {
            RawContent::Text(text_content) => tool_output_value(&text_content.text),
            _ => json!({ "error": "Unexpected content type from tool" }),
        };
        responses.push(FunctionResponse {
            id: call.id.clone(),
            name: call.name.clone(),
            response,
        });
    }
    Ok(responses)
}
