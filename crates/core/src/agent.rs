//! World Agent Definition and Tool Service
//!
//! This module describes the live voice agent that manages the game world:
//! its identity, the streaming configuration it runs with, and the MCP tool
//! server exposing `apply_world_patch`, the only way the agent can mutate the
//! world.

use crate::world_patch::{ApplyWorldPatchArgs, ApplyWorldPatchResult, build_patch};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use tracing::info;

pub const WORLD_AGENT_NAME: &str = "ego_world_agent";
pub const WORLD_AGENT_MODEL: &str = "gemini-live-2.5-flash-native-audio";
pub const APPLY_WORLD_PATCH_TOOL: &str = "apply_world_patch";

// --- Agent Definition ---

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamingMode {
    Bidi,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    Text,
    Audio,
}

/// Streaming settings for a live agent run.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub streaming_mode: StreamingMode,
    pub response_modalities: Vec<ResponseModality>,
    pub input_audio_transcription: bool,
    pub output_audio_transcription: bool,
}

impl Default for RunConfig {
    /// Bidirectional audio with transcripts of both sides.
    fn default() -> Self {
        Self {
            streaming_mode: StreamingMode::Bidi,
            response_modalities: vec![ResponseModality::Audio],
            input_audio_transcription: true,
            output_audio_transcription: true,
        }
    }
}

/// Everything a live provider needs to impersonate the world agent.
#[derive(Debug, Clone)]
pub struct WorldAgent {
    pub name: String,
    pub model: String,
    pub instruction: String,
    pub tools: Vec<String>,
    pub run_config: RunConfig,
}

impl WorldAgent {
    /// Creates the world agent with the given model and system instruction.
    pub fn new(model: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: WORLD_AGENT_NAME.to_string(),
            model: model.into(),
            instruction: instruction.into(),
            tools: vec![APPLY_WORLD_PATCH_TOOL.to_string()],
            run_config: RunConfig::default(),
        }
    }
}

// --- Service and Handler Implementation ---

/// MCP tool server through which the agent applies world patches.
pub struct WorldAgentService {
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for WorldAgentService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

impl Default for WorldAgentService {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl WorldAgentService {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    /// Normalizes the requested change into a `WorldPatch`.
    ///
    /// Invalid parameters are replaced with defaults rather than rejected, so
    /// the tool always reports `applied`.
    #[tool(
        description = "Change the game world: set the visual effect (ripple, resonance, neon, scanline), its #RRGGBB color and 0-100 intensity, optionally spawn an entity at x/y, and give a short caption."
    )]
    pub async fn apply_world_patch(
        &self,
        args: Parameters<ApplyWorldPatchArgs>,
    ) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'apply_world_patch'");
        let patch = build_patch(&args.0);
        info!(effect = %patch.effect, color = %patch.color, intensity = patch.intensity, "World patch built");
        serde_json::to_string(&ApplyWorldPatchResult::applied(patch))
            .map_err(|e| format!("Failed to serialize world patch: {}", e))
    }
}
