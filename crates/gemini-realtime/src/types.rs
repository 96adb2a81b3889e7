//! Gemini Live wire types.
//!
//! Only the fields this service reads or writes are modelled; unknown server
//! fields are ignored by serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Client → Server ---

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(BidiGenerateContentSetup),
    ClientContent(BidiGenerateContentClientContent),
    RealtimeInput(BidiGenerateContentRealtimeInput),
    ToolResponse(BidiGenerateContentToolResponse),
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BidiGenerateContentSetup {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscriptionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<AudioTranscriptionConfig>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<ResponseModality>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    Text,
    Audio,
}

/// Enables transcription; the API takes an empty object.
#[derive(Serialize, Debug, Clone, Default)]
pub struct AudioTranscriptionConfig {}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// A callable tool. The parameters are a full JSON Schema document.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters_json_schema: Value,
}

#[derive(Serialize, Debug, Clone)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug, Clone)]
pub struct Part {
    pub text: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BidiGenerateContentClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BidiGenerateContentRealtimeInput {
    pub audio: Blob,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BidiGenerateContentToolResponse {
    pub function_responses: Vec<FunctionResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

// --- Server → Client ---

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_complete: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_content: Option<LiveServerContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<LiveToolCall>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_turn: Option<ServerContentTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_transcription: Option<Transcription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_transcription: Option<Transcription>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ServerContentTurn {
    #[serde(default)]
    pub parts: Vec<ServerPart>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<ServerBlob>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServerBlob {
    #[serde(default)]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveToolCall {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setup_serialization() {
        let setup = ClientMessage::Setup(BidiGenerateContentSetup {
            model: "models/gemini-live".to_string(),
            generation_config: GenerationConfig {
                response_modalities: vec![ResponseModality::Audio],
            },
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: "be kind".to_string(),
                }],
            }),
            tools: vec![Tool {
                function_declarations: vec![FunctionDeclaration {
                    name: "apply_world_patch".to_string(),
                    description: "change the world".to_string(),
                    parameters_json_schema: json!({ "type": "object" }),
                }],
            }],
            input_audio_transcription: Some(AudioTranscriptionConfig::default()),
            output_audio_transcription: None,
        });

        let json = serde_json::to_value(&setup).unwrap();
        assert_eq!(
            json,
            json!({
                "setup": {
                    "model": "models/gemini-live",
                    "generationConfig": { "responseModalities": ["AUDIO"] },
                    "systemInstruction": { "parts": [{ "text": "be kind" }] },
                    "tools": [{
                        "functionDeclarations": [{
                            "name": "apply_world_patch",
                            "description": "change the world",
                            "parametersJsonSchema": { "type": "object" },
                        }],
                    }],
                    "inputAudioTranscription": {},
                }
            })
        );
    }

    #[test]
    fn test_realtime_input_and_tool_response_serialization() {
        let audio = ClientMessage::RealtimeInput(BidiGenerateContentRealtimeInput {
            audio: Blob {
                mime_type: "audio/pcm;rate=16000".to_string(),
                data: "AQI=".to_string(),
            },
        });
        assert_eq!(
            serde_json::to_value(&audio).unwrap(),
            json!({ "realtimeInput": { "audio": { "mimeType": "audio/pcm;rate=16000", "data": "AQI=" } } })
        );

        let response = ClientMessage::ToolResponse(BidiGenerateContentToolResponse {
            function_responses: vec![FunctionResponse {
                id: Some("call-1".to_string()),
                name: "apply_world_patch".to_string(),
                response: json!({ "status": "applied" }),
            }],
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "toolResponse": { "functionResponses": [{ "id": "call-1", "name": "apply_world_patch", "response": { "status": "applied" } }] } })
        );
    }

    #[test]
    fn test_server_content_deserialization() {
        let message: ServerMessage = serde_json::from_value(json!({
            "serverContent": {
                "modelTurn": { "parts": [
                    { "text": "hello" },
                    { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AQID" } },
                ] },
                "turnComplete": true,
                "outputTranscription": { "text": "hello" },
            },
            "usageMetadata": { "totalTokenCount": 10 },
        }))
        .unwrap();

        let content = message.server_content.unwrap();
        let parts = content.model_turn.unwrap().parts;
        assert_eq!(parts[0].text.as_deref(), Some("hello"));
        assert_eq!(parts[1].inline_data.as_ref().unwrap().data, "AQID");
        assert_eq!(content.turn_complete, Some(true));
        assert_eq!(content.output_transcription.unwrap().text, "hello");
        assert!(content.input_transcription.is_none());
    }

    #[test]
    fn test_tool_call_deserialization() {
        let message: ServerMessage = serde_json::from_value(json!({
            "toolCall": { "functionCalls": [
                { "id": "c1", "name": "apply_world_patch", "args": { "effect": "neon" } },
                { "name": "apply_world_patch" },
            ] }
        }))
        .unwrap();

        let calls = message.tool_call.unwrap().function_calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id.as_deref(), Some("c1"));
        assert_eq!(calls[0].args["effect"], "neon");
        assert_eq!(calls[1].args, Value::Null);
    }

    #[test]
    fn test_setup_complete_deserialization() {
        let message: ServerMessage = serde_json::from_str(r#"{"setupComplete":{}}"#).unwrap();
        assert!(message.setup_complete.is_some());
        assert!(message.server_content.is_none());
    }
}
