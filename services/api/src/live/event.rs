//! Agent events in the shape the game client expects.
//!
//! `LiveEvent` mirrors an agent-framework event: camelCase keys, absent
//! fields omitted, audio kept as raw bytes until the relay normalizes it.

use base64::Engine;
use bytes::Bytes;
use ego_core::normalize::{DumpError, EventDump, RawKey, RawValue};
use gemini_realtime::types::{FunctionResponse, LiveServerContent};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<EventContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_transcription: Option<EventTranscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_transcription: Option<EventTranscription>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EventContent {
    pub role: String,
    pub parts: Vec<EventPart>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum EventPart {
    Text(String),
    InlineData(InlineData),
    FunctionResponse(FunctionResponse),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Bytes,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EventTranscription {
    pub text: String,
}

fn serialize_base64<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
}

impl LiveEvent {
    /// Converts one `serverContent` message from the model.
    ///
    /// Audio arrives base64-encoded and is decoded here; a part that fails to
    /// decode is dropped.
    pub fn from_server_content(author: &str, server_content: &LiveServerContent) -> Self {
        let content = server_content.model_turn.as_ref().map(|turn| EventContent {
            role: "model".to_string(),
            parts: turn
                .parts
                .iter()
                .flat_map(|part| {
                    let text = part.text.clone().map(EventPart::Text);
                    let audio = part.inline_data.as_ref().and_then(|blob| {
                        match base64::engine::general_purpose::STANDARD.decode(&blob.data) {
                            Ok(data) => Some(EventPart::InlineData(InlineData {
                                mime_type: blob.mime_type.clone().unwrap_or_default(),
                                data: Bytes::from(data),
                            })),
                            Err(e) => {
                                warn!(error = %e, "Dropping undecodable inline data from Gemini");
                                None
                            }
                        }
                    });
                    text.into_iter().chain(audio)
                })
                .collect(),
        });

        Self {
            author: author.to_string(),
            content,
            turn_complete: server_content.turn_complete,
            interrupted: server_content.interrupted,
            input_transcription: server_content
                .input_transcription
                .as_ref()
                .map(|t| EventTranscription {
                    text: t.text.clone(),
                }),
            output_transcription: server_content
                .output_transcription
                .as_ref()
                .map(|t| EventTranscription {
                    text: t.text.clone(),
                }),
        }
    }

    /// An event reporting tool results back to the client.
    pub fn function_responses(author: &str, responses: Vec<FunctionResponse>) -> Self {
        Self {
            author: author.to_string(),
            content: Some(EventContent {
                role: "user".to_string(),
                parts: responses.into_iter().map(EventPart::FunctionResponse).collect(),
            }),
            ..Default::default()
        }
    }
}

fn entry(key: &str, value: impl Into<RawValue>) -> (RawKey, RawValue) {
    (RawKey::from(key), value.into())
}

impl EventPart {
    fn to_raw(&self) -> RawValue {
        match self {
            EventPart::Text(text) => RawValue::map([entry("text", text.as_str())]),
            EventPart::InlineData(inline) => RawValue::map([entry(
                "inlineData",
                RawValue::map([
                    entry("mimeType", inline.mime_type.as_str()),
                    entry("data", inline.data.clone()),
                ]),
            )]),
            EventPart::FunctionResponse(response) => {
                let mut fields = Vec::with_capacity(3);
                if let Some(id) = &response.id {
                    fields.push(entry("id", id.as_str()));
                }
                fields.push(entry("name", response.name.as_str()));
                fields.push(entry("response", response.response.clone()));
                RawValue::map([entry("functionResponse", RawValue::Map(fields))])
            }
        }
    }
}

impl EventDump for LiveEvent {
    fn dump(&self) -> Result<RawValue, DumpError> {
        let mut fields = vec![entry("author", self.author.as_str())];
        if let Some(content) = &self.content {
            fields.push(entry(
                "content",
                RawValue::map([
                    entry("role", content.role.as_str()),
                    entry(
                        "parts",
                        content.parts.iter().map(EventPart::to_raw).collect::<Vec<_>>(),
                    ),
                ]),
            ));
        }
        if let Some(flag) = self.turn_complete {
            fields.push(entry("turnComplete", flag));
        }
        if let Some(flag) = self.interrupted {
            fields.push(entry("interrupted", flag));
        }
        for (key, transcription) in [
            ("inputTranscription", &self.input_transcription),
            ("outputTranscription", &self.output_transcription),
        ] {
            if let Some(t) = transcription {
                fields.push(entry(key, RawValue::map([entry("text", t.text.as_str())])));
            }
        }
        Ok(RawValue::Map(fields))
    }

    fn dump_json(&self) -> Result<String, DumpError> {
        serde_json::to_string(self).map_err(|e| DumpError::Failed(e.to_string()))
    }
}

/// Presents any serializable value as an event that only has a JSON form.
pub struct JsonDump<T>(pub T);

impl<T: Serialize + Send + Sync> EventDump for JsonDump<T> {
    fn dump(&self) -> Result<RawValue, DumpError> {
        Err(DumpError::Unsupported)
    }

    fn dump_json(&self) -> Result<String, DumpError> {
        serde_json::to_string(&self.0).map_err(|e| DumpError::Failed(e.to_string()))
    }
}

/// Tool output is JSON text; anything else is wrapped as `{"output": text}`.
pub fn tool_output_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "output": text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ego_core::locator::find_patch;
    use ego_core::normalize::normalize;
    use gemini_realtime::types::{ServerMessage, ServerPart};
    use serde_json::json;

    fn author() -> &'static str {
        "ego_world_agent"
    }

    #[test]
    fn test_server_content_dump_omits_absent_fields() {
        let message: ServerMessage = serde_json::from_value(json!({
            "serverContent": {
                "modelTurn": { "parts": [
                    { "text": "やあ" },
                    { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AQID" } },
                ] },
                "turnComplete": true,
            }
        }))
        .unwrap();
        let event = LiveEvent::from_server_content(author(), &message.server_content.unwrap());

        let normalized = normalize(&RawValue::dump(event));
        assert_eq!(
            normalized,
            json!({
                "author": "ego_world_agent",
                "content": { "role": "model", "parts": [
                    { "text": "やあ" },
                    { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AQID" } },
                ] },
                "turnComplete": true,
            })
        );
    }

    #[test]
    fn test_audio_bytes_are_decoded_on_the_event() {
        let content = LiveServerContent {
            model_turn: Some(gemini_realtime::types::ServerContentTurn {
                parts: vec![ServerPart {
                    text: None,
                    inline_data: Some(gemini_realtime::types::ServerBlob {
                        mime_type: None,
                        data: "AQID".to_string(),
                    }),
                }],
            }),
            ..Default::default()
        };
        let event = LiveEvent::from_server_content(author(), &content);

        let parts = event.content.unwrap().parts;
        match &parts[0] {
            EventPart::InlineData(inline) => assert_eq!(inline.data.as_ref(), &[1u8, 2, 3]),
            other => panic!("expected inline data, got {:?}", other),
        }
    }

    #[test]
    fn test_transcriptions_carry_over() {
        let content: LiveServerContent = serde_json::from_value(json!({
            "inputTranscription": { "text": "空を光らせて" },
            "interrupted": true,
        }))
        .unwrap();
        let event = LiveEvent::from_server_content(author(), &content);

        let normalized = normalize(&RawValue::dump(event));
        assert_eq!(normalized["inputTranscription"]["text"], "空を光らせて");
        assert_eq!(normalized["interrupted"], true);
        assert!(normalized.get("content").is_none());
        assert!(normalized.get("outputTranscription").is_none());
    }

    #[test]
    fn test_function_response_event_exposes_patch() {
        let patch = json!({
            "effect": "neon", "color": "#66AAEE", "intensity": 70, "spawn": null, "caption": "neon applied"
        });
        let event = LiveEvent::function_responses(
            author(),
            vec![FunctionResponse {
                id: Some("call-1".to_string()),
                name: "apply_world_patch".to_string(),
                response: json!({ "status": "applied", "patch": patch.clone() }),
            }],
        );

        let normalized = normalize(&RawValue::dump(event));
        assert_eq!(
            normalized["content"]["parts"][0]["functionResponse"]["name"],
            "apply_world_patch"
        );
        assert_eq!(find_patch(&normalized), Some(&patch));
    }

    #[test]
    fn test_dump_json_matches_dump() {
        let content: LiveServerContent = serde_json::from_value(json!({
            "modelTurn": { "parts": [{ "inlineData": { "mimeType": "audio/pcm", "data": "AAEC" } }] },
            "outputTranscription": { "text": "hi" },
        }))
        .unwrap();
        let event = LiveEvent::from_server_content(author(), &content);

        let from_dump = normalize(&event.dump().unwrap());
        let from_json: Value = serde_json::from_str(&event.dump_json().unwrap()).unwrap();
        assert_eq!(from_dump, from_json);
    }

    #[test]
    fn test_json_dump_goes_through_json_fallback() {
        let wrapped = JsonDump(json!({ "toolCall": { "functionCalls": [] } }));
        assert!(matches!(wrapped.dump(), Err(DumpError::Unsupported)));
        assert_eq!(
            normalize(&RawValue::dump(wrapped)),
            json!({ "toolCall": { "functionCalls": [] } })
        );
    }

    #[test]
    fn test_tool_output_value() {
        assert_eq!(tool_output_value(r#"{"status":"applied"}"#), json!({ "status": "applied" }));
        assert_eq!(tool_output_value("oops"), json!({ "output": "oops" }));
    }
}
