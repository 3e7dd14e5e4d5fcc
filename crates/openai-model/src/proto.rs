use brisk_model::{ChoiceRequest, ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChunkChoice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

/// An error object, sent either as an HTTP error body or as an event in
/// the middle of a stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ApiError {
    pub message: String,
    pub r#type: Option<String>,
    pub code: Option<String>,
}

impl ApiError {
    #[inline]
    pub fn is_rate_limit(&self) -> bool {
        let is_rate_limit = |s: &Option<String>| {
            s.as_deref()
                .is_some_and(|s| s == "rate_limit_exceeded" || s == "requests")
        };
        is_rate_limit(&self.r#type) || is_rate_limit(&self.code)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    Chunk(ChatCompletionChunk),
    Error(ErrorEnvelope),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct CompletionMessage {
    pub content: Option<String>,
    pub refusal: Option<String>,
}

/// The object the model fills in for a choice request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChoiceAnswer {
    pub result: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonSchema { json_schema: JsonSchema },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct JsonSchema {
    name: &'static str,
    strict: bool,
    schema: Value,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: req.model.clone().unwrap_or_else(|| config.model.clone()),
        messages: req.messages.iter().map(create_message).collect(),
        response_format: None,
        stream: true,
    }
}

/// Creates a non-streaming request whose output is constrained to an
/// object like `{"result": "<one of the choices>"}`.
pub fn create_choice_request(
    req: &ChoiceRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    let schema = json!({
        "type": "object",
        "properties": {
            "result": {
                "type": "string",
                "enum": req.choices,
            }
        },
        "required": ["result"],
        "additionalProperties": false,
    });
    ChatCompletionRequest {
        model: req.model.clone().unwrap_or_else(|| config.model.clone()),
        messages: vec![Message::User {
            content: req.prompt.clone(),
        }],
        response_format: Some(ResponseFormat::JsonSchema {
            json_schema: JsonSchema {
                name: "choice",
                strict: true,
                schema,
            },
        }),
        stream: false,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}
