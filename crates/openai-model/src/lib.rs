//! A model provider for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use brisk_model::{
    ChoiceRequest, ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use io::{Chunks, Sse};
use proto::{ChatCompletion, ChoiceAnswer, ErrorEnvelope};
pub use response::OpenAIResponse;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_api_error(err: proto::ApiError) -> Self {
        let kind = if err.is_rate_limit() {
            ErrorKind::RateLimitExceeded
        } else {
            ErrorKind::Other
        };
        Self::new(err.message, kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.config.endpoint(path))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        debug!("opening a completion stream with {}", openai_req_model(req));
        let resp_fut = self
            .post(CHAT_COMPLETIONS_PATH)
            .header(header::ACCEPT, "text/event-stream")
            .json(&openai_req)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => check_status(resp).await?,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            if !is_event_stream(content_type) {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::InvalidResponse,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(OpenAIResponse::from_sse(sse))
        }
    }

    fn send_choice_request(
        &self,
        req: &ChoiceRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_choice_request(req, &self.config);
        let choices = req.choices.clone();
        let resp_fut = self.post(CHAT_COMPLETIONS_PATH).json(&openai_req).send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => check_status(resp).await?,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };
            let completion: ChatCompletion = resp.json().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })?;
            let answer = parse_choice(completion)?;
            trace!("got choice answer: {answer}");
            check_choice(answer, &choices)
        }
    }
}

#[inline]
fn openai_req_model(req: &ModelRequest) -> &str {
    req.model.as_deref().unwrap_or("the default model")
}

/// Turns a non-success status into an [`Error`], reading the error body
/// when the server sent one.
async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("HTTP {status}: {body}"),
    };
    Err(Error::new(message, status_kind(status)))
}

#[inline]
fn status_kind(status: StatusCode) -> ErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ErrorKind::RateLimitExceeded
    } else {
        ErrorKind::Other
    }
}

fn is_event_stream(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| {
            m.type_() == mime::TEXT && m.subtype().as_str() == "event-stream"
        })
        .unwrap_or(false)
}

fn check_choice(answer: String, choices: &[String]) -> Result<String, Error> {
    if !choices.contains(&answer) {
        return Err(Error::new(
            format!("choice {answer:?} is not one of {choices:?}"),
            ErrorKind::InvalidResponse,
        ));
    }
    Ok(answer)
}

fn parse_choice(completion: ChatCompletion) -> Result<String, Error> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new(
            "no choice in the completion",
            ErrorKind::InvalidResponse,
        ));
    };
    if let Some(refusal) = choice.message.refusal {
        return Err(Error::new(
            format!("the model refused: {refusal}"),
            ErrorKind::InvalidResponse,
        ));
    }
    let content = choice.message.content.unwrap_or_default();
    let answer: ChoiceAnswer = serde_json::from_str(&content).map_err(|err| {
        Error::new(format!("{err}"), ErrorKind::InvalidResponse)
    })?;
    Ok(answer.result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> ChatCompletion {
        serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content,
                    "refusal": null
                },
                "finish_reason": "stop"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_choice() {
        let answer =
            parse_choice(completion(r#"{"result":"reasoning"}"#)).unwrap();
        assert_eq!(answer, "reasoning");
    }

    #[test]
    fn test_parse_malformed_choice() {
        let err = parse_choice(completion("reasoning")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let err =
            parse_choice(ChatCompletion { choices: vec![] }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_status_kind() {
        assert_eq!(
            status_kind(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(status_kind(StatusCode::UNAUTHORIZED), ErrorKind::Other);
        assert_eq!(
            status_kind(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::Other
        );
    }

    #[test]
    fn test_is_event_stream() {
        assert!(is_event_stream(Some("text/event-stream")));
        assert!(is_event_stream(Some("text/event-stream; charset=utf-8")));
        assert!(!is_event_stream(Some("application/json")));
        assert!(!is_event_stream(Some("text/html")));
        assert!(!is_event_stream(Some("not a mime")));
        assert!(!is_event_stream(None));
    }

    #[test]
    fn test_check_choice() {
        let choices = ["reasoning".to_owned(), "chat".to_owned()];
        assert_eq!(check_choice("chat".to_owned(), &choices).unwrap(), "chat");

        let err = check_choice("poetry".to_owned(), &choices).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert!(err.message().contains("poetry"));
    }
}
