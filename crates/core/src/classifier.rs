use std::fmt::{self, Display};

use brisk_model::ChoiceRequest;

use crate::conversation::Message;
use crate::mode::{Mode, ParseModeError};
use crate::model_client::{BoxedError, ModelClient};

/// The model asked to classify messages unless configured otherwise.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gpt-4o-mini";

const RUBRIC: &str = "\
Choose 'reasoning' or 'chat' model based on the message content:

REASONING for:
- Math/calculations
- Technical questions
- Logic puzzles
- Factual explanations
- Direct questions
- Keywords: calculate, solve, explain, why

CHAT for:
- Open discussions
- Opinions/advice
- Creative content
- Casual conversation
- Keywords: opinion, creative, chat

Analyze:
";

enum ClassifyError {
    EmptyConversation,
    Provider(BoxedError),
    UnknownMode(ParseModeError),
}

impl Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::EmptyConversation => write!(f, "nothing to classify"),
            ClassifyError::Provider(err) => write!(f, "{err}"),
            ClassifyError::UnknownMode(err) => write!(f, "{err}"),
        }
    }
}

/// Decides the [`Mode`] of a request from the latest message.
///
/// Classification never fails from the caller's point of view: any error
/// from the model is logged and [`Mode::Chat`] is returned instead. The
/// model is asked exactly once per call.
#[derive(Clone)]
pub struct Classifier {
    client: ModelClient,
    model: String,
}

impl Classifier {
    /// Creates a classifier that asks `model` through `client`.
    #[inline]
    pub fn new<S: Into<String>>(client: ModelClient, model: S) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Classifies the last message of `messages`.
    ///
    /// Only the last message is sent to the model. An empty conversation
    /// is classified as [`Mode::Chat`] without asking the model.
    pub fn classify(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Mode> + Send + 'static + use<> {
        let request = messages.last().map(|last| ChoiceRequest {
            model: Some(self.model.clone()),
            prompt: build_prompt(&last.content),
            choices: Mode::ALL.iter().map(|m| m.as_str().to_owned()).collect(),
        });
        let client = self.client.clone();

        async move {
            let result = match request {
                Some(request) => request_mode(&client, request).await,
                None => Err(ClassifyError::EmptyConversation),
            };
            result.unwrap_or_else(|err| {
                let fallback = Mode::default();
                warn!("failed to classify the message, using {fallback}: {err}");
                fallback
            })
        }
    }
}

async fn request_mode(
    client: &ModelClient,
    request: ChoiceRequest,
) -> Result<Mode, ClassifyError> {
    let answer = client
        .send_choice_request(request)
        .await
        .map_err(ClassifyError::Provider)?;
    let mode: Mode = answer.parse().map_err(ClassifyError::UnknownMode)?;
    debug!("classified as {mode}");
    Ok(mode)
}

#[inline]
fn build_prompt(content: &str) -> String {
    format!("{RUBRIC}\"{content}\"")
}
