use std::pin::Pin;
use std::task::{Context, Poll, ready};

use brisk_model::{ModelMessage, ModelRequest, ModelResponseEvent};
use futures_util::Stream;
use futures_util::stream::FusedStream;

use crate::conversation::Message;
use crate::error::{Error, Stage};
use crate::model_client::{ModelClient, ModelClientResponse};

/// Opens completion streams on behalf of the pipeline.
#[derive(Clone)]
pub struct StreamGenerator {
    client: ModelClient,
}

impl StreamGenerator {
    /// Creates a generator that talks through `client`.
    #[inline]
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    /// Opens a stream on `model` for the conversation, led by one system
    /// message carrying `system_prompt`.
    ///
    /// The request is sent once. Failing to open the stream resolves to
    /// an [`Error`] at [`Stage::OpenStream`].
    pub fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        messages: &[Message],
    ) -> impl Future<Output = Result<TextStream, Error>> + Send + 'static + use<>
    {
        let fut = self
            .client
            .send_request(build_request(model, system_prompt, messages));
        async move {
            fut.await
                .map(TextStream::new)
                .map_err(|err| Error::new(Stage::OpenStream, err))
        }
    }
}

fn build_request(
    model: &str,
    system_prompt: &str,
    messages: &[Message],
) -> ModelRequest {
    let system = ModelMessage::System(system_prompt.to_owned());
    ModelRequest {
        model: Some(model.to_owned()),
        messages: std::iter::once(system)
            .chain(messages.iter().map(ModelMessage::from))
            .collect(),
    }
}

/// The text of an open completion stream, chunk by chunk in the order the
/// provider produced it.
///
/// The stream ends after the provider completes, or right after the first
/// error. It can't be restarted. Dropping it closes the upstream response.
pub struct TextStream {
    response: Option<ModelClientResponse>,
}

impl TextStream {
    #[inline]
    fn new(response: ModelClientResponse) -> Self {
        Self {
            response: Some(response),
        }
    }
}

impl Stream for TextStream {
    type Item = Result<String, Error>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let Some(response) = &mut this.response else {
                return Poll::Ready(None);
            };
            let event = match ready!(response.poll_next_event(cx)) {
                Ok(Some(event)) => event,
                Ok(None) => {
                    this.response = None;
                    return Poll::Ready(None);
                }
                Err(err) => {
                    error!("the response stream failed: {err}");
                    this.response = None;
                    return Poll::Ready(Some(Err(Error::new(
                        Stage::ReadStream,
                        err,
                    ))));
                }
            };
            match event {
                ModelResponseEvent::MessageDelta(text) => {
                    return Poll::Ready(Some(Ok(text)));
                }
                ModelResponseEvent::Completed(reason) => {
                    trace!("the response completed: {reason:?}");
                }
            }
        }
    }
}

impl FusedStream for TextStream {
    #[inline]
    fn is_terminated(&self) -> bool {
        self.response.is_none()
    }
}
