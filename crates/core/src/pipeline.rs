mod builder;

use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use futures_util::stream::FusedStream;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

pub use builder::PipelineBuilder;

use crate::classifier::Classifier;
use crate::conversation::Message;
use crate::dictionary::Dictionary;
use crate::error::Error;
use crate::generator::{StreamGenerator, TextStream};
use crate::language::Language;
use crate::mode::{ModelTable, Mode};
use crate::model_client::PinnedFuture;

/// The text of the first fragment of every response, a zero-width space.
///
/// It reaches the consumer as soon as the stream is open, before any
/// generated text, so that intermediaries which hold back short initial
/// payloads start flushing early.
pub const SYNC_MARKER: &str = "\u{200B}";

const EXCERPT_CHARS: usize = 40;

/// One piece of a response, tagged with the mode of the request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseFragment {
    /// The text of this piece.
    pub text: String,
    /// The mode selected for the whole response.
    pub mode: Mode,
    #[serde(skip)]
    marker: bool,
}

impl ResponseFragment {
    #[inline]
    fn text(text: String, mode: Mode) -> Self {
        Self {
            text,
            mode,
            marker: false,
        }
    }

    #[inline]
    fn marker(mode: Mode) -> Self {
        Self {
            text: SYNC_MARKER.to_owned(),
            mode,
            marker: true,
        }
    }

    /// Returns `true` if this is the leading synchronization marker.
    ///
    /// Generated text is never the marker, even when it reads the same.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.marker
    }
}

/// The adaptive chat pipeline.
///
/// Each call to [`respond`](Self::respond) is independent, the pipeline
/// holds no per-request state and can be cloned and shared freely.
#[derive(Clone)]
pub struct ChatPipeline {
    classifier: Classifier,
    generator: StreamGenerator,
    models: Arc<ModelTable>,
}

impl ChatPipeline {
    /// Returns the model table this pipeline routes with.
    #[inline]
    pub fn models(&self) -> &ModelTable {
        &self.models
    }

    /// Returns a dictionary that looks words up with the chat model.
    #[inline]
    pub fn dictionary(&self) -> Dictionary {
        Dictionary::with_generator(self.generator.clone(), self.models.chat.clone())
    }

    /// Starts answering the conversation in `language`.
    ///
    /// Nothing happens until the returned stream is polled. The stream
    /// works on its own copy of `messages`.
    pub fn respond(
        &self,
        messages: &[Message],
        language: Language,
    ) -> ChatResponse {
        let fut = prepare(
            self.classifier.clone(),
            self.generator.clone(),
            Arc::clone(&self.models),
            messages.to_vec(),
            language,
        )
        .instrument(info_span!("respond", %language));
        ChatResponse {
            state: State::Preparing(Box::pin(fut)),
            mode: None,
        }
    }
}

/// Classifies, routes and opens the stream. Always resolves to a mode, the
/// stream may have failed to open.
async fn prepare(
    classifier: Classifier,
    generator: StreamGenerator,
    models: Arc<ModelTable>,
    messages: Vec<Message>,
    language: Language,
) -> (Mode, Result<TextStream, Error>) {
    let mode = classifier.classify(&messages).await;
    let model = models.resolve(mode);

    let previous = match messages.len() {
        0 | 1 => "None - first message".to_owned(),
        len => excerpt(&messages[len - 2].content),
    };
    let current = messages
        .last()
        .map(|msg| excerpt(&msg.content))
        .unwrap_or_default();
    info!("replied to {previous:?} with {current:?} using {model} ({mode} mode)");

    let stream = generator
        .generate(model, &language.system_prompt(), &messages)
        .await;
    (mode, stream)
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let mut excerpt: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        excerpt.push_str("...");
    }
    excerpt
}

enum State {
    Preparing(PinnedFuture<(Mode, Result<TextStream, Error>)>),
    Streaming(Mode, TextStream),
    // The marker has been sent, the open error goes next.
    OpenFailed(Error),
    Done,
}

/// The answer to one conversation, as a stream of [`ResponseFragment`]s.
///
/// The first item is always the [`SYNC_MARKER`] fragment, then the
/// generated text follows in provider order, every fragment carrying the
/// same mode. A generation failure is yielded as a single `Err` item,
/// after which the stream ends. It can't be restarted, and dropping it
/// early closes the upstream response.
pub struct ChatResponse {
    state: State,
    mode: Option<Mode>,
}

impl ChatResponse {
    /// Returns the mode of this response, once it has been decided.
    #[inline]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }
}

impl Stream for ChatResponse {
    type Item = Result<ResponseFragment, Error>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match mem::replace(&mut this.state, State::Done) {
            State::Preparing(mut fut) => {
                let Poll::Ready((mode, stream)) = fut.as_mut().poll(cx) else {
                    this.state = State::Preparing(fut);
                    return Poll::Pending;
                };
                this.mode = Some(mode);
                this.state = match stream {
                    Ok(stream) => State::Streaming(mode, stream),
                    Err(err) => State::OpenFailed(err),
                };
                Poll::Ready(Some(Ok(ResponseFragment::marker(mode))))
            }
            State::Streaming(mode, mut stream) => {
                match Pin::new(&mut stream).poll_next(cx) {
                    Poll::Pending => {
                        this.state = State::Streaming(mode, stream);
                        Poll::Pending
                    }
                    Poll::Ready(Some(Ok(text))) => {
                        this.state = State::Streaming(mode, stream);
                        Poll::Ready(Some(Ok(ResponseFragment::text(text, mode))))
                    }
                    Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
                    Poll::Ready(None) => Poll::Ready(None),
                }
            }
            State::OpenFailed(err) => {
                error!("failed to start the response: {err}");
                Poll::Ready(Some(Err(err)))
            }
            State::Done => Poll::Ready(None),
        }
    }
}

impl FusedStream for ChatResponse {
    #[inline]
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}
