use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use brisk_model::{
    ChoiceRequest, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

pub(crate) type BoxedError = Box<dyn ModelProviderError>;
pub(crate) type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

#[rustfmt::skip]
type StreamHandlerFn = Arc<
    dyn Fn(ModelRequest) -> PinnedFuture<Result<ModelClientResponse, BoxedError>>
        + Send + Sync
>;
#[rustfmt::skip]
type ChoiceHandlerFn = Arc<
    dyn Fn(ChoiceRequest) -> PinnedFuture<Result<String, BoxedError>>
        + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
///
/// Cloning is cheap, all clones share the same provider.
#[derive(Clone)]
pub struct ModelClient {
    stream_fn: StreamHandlerFn,
    choice_fn: ChoiceHandlerFn,
}

impl ModelClient {
    /// Wraps `provider`.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let provider = Arc::new(provider);

        let stream_fn: StreamHandlerFn = Arc::new({
            let provider = Arc::clone(&provider);
            move |req: ModelRequest| -> PinnedFuture<
                Result<ModelClientResponse, BoxedError>,
            > {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        match fut.await {
                            Ok(resp) => Ok(ModelClientResponse::new(resp)),
                            Err(err) => {
                                error!("got an error: {err:?}");
                                Err(Box::new(err) as BoxedError)
                            }
                        }
                    }
                    .instrument(trace_span!("model client req")),
                )
            }
        });

        let choice_fn: ChoiceHandlerFn = Arc::new(
            move |req: ChoiceRequest| -> PinnedFuture<Result<String, BoxedError>> {
                let fut = provider.send_choice_request(&req);
                Box::pin(
                    async move {
                        trace!("got a choice request: {:?}", req);
                        fut.await.map_err(|err| Box::new(err) as BoxedError)
                    }
                    .instrument(trace_span!("model client choice req")),
                )
            },
        );

        Self {
            stream_fn,
            choice_fn,
        }
    }

    /// Opens a streaming generation.
    #[inline]
    pub fn send_request(
        &self,
        req: ModelRequest,
    ) -> impl Future<Output = Result<ModelClientResponse, BoxedError>> + Send + 'static + use<>
    {
        (self.stream_fn)(req)
    }

    /// Sends a choice request, resolving to the chosen answer.
    #[inline]
    pub fn send_choice_request(
        &self,
        req: ChoiceRequest,
    ) -> impl Future<Output = Result<String, BoxedError>> + Send + 'static + use<>
    {
        (self.choice_fn)(req)
    }
}

/// A type-erased streaming response.
///
/// Dropping it drops the provider's response.
pub struct ModelClientResponse {
    inner: Pin<Box<dyn ErasedResponse>>,
}

impl ModelClientResponse {
    #[inline]
    fn new<R: ModelResponse>(resp: R) -> Self {
        Self {
            inner: Box::pin(resp),
        }
    }

    /// Attempts to pull out the next event, with the same contract as
    /// [`ModelResponse::poll_next_event`].
    #[inline]
    pub fn poll_next_event(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, BoxedError>> {
        self.inner.as_mut().poll_next_erased(cx)
    }
}

trait ErasedResponse: Send {
    fn poll_next_erased(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, BoxedError>>;
}

impl<R: ModelResponse> ErasedResponse for R {
    #[inline]
    fn poll_next_erased(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, BoxedError>> {
        self.poll_next_event(cx)
            .map_err(|err| Box::new(err) as BoxedError)
    }
}
