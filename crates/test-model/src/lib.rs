//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use brisk_model::{
    ChoiceRequest, ErrorKind, ModelFinishReason, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    #[inline]
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    delay: Duration,
    event_idx: usize,
    finished: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if this.finished {
            // In case this method is called after completion or failure.
            return Poll::Ready(Ok(None));
        }

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            let Some(event) = this.events.get(this.event_idx) else {
                this.finished = true;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            };
            this.event_idx += 1;
            return match event {
                PresetEvent::MessageDelta(msg) => Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(msg.clone()),
                ))),
                PresetEvent::Failure(msg) => {
                    this.finished = true;
                    Poll::Ready(Err(Error::new(msg.clone(), ErrorKind::Other)))
                }
            };
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct RequestLog {
    requests: Vec<ModelRequest>,
    choice_requests: Vec<ChoiceRequest>,
}

/// A local fake model for testing purpose.
///
/// Every streaming request is answered with the preset response, and
/// every choice request with the preset choice. Requests are recorded,
/// the record is shared by all clones of the provider, so a test can
/// hand a clone to the code under test and inspect the requests later.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    response: PresetResponse,
    choice: PresetChoice,
    delay: Option<Duration>,
    log: Arc<Mutex<RequestLog>>,
}

impl TestModelProvider {
    #[inline]
    pub fn set_response(&mut self, preset: PresetResponse) {
        self.response = preset;
    }

    #[inline]
    pub fn set_choice(&mut self, choice: PresetChoice) {
        self.choice = choice;
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the streaming requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }

    /// Returns the choice requests received so far.
    pub fn choice_requests(&self) -> Vec<ChoiceRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .choice_requests
            .clone()
    }

    #[inline]
    fn delay(&self) -> Duration {
        self.delay.unwrap_or(Duration::from_millis(1))
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .push(req.clone());

        if self.response.fail_to_open {
            return ready(Err(Error::new(
                "too many requests",
                ErrorKind::RateLimitExceeded,
            )));
        }
        let resp = TestModelResponse {
            events: self.response.events.clone(),
            delay: self.delay(),
            event_idx: 0,
            finished: false,
            sleep: None,
        };
        ready(Ok(resp))
    }

    fn send_choice_request(
        &self,
        req: &ChoiceRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .choice_requests
            .push(req.clone());

        let result = match &self.choice {
            PresetChoice::Answer(answer) if req.choices.contains(answer) => {
                Ok(answer.clone())
            }
            PresetChoice::Answer(answer) => Err(Error::new(
                format!("{answer:?} is not a valid choice"),
                ErrorKind::InvalidResponse,
            )),
            PresetChoice::Failure => {
                Err(Error::new("connection refused", ErrorKind::Other))
            }
        };
        let delay = self.delay();
        async move {
            sleep(delay).await;
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use brisk_model::ModelMessage;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, Option<Error>) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = match poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
            {
                Ok(Some(event)) => event,
                Ok(None) => return (msg, None),
                Err(err) => return (msg, Some(err)),
            };
            if let ModelResponseEvent::MessageDelta(delta) = event {
                msg.push_str(&delta);
            }
        }
    }

    fn request(input: &str) -> ModelRequest {
        ModelRequest {
            model: Some("test".to_owned()),
            messages: vec![ModelMessage::User(input.to_owned())],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.set_response(PresetResponse::with_deltas(["Hello, ", "world!"]));

        let resp = provider.send_request(&request("Hi")).await.unwrap();
        let (msg, err) = collect_response(resp).await;
        assert_eq!(msg, "Hello, world!");
        assert!(err.is_none());

        let resp = provider.send_request(&request("Again")).await.unwrap();
        let (msg, _) = collect_response(resp).await;
        assert_eq!(msg, "Hello, world!");

        let requests = provider.clone().requests();
        assert_eq!(requests, vec![request("Hi"), request("Again")]);
    }

    #[tokio::test]
    async fn test_failures() {
        let mut provider = TestModelProvider::default();
        provider.set_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Sure, ".to_owned()),
            PresetEvent::Failure("connection reset".to_owned()),
            PresetEvent::MessageDelta("never sent".to_owned()),
        ]));
        let resp = provider.send_request(&request("Hi")).await.unwrap();
        let (msg, err) = collect_response(resp).await;
        assert_eq!(msg, "Sure, ");
        assert_eq!(err.unwrap().message(), "connection reset");

        provider.set_response(PresetResponse::failing_to_open());
        let Err(err) = provider.send_request(&request("Hi")).await else {
            panic!("the stream should not open");
        };
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_choice_request() {
        let mut provider = TestModelProvider::default();
        let req = ChoiceRequest {
            model: None,
            prompt: "Pick one".to_owned(),
            choices: vec!["a".to_owned(), "b".to_owned()],
        };

        let err = provider.send_choice_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        provider.set_choice(PresetChoice::Answer("b".to_owned()));
        assert_eq!(provider.send_choice_request(&req).await.unwrap(), "b");

        provider.set_choice(PresetChoice::Answer("c".to_owned()));
        let err = provider.send_choice_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        assert_eq!(provider.choice_requests().len(), 3);
    }
}
