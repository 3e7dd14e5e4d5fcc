use std::error::Error;

use crate::error::ErrorKind;
use crate::request::{ChoiceRequest, ModelRequest};
use crate::response::ModelResponse;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, which is an entry for sampling
/// streaming completions and structured choices.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Opens a streaming text generation.
    ///
    /// The returned future resolves once the stream is open. Generated
    /// text is then pulled from the response.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;

    /// Asks the model to pick exactly one of `req.choices`.
    ///
    /// Implementations must either resolve to a member of `req.choices`
    /// or fail, returning anything else is a contract violation.
    fn send_choice_request(
        &self,
        req: &ChoiceRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}
