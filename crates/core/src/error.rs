use std::error::Error as StdError;
use std::fmt::{self, Display};

use brisk_model::{ErrorKind, ModelProviderError};

use crate::model_client::BoxedError;

/// Where a generation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The completion stream could not be opened.
    OpenStream,
    /// The stream failed after it was opened.
    ReadStream,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::OpenStream => write!(f, "failed to open the response stream"),
            Stage::ReadStream => write!(f, "failed to read the response stream"),
        }
    }
}

/// A generation failure, terminal for the request it belongs to.
///
/// Classification failures never show up here, they are absorbed by the
/// classifier.
#[derive(Debug)]
pub struct Error {
    stage: Stage,
    source: BoxedError,
}

impl Error {
    #[inline]
    pub(crate) fn new(stage: Stage, source: BoxedError) -> Self {
        Self { stage, source }
    }

    /// Returns the stage that failed.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the kind reported by the model provider.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stage)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let source: &dyn ModelProviderError = &*self.source;
        Some(source)
    }
}
