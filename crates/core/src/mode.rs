use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The response strategy chosen for a request.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Math, technical and logic questions, factual explanations.
    Reasoning,
    /// Open discussion, opinions, creative requests, small talk.
    ///
    /// This is also the mode used when classification fails.
    #[default]
    Chat,
}

impl Mode {
    /// Every mode, in the order they are offered to the classifier.
    pub const ALL: [Mode; 2] = [Mode::Reasoning, Mode::Chat];

    /// Returns the lowercase name of this mode.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Reasoning => "reasoning",
            Mode::Chat => "chat",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unknown [`Mode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseModeError(String);

impl Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode: {:?}", self.0)
    }
}

impl StdError for ParseModeError {}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseModeError(s.to_owned()))
    }
}

/// Maps every [`Mode`] to the model that serves it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTable {
    /// The model for [`Mode::Reasoning`].
    pub reasoning: String,
    /// The model for [`Mode::Chat`].
    pub chat: String,
}

impl ModelTable {
    /// Returns the model identifier for `mode`.
    #[inline]
    pub fn resolve(&self, mode: Mode) -> &str {
        match mode {
            Mode::Reasoning => &self.reasoning,
            Mode::Chat => &self.chat,
        }
    }
}

impl Default for ModelTable {
    fn default() -> Self {
        Self {
            reasoning: "o1-mini".to_owned(),
            chat: "gpt-4o-mini".to_owned(),
        }
    }
}
