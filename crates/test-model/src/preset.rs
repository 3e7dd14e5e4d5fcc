use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// Fails the stream at this point with the given message.
    #[serde(rename = "failure")]
    Failure(String),
}

/// The preset response for a streaming request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, opening the stream fails before any event is produced.
    #[serde(default)]
    pub fail_to_open: bool,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            fail_to_open: false,
        }
    }

    /// Creates a `PresetResponse` with one message delta per text.
    #[inline]
    pub fn with_deltas<S: Into<String>>(
        deltas: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::with_events(
            deltas
                .into_iter()
                .map(|delta| PresetEvent::MessageDelta(delta.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` whose stream can never be opened.
    #[inline]
    pub fn failing_to_open() -> Self {
        Self {
            events: vec![],
            fail_to_open: true,
        }
    }
}

/// How the provider answers choice requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresetChoice {
    /// Answers with this text. An answer outside the request's choices is
    /// reported as an invalid response.
    Answer(String),
    /// Fails the request.
    #[default]
    Failure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Half of ".to_string()),
            PresetEvent::Failure("connection reset".to_string()),
        ]);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_deserialize_defaults() {
        let response: PresetResponse = serde_json::from_str(
            r#"{"events":[{"type":"message_delta","data":"Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(response, PresetResponse::with_deltas(["Hi"]));

        let choice: PresetChoice =
            serde_json::from_str(r#"{"type":"answer","data":"chat"}"#)
                .unwrap();
        assert_eq!(choice, PresetChoice::Answer("chat".to_string()));
    }
}
