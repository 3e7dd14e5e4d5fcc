/// A streaming generation request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The model to sample from. `None` selects the provider's default.
    pub model: Option<String>,
    /// The input messages.
    pub messages: Vec<ModelMessage>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

/// A structured classification request.
///
/// The model reads `prompt` and answers with exactly one of `choices`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChoiceRequest {
    /// The model to sample from. `None` selects the provider's default.
    pub model: Option<String>,
    /// The natural-language instructions, including the text to classify.
    pub prompt: String,
    /// The closed set of acceptable answers.
    pub choices: Vec<String>,
}
