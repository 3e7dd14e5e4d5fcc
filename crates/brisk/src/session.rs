use brisk_core::conversation::Message;
use brisk_core::{ChatPipeline, ChatResponse, Language};

/// A chat session, like a window that displays messages and has an input
/// box.
///
/// The session remembers the conversation so far and hands a snapshot of
/// it to the pipeline on every turn.
pub struct Session {
    pipeline: ChatPipeline,
    language: Language,
    conversation: Vec<Message>,
}

impl Session {
    /// Creates an empty session answering in `language`.
    #[inline]
    pub fn new(pipeline: ChatPipeline, language: Language) -> Self {
        Self {
            pipeline,
            language,
            conversation: vec![],
        }
    }

    /// Returns the language replies are written in.
    #[inline]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches the language of the following replies.
    #[inline]
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    /// Sends a message to the session.
    ///
    /// The message is kept in the conversation, the reply is not. Call
    /// [`record_reply`](Self::record_reply) once the response has been
    /// read to the end.
    pub fn send_message(&mut self, message: &str) -> ChatResponse {
        self.conversation.push(Message::user(message));
        self.pipeline.respond(&self.conversation, self.language)
    }

    /// Appends the complete reply of the assistant to the conversation.
    ///
    /// Empty replies are not recorded.
    pub fn record_reply(&mut self, reply: &str) {
        if reply.is_empty() {
            return;
        }
        self.conversation.push(Message::assistant(reply));
    }
}
