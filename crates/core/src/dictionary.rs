use crate::conversation::Message;
use crate::error::Error;
use crate::generator::{StreamGenerator, TextStream};
use crate::model_client::ModelClient;

const DICTIONARY_PROMPT: &str = "\
Task: Translate input to Chinese and provide definitions for marked terms.
Format Rules:

Single Words:

Line 1: Chinese translation

Line 2: English definition (with Chinese translations for complex terms in brackets)

Sentences:

Line 1: Original sentence

Line 2: Chinese translation

Subsequent lines: For starred terms, list:
[English Term] ([Chinese]): [Definition]. [Hard word translations in brackets if needed]

Examples:

Input: dictionary
Output:
字典
A reference book listing words with meanings, pronunciations (发音), and usage.

Input: The further our cause* advances
Output:
The further our cause advances
我们的事业越向前推进
cause (事业): A goal or movement people support or work toward.

Input: not least in the European Union
Output:
not least in the European Union
在欧盟中尤其重要
not least (尤其重要): At least as significant as other factors.
";

/// Translates words and sentences into Chinese, defining the terms marked
/// with a star.
///
/// Lookups skip classification, they always go to one model.
#[derive(Clone)]
pub struct Dictionary {
    generator: StreamGenerator,
    model: String,
}

impl Dictionary {
    /// Creates a dictionary that asks `model` through `client`.
    #[inline]
    pub fn new<S: Into<String>>(client: ModelClient, model: S) -> Self {
        Self::with_generator(StreamGenerator::new(client), model)
    }

    #[inline]
    pub(crate) fn with_generator<S: Into<String>>(
        generator: StreamGenerator,
        model: S,
    ) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Looks `query` up, streaming the entry as it is written.
    pub fn lookup(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<TextStream, Error>> + Send + 'static + use<>
    {
        debug!("looking up {query:?} with {}", self.model);
        let messages = [Message::user(query)];
        self.generator
            .generate(&self.model, DICTIONARY_PROMPT, &messages)
    }
}

#[cfg(test)]
mod tests {
    use brisk_model::{ErrorKind, ModelMessage};
    use brisk_test_model::{PresetResponse, TestModelProvider};
    use futures_util::TryStreamExt;

    use super::*;
    use crate::error::Stage;
    use crate::model_client::PinnedFuture;

    #[tokio::test]
    async fn test_lookup() {
        let mut provider = TestModelProvider::default();
        provider.set_response(PresetResponse::with_deltas([
            "字典\n",
            "A reference book listing words.",
        ]));
        let dictionary =
            Dictionary::new(ModelClient::new(provider.clone()), "gpt-4o-mini");

        let entry: String = dictionary
            .lookup("dictionary")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(entry, "字典\nA reference book listing words.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model.as_deref(), Some("gpt-4o-mini"));
        let [ModelMessage::System(prompt), ModelMessage::User(query)] =
            requests[0].messages.as_slice()
        else {
            panic!("unexpected messages: {:?}", requests[0].messages);
        };
        assert!(prompt.starts_with("Task: Translate input to Chinese"));
        assert!(prompt.contains("Input: The further our cause* advances"));
        assert_eq!(query, "dictionary");
        assert!(provider.choice_requests().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_outlives_query() {
        let mut provider = TestModelProvider::default();
        provider.set_response(PresetResponse::with_deltas(["事业"]));
        let dictionary =
            Dictionary::new(ModelClient::new(provider.clone()), "gpt-4o-mini");

        let fut: PinnedFuture<Result<TextStream, Error>> = {
            let query = String::from("cause");
            Box::pin(dictionary.lookup(&query))
        };
        drop(dictionary);

        let entry: String = fut.await.unwrap().try_collect().await.unwrap();
        assert_eq!(entry, "事业");
        let requests = provider.requests();
        let [_, ModelMessage::User(query)] = requests[0].messages.as_slice() else {
            panic!("the query should follow the prompt");
        };
        assert_eq!(query, "cause");
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let mut provider = TestModelProvider::default();
        provider.set_response(PresetResponse::failing_to_open());
        let dictionary = Dictionary::new(ModelClient::new(provider), "gpt-4o-mini");
        let Err(err) = dictionary.lookup("cause").await else {
            panic!("the lookup should fail");
        };
        assert_eq!(err.stage(), Stage::OpenStream);
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
