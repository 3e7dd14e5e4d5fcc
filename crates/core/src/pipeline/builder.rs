use std::sync::Arc;

use brisk_model::ModelProvider;

use super::ChatPipeline;
use crate::classifier::{Classifier, DEFAULT_CLASSIFIER_MODEL};
use crate::generator::StreamGenerator;
use crate::mode::ModelTable;
use crate::model_client::ModelClient;

/// [`ChatPipeline`] builder.
pub struct PipelineBuilder {
    model_client: ModelClient,
    models: ModelTable,
    classifier_model: String,
}

impl PipelineBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// The provider serves both the classification and the generation.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a new builder around an existing client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self {
            model_client,
            models: ModelTable::default(),
            classifier_model: DEFAULT_CLASSIFIER_MODEL.to_owned(),
        }
    }

    /// Replaces the models each mode is routed to.
    #[inline]
    pub fn with_models(mut self, models: ModelTable) -> Self {
        self.models = models;
        self
    }

    /// Sets the model that classifies messages.
    #[inline]
    pub fn with_classifier_model<S: Into<String>>(mut self, model: S) -> Self {
        self.classifier_model = model.into();
        self
    }

    /// Builds the pipeline.
    #[inline]
    pub fn build(self) -> ChatPipeline {
        let PipelineBuilder {
            model_client,
            models,
            classifier_model,
        } = self;

        ChatPipeline {
            classifier: Classifier::new(model_client.clone(), classifier_model),
            generator: StreamGenerator::new(model_client),
            models: Arc::new(models),
        }
    }
}
