//! Core logic of the adaptive chat pipeline.
//!
//! A request flows in one direction: the conversation is classified into a
//! [`Mode`], the mode is routed to a model through the [`ModelTable`], a
//! completion stream is opened on that model, and its text comes back as a
//! [`ChatResponse`] of [`ResponseFragment`]s tagged with the mode.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod classifier;
pub mod conversation;
mod dictionary;
mod error;
mod generator;
mod language;
mod mode;
mod model_client;
mod pipeline;

pub use classifier::{Classifier, DEFAULT_CLASSIFIER_MODEL};
pub use dictionary::Dictionary;
pub use error::{Error, Stage};
pub use generator::{StreamGenerator, TextStream};
pub use language::{Language, ParseLanguageError};
pub use mode::{ModelTable, Mode, ParseModeError};
pub use model_client::{ModelClient, ModelClientResponse};
pub use pipeline::{
    ChatPipeline, ChatResponse, PipelineBuilder, ResponseFragment, SYNC_MARKER,
};
