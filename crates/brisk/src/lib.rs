//! A chat assistant that answers hard questions with a reasoning model and
//! everything else with a chat model.
//!
//! The heavy lifting happens in `brisk-core`, this crate keeps the state
//! of a conversation between turns.

#![deny(missing_docs)]

mod session;

pub use brisk_core::{
    ChatPipeline, ChatResponse, Language, Mode, ModelTable, PipelineBuilder,
    ResponseFragment,
};
pub use session::Session;
