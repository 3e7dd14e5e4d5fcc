//! An abstraction layer for different LLMs.
//!
//! This crate establishes an unified protocol for the chat pipeline to
//! interact with various supported LLMs, so that the pipeline can switch
//! between them (or a scripted fake) without modifying the core codebase.
//!
//! Two endpoints are modeled: a streaming text generation, and a
//! structured classification that answers with one member of a closed
//! set of choices.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
