//! Rice Doctor API - an HTTP gateway that turns rice leaf photos, farming
//! questions, and weather readings into advice from a hosted language model.
//!
//! Each endpoint builds a prompt, makes one completion call (two when the
//! rewrite pass is enabled), and returns the generated text.

pub mod ai;
pub mod error;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
