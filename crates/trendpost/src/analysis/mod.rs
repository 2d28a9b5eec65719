//! Model-driven trend selection and post writing.
//!
//! Uses a text model to pick the best trend for a token and to draft the
//! post that references it.

mod generator;
mod prompts;
mod selector;

pub use generator::{ContentGenerator, CONTENT_STOP_SEQUENCE};
pub use prompts::{PromptManager, DEFAULT_CONTENT_TEMPLATE};
pub use selector::{Selection, TrendSelector, FALLBACK_EXPLANATION};
