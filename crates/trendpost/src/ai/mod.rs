//! Generative model integration.
//!
//! This module provides:
//! - Text and image provider traits
//! - The SiliconFlow backend (OpenAI-compatible chat + image generation)

pub mod provider;
pub mod siliconflow;

pub use provider::{
    parse_ai_response, AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, ImageProvider,
    ImageRequest,
};
pub use siliconflow::{
    SiliconFlowProvider, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, SILICONFLOW_API_BASE,
};

#[cfg(test)]
pub(crate) mod testing;
