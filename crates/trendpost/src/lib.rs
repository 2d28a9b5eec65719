//! Trend-driven post generation for crypto tokens.
//!
//! This crate provides:
//! - Trending topic scraping from a public ranking page
//! - Web search context for a selected trend
//! - Model-driven trend selection and post writing
//! - Image generation for the post
//! - OAuth 1.0a signed publishing to the social platform

pub mod ai;
pub mod analysis;
pub mod art;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod token;
pub mod trends;

// Re-export main types
pub use analysis::Selection;
pub use config::{Profile, Settings};
pub use error::{ClientError, Stage, StageError};
pub use pipeline::{Pipeline, PipelineRun, RunOptions, RunRequest, RunState};
pub use publish::{Credentials, PostReceipt, Publisher};
pub use token::TokenProfile;
pub use trends::TrendItem;
