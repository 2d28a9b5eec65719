//! Trend context enrichment using web search.
//!
//! Retrieves short snippets about a topic to ground generated content.

mod context;
mod serper;

pub use context::{ContextRetriever, MAX_RESULTS};
pub use serper::{OrganicResult, SearchResponse, SerperClient, SERPER_SEARCH_URL};
