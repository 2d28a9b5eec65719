//! Context retrieval for a selected trend.

use super::serper::{SearchResponse, SerperClient};
use crate::error::StageError;

/// Maximum organic results read per query.
pub const MAX_RESULTS: usize = 5;

/// Builds a short context blob from web search snippets.
pub struct ContextRetriever {
    client: SerperClient,
    max_results: usize,
}

impl ContextRetriever {
    /// Create a retriever reading the first [`MAX_RESULTS`] results.
    pub fn new(client: SerperClient) -> Self {
        Self {
            client,
            max_results: MAX_RESULTS,
        }
    }

    /// Search for the keywords and concatenate the result snippets.
    ///
    /// Failures are [`StageError::SearchFailed`]; the pipeline degrades them
    /// to an empty context.
    pub async fn retrieve<S: AsRef<str>>(&self, keywords: &[S]) -> Result<String, StageError> {
        let query = build_query(keywords);
        if query.is_empty() {
            return Err(StageError::SearchFailed("no keywords given".to_string()));
        }

        tracing::debug!(query = %query, "Searching for trend context");

        let response = self
            .client
            .search(&query)
            .await
            .map_err(|e| StageError::SearchFailed(e.to_string()))?;

        let context = collect_snippets(&response, self.max_results);
        tracing::info!(query = %query, chars = context.len(), "Retrieved trend context");
        Ok(context)
    }
}

/// Join keywords into one query string.
fn build_query<S: AsRef<str>>(keywords: &[S]) -> String {
    keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty snippets of the first `max_results` results, space separated.
fn collect_snippets(response: &SearchResponse, max_results: usize) -> String {
    response
        .organic
        .iter()
        .take(max_results)
        .filter_map(|r| r.snippet.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> SearchResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_build_query() {
        assert_eq!(build_query(&["#AI", " crypto "]), "#AI crypto");
        assert_eq!(build_query::<&str>(&[]), "");
    }

    #[test]
    fn test_collect_snippets_limits_and_skips_empty() {
        let resp = response(
            r#"{"organic": [
                {"title": "a", "snippet": "one"},
                {"title": "b", "snippet": ""},
                {"title": "c"},
                {"title": "d", "snippet": "two"},
                {"title": "e", "snippet": "three"},
                {"title": "f", "snippet": "six"}
            ]}"#,
        );
        assert_eq!(collect_snippets(&resp, MAX_RESULTS), "one two three");
    }

    #[test]
    fn test_collect_snippets_without_organic() {
        let resp = response(r#"{"searchParameters": {"q": "x"}}"#);
        assert_eq!(collect_snippets(&resp, MAX_RESULTS), "");
    }
}
