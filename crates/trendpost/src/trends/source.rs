//! Trend page fetcher and HTML parser.

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

use super::types::TrendItem;
use crate::error::{ClientError, ClientResult, StageError};

/// Default trend ranking page.
pub const DEFAULT_TRENDS_URL: &str = "https://trends24.in/united-states/";

/// Maximum number of trends kept from one page.
pub const MAX_TRENDS: usize = 30;

const USER_AGENT: &str = "Mozilla/5.0";

/// Trailing tweet-volume annotation such as ` 12K` or `3M`.
static VOLUME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\d+[KM]$").expect("volume suffix pattern is valid"));

/// Fetches the current trend list from the ranking page.
pub struct TrendSource {
    client: Client,
    url: String,
}

impl TrendSource {
    /// Create a source for the given page URL.
    pub fn new(url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch and parse the trend list.
    ///
    /// Network, HTTP-status and parse failures are reported as
    /// [`StageError::FetchFailed`]. An `Ok` list may still be empty when the
    /// page carries no trend cards; callers treat that as a hard stop too.
    pub async fn fetch(&self) -> Result<Vec<TrendItem>, StageError> {
        let html = self
            .fetch_page()
            .await
            .map_err(|e| StageError::FetchFailed(e.to_string()))?;

        let trends = parse_trends(&html).map_err(|e| StageError::FetchFailed(e.to_string()))?;

        tracing::info!(url = %self.url, count = trends.len(), "Fetched trends");
        Ok(trends)
    }

    async fn fetch_page(&self) -> ClientResult<String> {
        tracing::debug!(url = %self.url, "Fetching trend page");

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("trend page returned {status}"),
            });
        }

        Ok(response.text().await?)
    }
}

/// Parse trend labels from the ranking page markup.
///
/// Walks every `ol.trend-card__list` in document order and stops the moment
/// [`MAX_TRENDS`] labels are collected, even mid-list.
pub fn parse_trends(html: &str) -> ClientResult<Vec<TrendItem>> {
    let document = Html::parse_document(html);

    let card_selector = Selector::parse("ol.trend-card__list")
        .map_err(|e| ClientError::Parse(format!("trend card selector: {e}")))?;
    let item_selector =
        Selector::parse("li").map_err(|e| ClientError::Parse(format!("trend item selector: {e}")))?;

    let mut trends = Vec::new();

    'cards: for card in document.select(&card_selector) {
        for item in card.select(&item_selector) {
            if trends.len() >= MAX_TRENDS {
                break 'cards;
            }

            // Text nodes trimmed and joined so the count stays a separate word
            let text = item
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let label = strip_volume(&text);

            if label.is_empty() {
                tracing::debug!(raw = %text, "Skipping empty trend item");
                continue;
            }
            trends.push(TrendItem::new(label));
        }
    }

    if trends.is_empty() {
        tracing::warn!("No trend cards found in page (selector: ol.trend-card__list)");
    }

    Ok(trends)
}

/// Remove a trailing volume annotation (`<ws><digits><K|M>`).
#[must_use]
pub fn strip_volume(text: &str) -> &str {
    match VOLUME_SUFFIX.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(items: &[&str]) -> String {
        let lis: String = items
            .iter()
            .map(|t| format!("<li><a href=\"#\">{t}</a></li>"))
            .collect();
        format!("<ol class=\"trend-card__list\">{lis}</ol>")
    }

    #[test]
    fn test_strip_volume() {
        assert_eq!(strip_volume("#AI 12K"), "#AI");
        assert_eq!(strip_volume("Super Bowl3M"), "Super Bowl");
        assert_eq!(strip_volume("#Web3"), "#Web3");
        assert_eq!(strip_volume("Top 100"), "Top 100");
        assert_eq!(strip_volume("120K"), "");
    }

    #[test]
    fn test_parse_preserves_order_and_strips_counts() {
        let html = r##"<html><body>
            <ol class="trend-card__list">
              <li><a href="/x">#AI</a><span class="tweet-count">12K</span></li>
              <li><a href="/y">#Web3</a> <span>3M</span></li>
              <li><a href="/w">Web 3.0</a><span>850K</span></li>
              <li><a href="/z">Bitcoin</a></li>
            </ol>
        </body></html>"##;

        let trends = parse_trends(html).unwrap();
        let labels: Vec<&str> = trends.iter().map(TrendItem::as_str).collect();
        assert_eq!(labels, vec!["#AI", "#Web3", "Web 3.0", "Bitcoin"]);
    }

    #[test]
    fn test_parse_caps_across_cards() {
        let first: Vec<String> = (0..20).map(|i| format!("Trend{i} {i}K")).collect();
        let second: Vec<String> = (20..45).map(|i| format!("Trend{i}")).collect();
        let html = format!(
            "<html><body>{}{}</body></html>",
            card(&first.iter().map(String::as_str).collect::<Vec<_>>()),
            card(&second.iter().map(String::as_str).collect::<Vec<_>>())
        );

        let trends = parse_trends(&html).unwrap();
        assert_eq!(trends.len(), MAX_TRENDS);
        assert_eq!(trends[0].as_str(), "Trend0");
        assert_eq!(trends[19].as_str(), "Trend19");
        assert_eq!(trends[29].as_str(), "Trend29");
        assert!(trends
            .iter()
            .all(|t| !VOLUME_SUFFIX.is_match(t.as_str())));
    }

    #[test]
    fn test_parse_ignores_other_lists() {
        let html = r#"<html><body>
            <ol class="nav"><li>Home</li></ol>
            <ul class="trend-card__list"><li>Not ordered</li></ul>
            <ol class="trend-card__list"><li>Real</li></ol>
        </body></html>"#;

        let trends = parse_trends(html).unwrap();
        assert_eq!(trends, vec![TrendItem::new("Real")]);
    }

    #[test]
    fn test_parse_page_without_cards() {
        let trends = parse_trends("<html><body><p>maintenance</p></body></html>").unwrap();
        assert!(trends.is_empty());
    }
}
