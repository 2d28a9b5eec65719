//! Trending topic scraping.
//!
//! Fetches the current trend list from a public ranking page and parses it
//! into ordered [`TrendItem`]s.

mod source;
mod types;

pub use source::{parse_trends, strip_volume, TrendSource, DEFAULT_TRENDS_URL, MAX_TRENDS};
pub use types::TrendItem;
