//! Trend data types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A trending topic label, volume annotation already removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendItem(String);

impl TrendItem {
    /// Create a trend item from a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a free-form label refers to this trend.
    ///
    /// Tolerates surrounding whitespace, case, and a leading `#`.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        let normalize = |s: &str| s.trim().trim_start_matches('#').trim().to_lowercase();
        normalize(&self.0) == normalize(label)
    }
}

impl fmt::Display for TrendItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrendItem {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
