//! Runtime settings and named profile persistence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, SILICONFLOW_API_BASE};
use crate::analysis::DEFAULT_CONTENT_TEMPLATE;
use crate::enrichment::SERPER_SEARCH_URL;
use crate::publish::{Credentials, TWITTER_API_BASE};
use crate::token::TokenProfile;
use crate::trends::DEFAULT_TRENDS_URL;

/// Directory holding named profiles.
pub const DEFAULT_CONFIG_DIR: &str = "configs";

/// Token name used when a profile does not set one.
pub const DEFAULT_TOKEN_NAME: &str = "LEGENDARY HUMANITY";

/// Token description used when a profile does not set one.
pub const DEFAULT_TOKEN_DESCRIPTION: &str = "Merging fashion, art, and #AI into #Web3 assets. \
Empowering designers and artists with community-driven #meme coins. $VIVI is the governance token.";

/// Image description used when a profile does not set one.
pub const DEFAULT_IMAGE_DESCRIPTION: &str = "A vibrant and humorous illustration representing \
the essence of the tweet, with logo 'LEGENDARY HUMANITY' and 'VIVI'.";

/// Endpoints, models and service keys for one process.
#[derive(Clone)]
pub struct Settings {
    /// Trend page URL.
    pub trends_url: String,
    /// Web search endpoint.
    pub search_url: String,
    /// Model API base (chat and image endpoints hang off it).
    pub model_api_base: String,
    pub text_model: String,
    pub image_model: String,
    /// Posting API base.
    pub twitter_api_base: String,
    pub siliconflow_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    /// Where named profiles live.
    pub config_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trends_url: DEFAULT_TRENDS_URL.to_string(),
            search_url: SERPER_SEARCH_URL.to_string(),
            model_api_base: SILICONFLOW_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            twitter_api_base: TWITTER_API_BASE.to_string(),
            siliconflow_api_key: None,
            serper_api_key: None,
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("trends_url", &self.trends_url)
            .field("search_url", &self.search_url)
            .field("model_api_base", &self.model_api_base)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("twitter_api_base", &self.twitter_api_base)
            .field("siliconflow_api_key", &self.siliconflow_api_key.is_some())
            .field("serper_api_key", &self.serper_api_key.is_some())
            .field("config_dir", &self.config_dir)
            .finish()
    }
}

impl Settings {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    /// - `SILICONFLOW_API_KEY`, `SERPER_API_KEY`: service keys
    /// - `TRENDPOST_TRENDS_URL`, `TRENDPOST_SEARCH_URL`: source endpoints
    /// - `SILICONFLOW_BASE_URL`: model API base
    /// - `TRENDPOST_TEXT_MODEL`, `TRENDPOST_IMAGE_MODEL`: model names
    /// - `TWITTER_API_BASE`: posting API base
    /// - `TRENDPOST_CONFIG_DIR`: profile directory (default: configs)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            trends_url: var("TRENDPOST_TRENDS_URL").unwrap_or(defaults.trends_url),
            search_url: var("TRENDPOST_SEARCH_URL").unwrap_or(defaults.search_url),
            model_api_base: var("SILICONFLOW_BASE_URL").unwrap_or(defaults.model_api_base),
            text_model: var("TRENDPOST_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: var("TRENDPOST_IMAGE_MODEL").unwrap_or(defaults.image_model),
            twitter_api_base: var("TWITTER_API_BASE").unwrap_or(defaults.twitter_api_base),
            siliconflow_api_key: var("SILICONFLOW_API_KEY"),
            serper_api_key: var("SERPER_API_KEY"),
            config_dir: var("TRENDPOST_CONFIG_DIR").map_or(defaults.config_dir, PathBuf::from),
        }
    }
}

fn default_token_name() -> String {
    DEFAULT_TOKEN_NAME.to_string()
}

fn default_token_description() -> String {
    DEFAULT_TOKEN_DESCRIPTION.to_string()
}

fn default_image_description() -> String {
    DEFAULT_IMAGE_DESCRIPTION.to_string()
}

fn default_prompt() -> String {
    DEFAULT_CONTENT_TEMPLATE.to_string()
}

/// A named, saved set of run inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_token_name")]
    pub token_name: String,
    #[serde(default = "default_token_description")]
    pub token_description: String,
    #[serde(default = "default_image_description")]
    pub image_description: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Content prompt template.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            token_name: default_token_name(),
            token_description: default_token_description(),
            image_description: default_image_description(),
            credentials: Credentials::default(),
            prompt: default_prompt(),
        }
    }
}

impl Profile {
    /// Token metadata carried by this profile.
    #[must_use]
    pub fn token(&self) -> TokenProfile {
        TokenProfile::new(&self.token_name, &self.token_description)
    }

    /// Path of the profile `name` inside `dir`.
    #[must_use]
    pub fn path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.json"))
    }

    /// Load from a file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid profile {}", path.display()))
    }

    /// Save as pretty-printed JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write profile {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Saved profile");
        Ok(())
    }

    /// Load the profile `name` from `dir`.
    pub fn load_named(dir: &Path, name: &str) -> Result<Self> {
        Self::load(&Self::path(dir, name))
    }

    /// Save as profile `name` in `dir`, returning the written path.
    pub fn save_named(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        let path = Self::path(dir, name);
        self.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.trends_url, "https://trends24.in/united-states/");
        assert_eq!(settings.text_model, "Qwen/Qwen2.5-Coder-32B-Instruct");
        assert_eq!(settings.image_model, "black-forest-labs/FLUX.1-schnell");
        assert_eq!(settings.config_dir, PathBuf::from("configs"));
        assert!(settings.siliconflow_api_key.is_none());
    }

    #[test]
    fn test_settings_lookup_overrides() {
        let settings = Settings::from_lookup(|name| match name {
            "SERPER_API_KEY" => Some("serper".to_string()),
            "TRENDPOST_TEXT_MODEL" => Some("other/model".to_string()),
            "SILICONFLOW_API_KEY" => Some("  ".to_string()),
            "TRENDPOST_CONFIG_DIR" => Some("/tmp/profiles".to_string()),
            _ => None,
        });
        assert_eq!(settings.serper_api_key.as_deref(), Some("serper"));
        assert_eq!(settings.text_model, "other/model");
        assert!(settings.siliconflow_api_key.is_none());
        assert_eq!(settings.config_dir, PathBuf::from("/tmp/profiles"));
        assert_eq!(settings.search_url, SERPER_SEARCH_URL);
    }

    #[test]
    fn test_settings_debug_hides_keys() {
        let settings = Settings {
            serper_api_key: Some("very-secret".to_string()),
            ..Settings::default()
        };
        assert!(!format!("{settings:?}").contains("very-secret"));
    }

    #[test]
    fn test_profile_round_trip() {
        let dir = TempDir::new().unwrap();
        let profile = Profile {
            token_name: "DOGE".to_string(),
            token_description: "Much wow.".to_string(),
            image_description: "A shiba".to_string(),
            credentials: Credentials {
                consumer_key: "ck".to_string(),
                consumer_secret: "cs".to_string(),
                access_token: "at".to_string(),
                access_token_secret: "ats".to_string(),
                bearer_token: "bt".to_string(),
            },
            prompt: "Write about {{selected_trend}}".to_string(),
        };

        let path = profile.save_named(dir.path(), "doge").unwrap();
        assert_eq!(path, dir.path().join("doge.json"));

        let loaded = Profile::load_named(dir.path(), "doge").unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_saved_file_is_flat_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = Profile::default().save_named(dir.path(), "default").unwrap();

        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.contains("\n  \"consumer_key\": \"\""));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for key in [
            "token_name",
            "token_description",
            "image_description",
            "consumer_key",
            "consumer_secret",
            "access_token",
            "access_token_secret",
            "bearer_token",
            "prompt",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_absent_fields_take_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"token_name": "PEPE", "access_token": "at"}"#).unwrap();

        let loaded = Profile::load(&path).unwrap();
        assert_eq!(loaded.token_name, "PEPE");
        assert_eq!(loaded.token_description, DEFAULT_TOKEN_DESCRIPTION);
        assert_eq!(loaded.image_description, DEFAULT_IMAGE_DESCRIPTION);
        assert_eq!(loaded.prompt, DEFAULT_CONTENT_TEMPLATE);
        assert_eq!(loaded.credentials.access_token, "at");
        assert_eq!(loaded.credentials.consumer_key, "");
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        Profile::default().save_named(&nested, "p").unwrap();
        assert!(nested.join("p.json").exists());
    }

    #[test]
    fn test_missing_profile_names_file() {
        let dir = TempDir::new().unwrap();
        let err = Profile::load_named(dir.path(), "ghost").unwrap_err();
        assert!(format!("{err:#}").contains("ghost.json"));
    }
}
