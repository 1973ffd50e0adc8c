//! Application configuration.
//!
//! Values are layered: built-in defaults, then `~/.config/cinefav/config.toml`,
//! then `CINEFAV_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{favorites::FAVORITES_KEY, storage::FileBackend};

/// Directory under the user's config directory.
pub const CONFIG_DIR: &str = "cinefav";
/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CINEFAV";
/// Image shown when a movie has no poster.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";

const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const DEFAULT_CONFIG: &str = r#"# cinefav configuration

# Movie metadata API. Either a bearer token or an api key is required.
api_base_url = "https://api.themoviedb.org/3"
image_base_url = "https://image.tmdb.org/t/p"
# api_token = ""
# api_key = ""
language = "en-US"
request_timeout_secs = 15

# Favorites storage. Every instance pointed at the same directory shares
# one list; with watch_storage enabled, changes show up live.
# data_dir = ""
favorites_key = "fav-movies"
watch_storage = true
"#;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory of the file storage backend.
    pub data_dir: PathBuf,
    /// Storage key of the favorites list.
    pub favorites_key: String,
    /// Base URL of the movie metadata API.
    pub api_base_url: String,
    /// Base URL for poster images.
    pub image_base_url: String,
    /// Bearer token for the metadata API.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Query-string api key for the metadata API.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Language tag sent with every request.
    pub language: String,
    /// Watch the storage directory for writes by other instances.
    pub watch_storage: bool,
    /// HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: FileBackend::default_root(),
            favorites_key: FAVORITES_KEY.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            api_token: None,
            api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            watch_storage: true,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Default path of the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load from the default path plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load from `path` (optional) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .set_default("favorites_key", defaults.favorites_key)?
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("image_base_url", defaults.image_base_url)?
            .set_default("language", defaults.language)?
            .set_default("watch_storage", defaults.watch_storage)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.api_token = config.api_token.filter(|value| !value.trim().is_empty());
        config.api_key = config.api_key.filter(|value| !value.trim().is_empty());
        Ok(config)
    }

    /// HTTP timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Poster URL for a relative image path, or the placeholder.
    pub fn image_url(&self, path: Option<&str>) -> String {
        match path.filter(|value| !value.is_empty()) {
            Some(path) => format!(
                "{}/w500{}",
                self.image_base_url.trim_end_matches('/'),
                path
            ),
            None => PLACEHOLDER_IMAGE.to_string(),
        }
    }

    /// Whether credentials for the metadata API are configured.
    pub fn has_credentials(&self) -> bool {
        self.api_token.is_some() || self.api_key.is_some()
    }
}

/// Write the commented default configuration if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::config_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// Write the commented default configuration to `path` if it is missing.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_file_parses_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cinefav").join(CONFIG_FILE);
        ensure_default_config_at(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.favorites_key, "fav-movies");
        assert_eq!(config.language, "en-US");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert!(config.watch_storage);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            concat!(
                "favorites_key = \"tmdb:favorites\"\n",
                "watch_storage = false\n",
                "api_token = \"  \"\n",
                "api_key = \"abc\"\n",
            ),
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.favorites_key, "tmdb:favorites");
        assert!(!config.watch_storage);
        assert_eq!(config.api_token, None);
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert!(config.has_credentials());
        Ok(())
    }

    #[test]
    fn existing_file_is_left_alone() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "language = \"id-ID\"\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "language = \"id-ID\"\n");
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "image_base_url = \"https://file.example/t/p\"\n")?;

        // No other test reads or sets this variable.
        std::env::set_var("CINEFAV_IMAGE_BASE_URL", "https://env.example/t/p");
        let loaded = AppConfig::load_from(&path);
        std::env::remove_var("CINEFAV_IMAGE_BASE_URL");

        assert_eq!(loaded?.image_base_url, "https://env.example/t/p");
        Ok(())
    }

    #[test]
    fn image_urls() {
        let config = AppConfig {
            image_base_url: "https://img.example/t/p/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.image_url(Some("/poster.jpg")),
            "https://img.example/t/p/w500/poster.jpg"
        );
        assert_eq!(config.image_url(None), PLACEHOLDER_IMAGE);
        assert_eq!(config.image_url(Some("")), PLACEHOLDER_IMAGE);
    }
}
