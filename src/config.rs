use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::cache::{default_ttl, DEFAULT_TTL_SECS};

/// Longest cache TTL honored from the config: one year.
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;
use crate::worker::{WorkerOptions, DEFAULT_CACHE_VERSION};

pub const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com/";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub omdb: OmdbConfig,
  pub cache: CacheConfig,
  pub search: SearchConfig,
  pub worker: WorkerConfig,
  pub images: ImagesConfig,
  /// Rows shown on the home screen, top to bottom
  pub categories: Vec<CategoryConfig>,
  pub log: LogConfig,
  /// Custom title for the header
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OmdbConfig {
  pub base_url: String,
  /// Prefer MOVIEDECK_OMDB_KEY / OMDB_API_KEY over putting the key here
  pub api_key: Option<String>,
  pub timeout_secs: u64,
}

impl Default for OmdbConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_OMDB_URL.to_string(),
      api_key: None,
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: DEFAULT_TTL_SECS,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub debounce_ms: u64,
  pub min_query_len: usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      debounce_ms: 300,
      min_query_len: 2,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
  pub enabled: bool,
  pub cache_version: String,
  /// How often expired API responses are pruned
  pub sync_interval_secs: u64,
  /// Absolute URLs fetched into the static cache on install
  pub precache: Vec<String>,
  /// Cached page served to document requests while offline
  pub offline_page: Option<String>,
  /// Response store location (default: <data_dir>/moviedeck/responses.db)
  pub database: Option<PathBuf>,
}

impl Default for WorkerConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      cache_version: DEFAULT_CACHE_VERSION.to_string(),
      sync_interval_secs: 15 * 60,
      precache: Vec::new(),
      offline_page: None,
      database: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
  /// Load posters only when their row scrolls near the screen
  pub lazy: bool,
  /// How many rows beyond the screen count as near
  pub root_margin: i32,
}

impl Default for ImagesConfig {
  fn default() -> Self {
    Self {
      lazy: true,
      root_margin: 2,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
  pub title: String,
  pub query: String,
}

impl CategoryConfig {
  fn new(title: &str, query: &str) -> Self {
    Self {
      title: title.to_string(),
      query: query.to_string(),
    }
  }
}

pub fn default_categories() -> Vec<CategoryConfig> {
  vec![
    CategoryConfig::new("Popular", "batman"),
    CategoryConfig::new("Action", "action"),
    CategoryConfig::new("Comedy", "comedy"),
  ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// EnvFilter directive used when RUST_LOG is not set
  pub level: String,
  /// Log directory (default: <data_dir>/moviedeck/logs)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./moviedeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/moviedeck/config.yaml
  ///
  /// With no file anywhere the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    if config.categories.is_empty() {
      config.categories = default_categories();
    }
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("moviedeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("moviedeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-default config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Get the OMDb API key.
  ///
  /// Checks MOVIEDECK_OMDB_KEY first, then OMDB_API_KEY, then the config file.
  pub fn api_key(&self) -> Result<String> {
    std::env::var("MOVIEDECK_OMDB_KEY")
      .or_else(|_| std::env::var("OMDB_API_KEY"))
      .ok()
      .or_else(|| self.omdb.api_key.clone())
      .filter(|key| !key.trim().is_empty())
      .ok_or_else(|| {
        eyre!(
          "OMDb API key not found. Set MOVIEDECK_OMDB_KEY or OMDB_API_KEY, or omdb.api_key in the config file."
        )
      })
  }

  pub fn omdb_url(&self) -> Result<Url> {
    Url::parse(&self.omdb.base_url)
      .map_err(|e| eyre!("Invalid omdb.base_url {}: {}", self.omdb.base_url, e))
  }

  /// A zero TTL would make every entry stale on arrival; use the default instead.
  /// Larger values are capped at `MAX_TTL_SECS`.
  pub fn cache_ttl(&self) -> chrono::Duration {
    match self.cache.ttl_secs {
      0 => default_ttl(),
      secs => i64::try_from(secs.min(MAX_TTL_SECS))
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or_else(default_ttl),
    }
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.search.debounce_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.omdb.timeout_secs)
  }

  /// Header title
  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("moviedeck")
  }

  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("moviedeck"))
  }

  pub fn worker_database(&self) -> Result<PathBuf> {
    match &self.worker.database {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("responses.db")),
    }
  }

  pub fn log_dir(&self) -> Result<PathBuf> {
    match &self.log.dir {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("logs")),
    }
  }

  pub fn worker_options(&self) -> Result<WorkerOptions> {
    let parse = |s: &str| Url::parse(s).map_err(|e| eyre!("Invalid worker URL {}: {}", s, e));
    Ok(WorkerOptions {
      cache_version: self.worker.cache_version.clone(),
      precache: self
        .worker
        .precache
        .iter()
        .map(|s| parse(s))
        .collect::<Result<Vec<_>>>()?,
      offline_page: self.worker.offline_page.as_deref().map(parse).transpose()?,
      api_base: self.omdb_url()?,
      api_ttl: self.cache_ttl(),
      sync_interval: Duration::from_secs(self.worker.sync_interval_secs),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_is_default() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.omdb.base_url, DEFAULT_OMDB_URL);
    assert_eq!(config.cache.ttl_secs, 300);
    assert_eq!(config.search.debounce_ms, 300);
    assert_eq!(config.search.min_query_len, 2);
    assert!(config.worker.enabled);
    assert_eq!(config.worker.cache_version, "v1.0.0");
    assert_eq!(config.log.level, "info");
    assert!(config.images.lazy);
    assert_eq!(config.images.root_margin, 2);
  }

  #[test]
  fn test_partial_sections() {
    let config = Config::parse(
      r#"
omdb:
  timeout_secs: 5
search:
  debounce_ms: 150
worker:
  enabled: false
  precache:
    - https://moviedeck.app/offline.html
  offline_page: https://moviedeck.app/offline.html
categories:
  - title: Sci-Fi
    query: star
"#,
    )
    .unwrap();

    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.omdb.base_url, DEFAULT_OMDB_URL);
    assert_eq!(config.debounce(), Duration::from_millis(150));
    assert_eq!(config.search.min_query_len, 2);
    assert!(!config.worker.enabled);
    assert_eq!(config.categories.len(), 1);
    assert_eq!(config.categories[0].query, "star");

    let options = config.worker_options().unwrap();
    assert_eq!(options.precache.len(), 1);
    assert!(options.offline_page.is_some());
    assert_eq!(options.api_base.as_str(), DEFAULT_OMDB_URL);
  }

  #[test]
  fn test_zero_ttl_falls_back_to_default() {
    let config = Config::parse("cache:\n  ttl_secs: 0\n").unwrap();
    assert_eq!(config.cache_ttl(), chrono::Duration::minutes(5));
    let config = Config::parse("cache:\n  ttl_secs: 60\n").unwrap();
    assert_eq!(config.cache_ttl(), chrono::Duration::seconds(60));
  }

  #[test]
  fn test_huge_ttl_is_capped() {
    let config = Config::parse("cache:\n  ttl_secs: 10000000000000000\n").unwrap();
    assert_eq!(config.cache_ttl(), chrono::Duration::days(365));
    let config = Config::parse("cache:\n  ttl_secs: 18446744073709551615\n").unwrap();
    assert_eq!(config.cache_ttl(), chrono::Duration::days(365));
    assert!(config.cache_ttl() > chrono::Duration::zero());
  }

  #[test]
  fn test_bad_worker_url_is_error() {
    let config = Config::parse("worker:\n  precache: [\"not a url\"]\n").unwrap();
    assert!(config.worker_options().is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/moviedeck.yaml"))).is_err());
  }

  #[test]
  fn test_default_categories() {
    let queries: Vec<String> = default_categories().into_iter().map(|c| c.query).collect();
    assert_eq!(queries, vec!["batman", "action", "comedy"]);
  }
}
