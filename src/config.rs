use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Bucket name used when no configuration file overrides it
pub const DEFAULT_CACHE_NAME: &str = "item-manage-v1";

/// Origin that relative asset URLs resolve against by default
pub const DEFAULT_ORIGIN: &str = "http://localhost:5000/";

/// Assets pre-cached at install time unless configured otherwise
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
  "/",
  "/static/css/bootstrap.min.css",
  "/static/css/main.css",
  "/static/css/navbar.css",
  "/static/js/bootstrap.bundle.min.js",
  "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
  "https://fonts.googleapis.com/css2?family=Noto+Sans+TC:wght@400;500;700;900&display=swap",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Name of the current cache generation (e.g. "item-manage-v2")
  pub cache_name: String,
  /// Base URL for relative entries in `static_assets`
  pub origin: String,
  /// Assets fetched and stored by install, in order
  pub static_assets: Vec<String>,
  /// Cache database location (defaults to the user data directory)
  pub database: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      cache_name: DEFAULT_CACHE_NAME.to_string(),
      origin: DEFAULT_ORIGIN.to_string(),
      static_assets: DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
      database: None,
    }
  }
}

/// Resolved, immutable settings handed to the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
  pub cache_name: String,
  pub static_assets: Vec<Url>,
}

impl WorkerConfig {
  pub fn new(cache_name: impl Into<String>, static_assets: Vec<Url>) -> Self {
    Self {
      cache_name: cache_name.into(),
      static_assets,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sw-cache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sw-cache/config.yaml
  ///
  /// Falls back to the built-in defaults when no file is found.
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("sw-cache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sw-cache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;

    if config.cache_name.trim().is_empty() {
      return Err(eyre!("cache_name must not be empty"));
    }

    Ok(config)
  }

  /// Resolve the asset list against `origin` into the interceptor's settings.
  pub fn worker_config(&self) -> Result<WorkerConfig> {
    let origin =
      Url::parse(&self.origin).map_err(|e| eyre!("Invalid origin '{}': {}", self.origin, e))?;

    let static_assets = self
      .static_assets
      .iter()
      .map(|asset| {
        origin
          .join(asset)
          .map_err(|e| eyre!("Invalid static asset URL '{}': {}", asset, e))
      })
      .collect::<Result<Vec<_>>>()?;

    // Install stores one entry per asset; a repeat would silently overwrite
    let mut seen = HashSet::new();
    for (asset, url) in self.static_assets.iter().zip(&static_assets) {
      let mut key = url.clone();
      key.set_fragment(None);
      if !seen.insert(key) {
        return Err(eyre!("Duplicate static asset '{}'", asset));
      }
    }

    Ok(WorkerConfig::new(self.cache_name.clone(), static_assets))
  }

  /// Parse a request URL, resolving it against `origin` when relative.
  pub fn resolve_url(&self, url: &str) -> Result<Url> {
    let origin =
      Url::parse(&self.origin).map_err(|e| eyre!("Invalid origin '{}': {}", self.origin, e))?;

    origin
      .join(url)
      .map_err(|e| eyre!("Invalid URL '{}': {}", url, e))
  }

  /// Cache database path.
  ///
  /// Checks SW_CACHE_DB first, then the configured path. A leading `~/`
  /// expands to the home directory.
  pub fn database_path(&self) -> Option<PathBuf> {
    std::env::var_os("SW_CACHE_DB")
      .map(PathBuf::from)
      .or_else(|| self.database.clone())
      .map(|p| expand_home(&p))
  }
}

fn expand_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), dirs::home_dir()) {
    (Ok(rest), Some(home)) => home.join(rest),
    _ => path.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_resolve_relative_assets() {
    let worker = Config::default().worker_config().unwrap();

    assert_eq!(worker.cache_name, "item-manage-v1");
    assert_eq!(worker.static_assets.len(), 7);
    assert_eq!(worker.static_assets[0].as_str(), "http://localhost:5000/");
    assert_eq!(
      worker.static_assets[2].as_str(),
      "http://localhost:5000/static/css/main.css"
    );
    assert_eq!(
      worker.static_assets[5].host_str(),
      Some("cdnjs.cloudflare.com")
    );
  }

  #[test]
  fn partial_yaml_keeps_defaults() {
    let config = Config::from_yaml("cache_name: item-manage-v2\n").unwrap();

    assert_eq!(config.cache_name, "item-manage-v2");
    assert_eq!(config.origin, DEFAULT_ORIGIN);
    assert_eq!(config.static_assets.len(), DEFAULT_STATIC_ASSETS.len());
  }

  #[test]
  fn yaml_overrides_assets_and_origin() {
    let yaml = r#"
cache_name: shop-v3
origin: https://shop.example.com/
static_assets:
  - /static/app.css
  - https://fonts.gstatic.com/s/noto.woff2
database: /tmp/shop.db
"#;
    let config = Config::from_yaml(yaml).unwrap();
    let worker = config.worker_config().unwrap();

    assert_eq!(
      worker.static_assets,
      vec![
        Url::parse("https://shop.example.com/static/app.css").unwrap(),
        Url::parse("https://fonts.gstatic.com/s/noto.woff2").unwrap(),
      ]
    );
    assert_eq!(config.database, Some(PathBuf::from("/tmp/shop.db")));
  }

  #[test]
  fn duplicate_assets_are_rejected() {
    let config = Config {
      static_assets: vec![
        "/static/css/main.css".to_string(),
        "http://localhost:5000/static/css/main.css#v2".to_string(),
      ],
      ..Config::default()
    };

    let err = config.worker_config().unwrap_err();
    assert!(err.to_string().contains("Duplicate static asset"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let home = dirs::home_dir().unwrap();
    assert_eq!(
      expand_home(Path::new("~/.local/share/sw-cache/cache.db")),
      home.join(".local/share/sw-cache/cache.db")
    );
    assert_eq!(expand_home(Path::new("/var/cache.db")), PathBuf::from("/var/cache.db"));
    assert_eq!(expand_home(Path::new("cache~.db")), PathBuf::from("cache~.db"));
  }

  #[test]
  fn empty_cache_name_is_rejected() {
    assert!(Config::from_yaml("cache_name: ''\n").is_err());
  }

  #[test]
  fn invalid_origin_is_rejected() {
    let config = Config {
      origin: "not a url".to_string(),
      ..Config::default()
    };
    assert!(config.worker_config().is_err());
  }

  #[test]
  fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn explicit_config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sw-cache.yaml");
    std::fs::write(&path, "cache_name: from-file\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.cache_name, "from-file");
  }
}
