use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";
pub const CONFIG_FILE_NAME: &str = "walletenv.toml";

/// Basic-auth credentials for GitHub requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Returns `None` unless both values are non-empty.
    pub fn new(username: Option<String>, token: Option<String>) -> Option<Self> {
        match (username, token) {
            (Some(username), Some(token)) if !username.is_empty() && !token.is_empty() => {
                Some(Self { username, token })
            }
            _ => None,
        }
    }

    /// Reads `GH_USERNAME` and `GH_PAT`.
    pub fn from_env() -> Option<Self> {
        Self::new(
            std::env::var("GH_USERNAME").ok(),
            std::env::var("GH_PAT").ok(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for walletenv data
    pub data_dir: PathBuf,

    /// Directory where provider builds are extracted, one subdirectory per release tag
    pub cache_dir: PathBuf,

    /// Base URL of the GitHub REST API
    pub github_api_url: String,

    /// JSON-RPC endpoint queried when the local network is selected
    pub local_rpc_url: String,

    /// Credentials for authenticated GitHub requests
    pub credentials: Option<Credentials>,
}

/// Optional `walletenv.toml` overrides.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    cache_dir: Option<PathBuf>,
    github_api_url: Option<String>,
    local_rpc_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new_for_path(&Self::default_data_dir())
    }
}

impl Config {
    pub fn new_for_path(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cache_dir: data_dir.join("downloads"),
            github_api_url: GITHUB_API_URL.to_string(),
            local_rpc_url: LOCAL_RPC_URL.to_string(),
            credentials: None,
        }
    }

    /// Sets up a new Config for the given data directory, applying `walletenv.toml`
    /// overrides and credentials from the environment.
    /// See also [Self::default_data_dir].
    pub fn setup(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = data_dir
            .map(|d| d.to_path_buf())
            .unwrap_or_else(Self::default_data_dir);
        let mut config = Self::new_for_path(&data_dir);

        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            Error::Config(format!(
                "Failed to create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;

        let config_file = data_dir.join(CONFIG_FILE_NAME);
        if config_file.is_file() {
            tracing::debug!("Loading configuration from {}", config_file.display());
            config.apply_file(&config_file)?;
        }

        config.credentials = Credentials::from_env();
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        let overrides = toml::from_str::<ConfigToml>(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;

        if let Some(cache_dir) = overrides.cache_dir {
            self.cache_dir = if cache_dir.is_relative() {
                self.data_dir.join(cache_dir)
            } else {
                cache_dir
            };
        }
        if let Some(url) = overrides.github_api_url {
            self.github_api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = overrides.local_rpc_url {
            self.local_rpc_url = url;
        }
        Ok(())
    }

    /// `./.walletenv` when `WALLETENV_LOCAL_TEST` is set, otherwise the platform data directory.
    pub fn default_data_dir() -> PathBuf {
        if std::env::var_os("WALLETENV_LOCAL_TEST").is_some() {
            return PathBuf::from(".walletenv");
        }
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
            .join("walletenv")
    }

    pub fn with_credentials(self, credentials: Option<Credentials>) -> Self {
        Self {
            credentials,
            ..self
        }
    }
}
