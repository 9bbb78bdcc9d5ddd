//! Configuration loading for SmishGuard.
//!
//! Secrets come from the process environment (a `.env` file is honoured).
//! Everything else is read from `smishguard.toml` in the current directory,
//! or from the path in the `SMISHGUARD_CONFIG` env var, with a default for
//! every field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";
pub const ENV_CLOUD_URL: &str = "IBM_CLOUD_URL";
pub const ENV_CONFIG_PATH: &str = "SMISHGUARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "smishguard.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is missing or empty")]
    MissingEnv(&'static str),

    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Credentials and identifiers for the hosted model platform.
#[derive(Debug)]
pub struct Secrets {
    pub api_key: SecretString,
    pub project_id: String,
    pub cloud_url: String,
}

impl Secrets {
    /// Read the three required variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the required variables through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        Ok(Self {
            api_key: SecretString::from(require(ENV_API_KEY)?),
            project_id: require(ENV_PROJECT_ID)?,
            cloud_url: require(ENV_CLOUD_URL)?.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub known_items: KnownItemsConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub watsonx: WatsonxConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownItemsConfig {
    #[serde(default = "default_messages_path")]
    pub messages_path: PathBuf,
    #[serde(default = "default_urls_path")]
    pub urls_path: PathBuf,
}

fn default_messages_path() -> PathBuf { PathBuf::from("./data/known_messages.txt") }
fn default_urls_path()     -> PathBuf { PathBuf::from("./data/known_urls.txt") }

impl Default for KnownItemsConfig {
    fn default() -> Self {
        Self { messages_path: default_messages_path(), urls_path: default_urls_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
    /// Program and arguments run when the index directory is missing or empty.
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,
}

fn default_index_dir() -> PathBuf { PathBuf::from("./vector_store") }
fn default_build_command() -> Vec<String> {
    vec!["python3".to_string(), "build_index.py".to_string()]
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { dir: default_index_dir(), build_command: default_build_command() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatsonxConfig {
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    #[serde(default = "default_deployment_id")]
    pub deployment_id: String,
    #[serde(default = "default_generation_version")]
    pub generation_api_version: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_version")]
    pub embedding_api_version: String,
}

fn default_identity_url()       -> String { "https://iam.cloud.ibm.com/identity/token".to_string() }
fn default_deployment_id()      -> String { "47f04daa-ce50-4317-8712-bef7dc271031".to_string() }
fn default_generation_version() -> String { "2021-05-01".to_string() }
fn default_embedding_model()    -> String { "ibm/slate-125m-english-rtrvr".to_string() }
fn default_embedding_version()  -> String { "2023-10-25".to_string() }

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            identity_url: default_identity_url(),
            deployment_id: default_deployment_id(),
            generation_api_version: default_generation_version(),
            embedding_model: default_embedding_model(),
            embedding_api_version: default_embedding_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize { 3 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_http_secs")]
    pub http_secs: u64,
    #[serde(default = "default_index_build_secs")]
    pub index_build_secs: u64,
}

fn default_http_secs()        -> u64 { 30 }
fn default_index_build_secs() -> u64 { 600 }

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { http_secs: default_http_secs(), index_build_secs: default_index_build_secs() }
    }
}

impl TimeoutConfig {
    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }

    pub fn index_build(&self) -> Duration {
        Duration::from_secs(self.index_build_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "0.0.0.0:3000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Settings {
    /// Parse settings from a TOML string and validate them.
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from `path`. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be at least 1".into()));
        }
        if self.timeouts.http_secs == 0 || self.timeouts.index_build_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if self.index.build_command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("index.build_command must name a program".into()));
        }
        Ok(())
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug)]
pub struct Config {
    pub secrets: Secrets,
    pub settings: Settings,
}


impl Config {
    /// Load `.env`, the required secrets, and the optional settings file.
    ///
    /// An explicit `SMISHGUARD_CONFIG` path must exist; the default
    /// `smishguard.toml` may be absent, in which case defaults apply.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env loaded: {e}");
        }

        let secrets = Secrets::from_env()?;

        let settings = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Settings::load_from(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Settings::load_from(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => {
                tracing::info!("{DEFAULT_CONFIG_PATH} not found, using default settings");
                Settings::default()
            }
        };

        Ok(Self { secrets, settings })
    }
}
