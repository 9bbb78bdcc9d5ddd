//! Configuration for the embedding gateway.

use std::path::PathBuf;
use std::time::Duration;

/// Where the index lives and how to build it when it does not exist.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory holding the persisted `*.jsonl` index files.
    pub index_dir: PathBuf,

    /// Program and arguments that populate `index_dir`.
    pub build_command: Vec<String>,

    /// Upper bound on the build command's run time.
    pub build_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./vector_store"),
            build_command: vec!["python3".to_string(), "build_index.py".to_string()],
            build_timeout: Duration::from_secs(600),
        }
    }
}

impl GatewayConfig {
    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = dir.into();
        self
    }

    pub fn with_build_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }
}
