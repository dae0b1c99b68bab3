//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::Deserialize;
use shell_lib::binary::DEFAULT_URL_TEMPLATE;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "APPSHELL";
const APP_DIR: &str = "kubectl-application-shell";

/// CLI configuration
///
/// Read from `~/.config/kubectl-application-shell/config.toml` (or `--config`)
/// and then `APPSHELL_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Root of the kubectl cache, one directory per cluster version
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// kubectl download URL template
    #[serde(default = "default_download_url_template")]
    pub download_url_template: String,

    /// Connect timeout for the download and the API server, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long kubectl waits for the debug pod to run, in seconds
    #[serde(default = "default_pod_running_timeout")]
    pub pod_running_timeout_secs: u64,

    /// Shell used when `--shell` is not given
    #[serde(default = "default_shell")]
    pub default_shell: String,
}

fn default_cache_dir() -> PathBuf {
    dirs_next::home_dir()
        .map(|home| home.join(".cache"))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

fn default_download_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_pod_running_timeout() -> u64 {
    300
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

impl ShellConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path, true, ENV_PREFIX),
            None => match Self::config_path() {
                Some(path) => Self::load_from(&path, false, ENV_PREFIX),
                None => Self::load_from(Path::new("config.toml"), false, ENV_PREFIX),
            },
        }
    }

    fn load_from(path: &Path, required: bool, env_prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(config::Environment::with_prefix(env_prefix).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join(APP_DIR).join("config.toml"))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pod_running_timeout(&self) -> Duration {
        Duration::from_secs(self.pod_running_timeout_secs)
    }
}
