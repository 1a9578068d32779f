use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:95.0) Gecko/20100101 Firefox/95.0";
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings shared by every save task of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub concurrency: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub output_dir: PathBuf,
    pub footer: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output_dir: PathBuf::from("."),
            footer: true,
        }
    }
}

/// Optional values, as read from a JSON config file or the command line.
/// Unset fields fall through to the next layer.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub footer: Option<bool>,
}

impl ConfigOverrides {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }
}

impl Config {
    /// Builds the effective config: defaults, then `file`, then `cli`.
    pub fn layered(file: Option<ConfigOverrides>, cli: ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();
        for layer in file.into_iter().chain(std::iter::once(cli)) {
            config.apply(layer);
        }
        if config.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        Ok(config)
    }

    fn apply(&mut self, layer: ConfigOverrides) {
        if let Some(concurrency) = layer.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(secs) = layer.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = layer.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(output_dir) = layer.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(footer) = layer.footer {
            self.footer = footer;
        }
    }
}
