//! Engine configuration, read from `converge.toml` by default.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::predicate::NoHintPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "converge.toml";

/// Engine configuration (TOML).
///
/// Missing fields fall back to defaults; a missing file is the same as an
/// empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Kill command actions that run longer than this. Unset means no deadline.
    pub command_timeout_secs: Option<u64>,

    /// How actions without `creates`/`removes` hints are treated.
    pub no_hint_policy: NoHintPolicy,

    /// Stop applying a playbook after the first failed result.
    pub stop_on_failure: bool,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`. Any other read
/// failure is an error.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(EngineConfig::default()),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
