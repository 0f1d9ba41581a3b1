//! Engine configuration stored under `.neuralcode/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Engine configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults; a
/// missing file is the same as an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolved paths containing any of these substrings are rejected.
    pub denied_path_substrings: Vec<String>,

    /// Keep at most this many bytes of stdout and of stderr per command.
    pub command_output_limit_bytes: usize,

    /// Kill commands running longer than this. Unset means wait forever.
    pub command_timeout_secs: Option<u64>,

    /// Number of turns retained in `.neuralcode/context.json`.
    pub context_limit: usize,

    /// Number of recent turns inlined into the system prompt.
    pub prompt_context_messages: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            denied_path_substrings: vec!["/.nvm".to_string()],
            command_output_limit_bytes: 1_000_000,
            command_timeout_secs: None,
            context_limit: 50,
            prompt_context_messages: 10,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self
            .denied_path_substrings
            .iter()
            .any(|pattern| pattern.trim().is_empty())
        {
            return Err(anyhow!("denied_path_substrings must not contain empty entries"));
        }
        if self.command_output_limit_bytes == 0 {
            return Err(anyhow!("command_output_limit_bytes must be > 0"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        if self.context_limit == 0 {
            return Err(anyhow!("context_limit must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::store::write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.command_timeout(), None);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = EngineConfig {
            command_timeout_secs: Some(30),
            denied_path_substrings: vec!["/.nvm".to_string(), "/.ssh".to_string()],
            ..EngineConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.command_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "context_limit = 5\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.context_limit, 5);
        assert_eq!(cfg.denied_path_substrings, vec!["/.nvm".to_string()]);
    }

    #[test]
    fn rejects_invalid_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "command_timeout_secs = 0\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("command_timeout_secs"));

        let cfg = EngineConfig {
            denied_path_substrings: vec![" ".to_string()],
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
