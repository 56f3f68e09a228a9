use anyhow::anyhow;
use log::LevelFilter;
use std::path::PathBuf;

pub const LOG_ENV: &str = "ROSTERD_LOG";
pub const WORKSPACE_ENV: &str = "ROSTERD_WORKSPACE";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: LevelFilter,
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Warn,
            workspace: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(raw) = get(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.log_level = raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("{LOG_ENV} must be one of off|error|warn|info|debug|trace, got {raw:?}"))?;
        }

        cfg.workspace = get(WORKSPACE_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(cfg)
    }
}
