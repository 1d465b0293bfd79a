use std::env;
use std::path::PathBuf;

/// Overrides the store location
pub const STORE_ENV: &str = "TRUERATE_STORE";
/// `tracing` filter directives, e.g. `truerate=debug`
pub const LOG_ENV: &str = "TRUERATE_LOG";

const DEFAULT_LOG_FILTER: &str = "truerate=warn";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// `--store` wins over `TRUERATE_STORE`, which wins over the platform
    /// data directory.
    pub fn resolve(cli_store: Option<PathBuf>) -> Self {
        Self::from_sources(
            cli_store,
            env::var_os(STORE_ENV).map(PathBuf::from),
            env::var(LOG_ENV).ok(),
        )
    }

    fn from_sources(
        cli_store: Option<PathBuf>,
        env_store: Option<PathBuf>,
        env_log: Option<String>,
    ) -> Self {
        let store_path = cli_store
            .or(env_store.filter(|p| !p.as_os_str().is_empty()))
            .unwrap_or_else(default_store_path);

        let log_filter = env_log
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            store_path,
            log_filter,
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("truerate")
        .join("store.json")
}
