//! Embedder-facing configuration with environment overrides.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::{EXPIRY_CHECK_INTERVAL, SESSION_LIFETIME};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the JurisFlow REST backend, including the version prefix.
    pub api_url: String,
    /// File backing the durable session store.
    pub session_file: PathBuf,
    pub session_lifetime: Duration,
    pub expiry_check_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: env::temp_dir().join("jurisflow-session.json"),
            session_lifetime: SESSION_LIFETIME,
            expiry_check_interval: EXPIRY_CHECK_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Defaults plus `JURISFLOW_API_URL` / `JURISFLOW_SESSION_FILE` overrides.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("JURISFLOW_API_URL") {
            if !url.is_empty() {
                cfg.api_url = url;
            }
        }
        if let Ok(path) = env::var("JURISFLOW_SESSION_FILE") {
            if !path.is_empty() {
                cfg.session_file = PathBuf::from(path);
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_policy() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.session_lifetime, Duration::from_secs(3600));
        assert_eq!(cfg.expiry_check_interval, Duration::from_secs(60));
    }
}
