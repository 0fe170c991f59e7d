use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Client configuration, owned by the application root and passed to the
/// components that need it. Values come from defaults plus environment
/// overrides; nothing here is a process-wide singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend, without the `/api/v1` prefix.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Directory holding client state (token file). `None` means the
    /// default location under the user's config directory.
    pub config_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            config_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("NAGARE_API_URL") {
            if !v.trim().is_empty() {
                self.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = env::var("NAGARE_TIMEOUT_SECS") {
            self.timeout_secs = v.parse().unwrap_or(self.timeout_secs);
        }
        if let Ok(v) = env::var("NAGARE_CONFIG_DIR") {
            if !v.trim().is_empty() {
                self.config_dir = Some(PathBuf::from(v));
            }
        }
        self
    }

    /// Resolve the directory holding client state, creating nothing.
    pub fn resolved_config_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.config_dir {
            return Ok(dir.clone());
        }
        let home = env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        Ok(PathBuf::from(home).join(".config").join("nagare").join("cli"))
    }
}
