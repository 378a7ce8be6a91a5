//! Configuration for progressive-image-core.
//!
//! Flags that used to be process globals (integration installed, server pass)
//! travel with each instance instead. [`Config::process`] provides the default
//! read once from the environment.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Environment variable toggling the runtime integration (`0`/`false`/`off` disables).
pub const ENV_INTEGRATION: &str = "PROGRESSIVE_IMAGE_INTEGRATION";
/// Environment variable marking a non-interactive (server) render pass.
pub const ENV_SERVER_RENDER: &str = "PROGRESSIVE_IMAGE_SSR";

static PROCESS_CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Per-instance configuration and feature flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// The supporting runtime integration is installed and active.
    pub integration_enabled: bool,
    /// Rendering happens in a non-interactive (server) pass.
    pub server_render: bool,
    /// Placeholder fade duration once the main image has loaded.
    pub fade_duration_ms: u32,
    /// Margin handed to the visibility observer so fetches start slightly early.
    pub root_margin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            integration_enabled: true,
            server_render: false,
            fade_duration_ms: 500,
            root_margin: "200px".to_string(),
        }
    }
}

impl Config {
    /// Process-wide defaults, resolved from the environment on first use.
    pub fn process() -> Self {
        PROCESS_CONFIG.clone()
    }

    /// Build a config from environment variables, falling back to [`Config::default`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(flag) = lookup(ENV_INTEGRATION).and_then(|v| parse_flag(&v)) {
            cfg.integration_enabled = flag;
        }
        if let Some(flag) = lookup(ENV_SERVER_RENDER).and_then(|v| parse_flag(&v)) {
            cfg.server_render = flag;
        }
        cfg
    }

    /// Config for a server render pass.
    pub fn server() -> Self {
        Self {
            server_render: true,
            ..Self::default()
        }
    }

    /// Parse a JSON config object; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, crate::error::ImageError> {
        serde_json::from_str(s).map_err(|e| crate::error::ImageError::Config(e.to_string()))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
