use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{AspectRatio, RenderParams};

/// Application-level constants
pub const APP_NAME: &str = "Careclip";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default render poll cadence: one status request every 3 seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default render poll budget: 2 minutes (40 polls at the default cadence).
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 120;

/// Default request timeout for the script model.
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 300;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "careclip=info,careclip_lib=info,tower_http=info"
}

/// Default application data directory: ~/Careclip/.
/// `Settings` replaces it with `CARECLIP_DATA_DIR` when that is set.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// SQLite database holding users, clinical snapshots and video metadata.
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("careclip.db")
}

/// Directory rendered videos are written to (served under `/storage/videos`).
pub fn videos_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("storage").join("videos")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Prefix for public video URLs. Empty means same-origin relative URLs.
    pub public_base_url: String,
    pub reuse_enabled: bool,
    pub render_endpoint: String,
    pub render_api_key: String,
    pub render_defaults: RenderParams,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub ollama_url: String,
    pub script_model: String,
    pub script_timeout_secs: u64,
    /// Load the demo doctors, patients and records at startup.
    pub seed_demo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: app_data_dir(),
            public_base_url: String::new(),
            reuse_enabled: true,
            render_endpoint: "http://localhost:8100".into(),
            render_api_key: String::new(),
            render_defaults: RenderParams::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            ollama_url: "http://localhost:11434".into(),
            script_model: "medgemma:4b".into(),
            script_timeout_secs: DEFAULT_SCRIPT_TIMEOUT_SECS,
            seed_demo: false,
        }
    }
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(value) = get("CARECLIP_BIND_ADDR") {
            settings.bind_addr = value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: "CARECLIP_BIND_ADDR",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(value) = get("CARECLIP_DATA_DIR") {
            settings.data_dir = PathBuf::from(value);
        }
        if let Some(value) = get("CARECLIP_PUBLIC_BASE_URL") {
            settings.public_base_url = value.trim_end_matches('/').to_string();
        }
        if let Some(value) = get("REUSE_CASE_ENABLED") {
            settings.reuse_enabled = parse_bool("REUSE_CASE_ENABLED", &value)?;
        }
        if let Some(value) = get("RENDER_API_ENDPOINT") {
            settings.render_endpoint = value;
        }
        if let Some(value) = get("RENDER_API_KEY") {
            settings.render_api_key = value;
        }
        if let Some(value) = get("RENDER_AVATAR_ID") {
            settings.render_defaults.avatar_id = value;
        }
        if let Some(value) = get("RENDER_VOICE_ID") {
            settings.render_defaults.voice_id = value;
        }
        if let Some(value) = get("RENDER_RATIO") {
            settings.render_defaults.ratio =
                AspectRatio::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    var: "RENDER_RATIO",
                    value: value.clone(),
                    reason: "expected 16:9, 9:16 or 1:1".into(),
                })?;
        }
        if let Some(value) = get("RENDER_BACKGROUND") {
            settings.render_defaults.background = Some(value);
        }
        if let Some(value) = get("RENDER_CAPTIONS") {
            settings.render_defaults.captions = parse_bool("RENDER_CAPTIONS", &value)?;
        }
        if let Some(value) = get("RENDER_POLL_INTERVAL_SECS") {
            settings.poll_interval =
                Duration::from_secs(parse_positive("RENDER_POLL_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = get("RENDER_POLL_TIMEOUT_SECS") {
            settings.poll_timeout =
                Duration::from_secs(parse_positive("RENDER_POLL_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("OLLAMA_URL") {
            settings.ollama_url = value;
        }
        if let Some(value) = get("SCRIPT_MODEL") {
            settings.script_model = value;
        }
        if let Some(value) = get("SCRIPT_TIMEOUT_SECS") {
            settings.script_timeout_secs = parse_positive("SCRIPT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("CARECLIP_SEED_DEMO") {
            settings.seed_demo = parse_bool("CARECLIP_SEED_DEMO", &value)?;
        }

        Ok(settings)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
