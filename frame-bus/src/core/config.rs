use std::path::PathBuf;
use std::time::Duration;

use shared::transport::DEFAULT_MAX_FRAME_BYTES;

/// Entity store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process memory, lost on exit
    #[default]
    Memory,
    /// redb file under `WORK_DIR`
    Redb,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "redb" | "file" => Some(StoreBackend::Redb),
            _ => None,
        }
    }
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | Data and log root |
/// | BUS_LISTEN_ADDR | 127.0.0.1:8081 | TCP address the frame connects to |
/// | STORE_BACKEND | memory | `memory` or `redb` |
/// | LOG_LEVEL | info | Default filter when `RUST_LOG` is unset |
/// | LOG_JSON | false | JSON console output |
/// | LOG_DIR | (unset) | Enables daily rolling log files |
/// | HANDLER_TIMEOUT_MS | 0 | Per-request handler limit, 0 disables it |
/// | MAX_FRAME_BYTES | 1048576 | Largest accepted TCP frame |
/// | ENVIRONMENT | development | development, staging or production |
///
/// # Example
///
/// ```ignore
/// STORE_BACKEND=redb WORK_DIR=/data/bus cargo run -p frame-bus
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub listen_addr: String,
    pub store_backend: StoreBackend,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 0 means no limit
    pub handler_timeout_ms: u64,
    pub max_frame_bytes: usize,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            listen_addr: std::env::var("BUS_LISTEN_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8081".into()),
            store_backend: std::env::var("STORE_BACKEND")
                .ok()
                .and_then(|v| StoreBackend::parse(&v))
                .unwrap_or_default(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            handler_timeout_ms: std::env::var("HANDLER_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            max_frame_bytes: std::env::var("MAX_FRAME_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FRAME_BYTES),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the paths and address (tests)
    pub fn with_overrides(work_dir: impl Into<String>, listen_addr: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.listen_addr = listen_addr.into();
        config
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_ms > 0).then(|| Duration::from_millis(self.handler_timeout_ms))
    }

    /// redb file used when `store_backend` is `Redb`
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("frame-bus.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
