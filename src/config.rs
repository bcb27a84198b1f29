//! Runtime configuration from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_FILE: &str = "wizard-score-games.json";
const DEFAULT_STATIC_DIR: &str = "static";

/// Which persistence backend games are saved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON archive on disk
    File,
    /// Lost on restart
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    /// Archive path for the file backend
    pub data_file: PathBuf,
    /// Wrap the backend with push updates and hand out game codes
    pub live_sync: bool,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            store_backend: StoreBackend::File,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            live_sync: false,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl Config {
    /// Load config from environment variables
    ///
    /// - WIZARD_BIND_ADDR: listen address (default 0.0.0.0:3000)
    /// - WIZARD_STORE: "file" or "memory" (default file)
    /// - WIZARD_DATA_FILE: archive path for the file store
    /// - WIZARD_LIVE_SYNC: enable live viewers (true/1/yes/on)
    /// - WIZARD_STATIC_DIR: directory served for the frontend
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match env_value("WIZARD_BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid WIZARD_BIND_ADDR '{}': {}. Using {}",
                    raw,
                    e,
                    defaults.bind_addr
                );
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let store_backend = match env_value("WIZARD_STORE").map(|s| s.to_lowercase()) {
            Some(s) if s == "file" => StoreBackend::File,
            Some(s) if s == "memory" => StoreBackend::Memory,
            Some(other) => {
                tracing::warn!("Unknown WIZARD_STORE '{}', falling back to file", other);
                StoreBackend::File
            }
            None => defaults.store_backend,
        };

        let live_sync = match env_value("WIZARD_LIVE_SYNC").map(|s| s.to_lowercase()) {
            Some(s) => match s.as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                other => {
                    tracing::warn!("Invalid WIZARD_LIVE_SYNC '{}', live sync disabled", other);
                    false
                }
            },
            None => defaults.live_sync,
        };

        let config = Self {
            bind_addr,
            store_backend,
            data_file: env_value("WIZARD_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            live_sync,
            static_dir: env_value("WIZARD_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        };

        if !config.live_sync {
            tracing::info!("Live sync disabled - games will not get a join code");
        }

        config
    }
}

/// Trimmed, non-empty environment variable
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "WIZARD_BIND_ADDR",
        "WIZARD_STORE",
        "WIZARD_DATA_FILE",
        "WIZARD_LIVE_SYNC",
        "WIZARD_STATIC_DIR",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(config.store_backend, StoreBackend::File);
        assert_eq!(config.data_file, PathBuf::from("wizard-score-games.json"));
        assert!(!config.live_sync);
    }

    #[test]
    #[serial]
    fn test_reads_env() {
        clear_env();
        std::env::set_var("WIZARD_BIND_ADDR", "127.0.0.1:8080");
        std::env::set_var("WIZARD_STORE", " Memory ");
        std::env::set_var("WIZARD_LIVE_SYNC", "yes");
        std::env::set_var("WIZARD_DATA_FILE", "/tmp/games.json");

        let config = Config::from_env();
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.live_sync);
        assert_eq!(config.data_file, PathBuf::from("/tmp/games.json"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("WIZARD_BIND_ADDR", "not an address");
        std::env::set_var("WIZARD_STORE", "postgres");
        std::env::set_var("WIZARD_LIVE_SYNC", "maybe");

        let config = Config::from_env();
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(config.store_backend, StoreBackend::File);
        assert!(!config.live_sync);
        clear_env();
    }
}
