use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Application configuration, loaded from `botconsole.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_dir: String,
    pub seed_demo_data: bool,
    pub ingestion_delay_ms: u64,
    pub reindex_delay_ms: u64,
    pub voice_capture_delay_ms: u64,
    pub default_page_size: usize,
    /// Base URL used by [`crate::api::ConsoleClient`] when none is given.
    pub api_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_dir: "logs".to_string(),
            seed_demo_data: true,
            ingestion_delay_ms: 2000,
            reindex_delay_ms: 2000,
            voice_capture_delay_ms: 3000,
            default_page_size: 5,
            api_base_url: "http://localhost:3000/api".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with the chain: `./botconsole.toml` -> `~/botconsole.toml` -> defaults,
    /// then apply `BOT_CONSOLE_PORT` / `BOT_CONSOLE_API_URL` from the environment.
    pub fn load() -> Self {
        let mut config = Self::from_files();
        config.apply_env();
        config
    }

    fn from_files() -> Self {
        let candidates = Self::config_paths();
        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match toml::from_str::<AppConfig>(&contents) {
                    Ok(cfg) => return cfg.sanitized(),
                    Err(e) => {
                        tracing::warn!("failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("BOT_CONSOLE_PORT") {
            match port.parse() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!("ignoring invalid BOT_CONSOLE_PORT '{}'", port),
            }
        }
        if let Ok(url) = std::env::var("BOT_CONSOLE_API_URL") {
            if !url.is_empty() {
                self.api_base_url = url;
            }
        }
    }

    /// The documents table only offers fixed sizes; fall back to 5 otherwise.
    fn sanitized(mut self) -> Self {
        if crate::filter::page_size(self.default_page_size).is_none() {
            tracing::warn!(
                "default_page_size {} is not one of {:?}, using 5",
                self.default_page_size,
                crate::filter::PAGE_SIZES
            );
            self.default_page_size = 5;
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("botconsole.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("botconsole.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_dir, "logs");
        assert!(cfg.seed_demo_data);
        assert_eq!(cfg.ingestion_delay_ms, 2000);
        assert_eq!(cfg.reindex_delay_ms, 2000);
        assert_eq!(cfg.voice_capture_delay_ms, 3000);
        assert_eq!(cfg.default_page_size, 5);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_toml_deserialize() {
        let toml_str = r#"
            port = 8080
            seed_demo_data = false
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(!cfg.seed_demo_data);
        // Other fields should be defaults
        assert_eq!(cfg.reindex_delay_ms, 2000);
        assert_eq!(cfg.log_dir, "logs");
    }

    #[test]
    fn test_full_toml_deserialize() {
        let toml_str = r#"
            host = "0.0.0.0"
            port = 9000
            log_dir = "audit"
            seed_demo_data = false
            ingestion_delay_ms = 10
            reindex_delay_ms = 20
            voice_capture_delay_ms = 30
            default_page_size = 20
            api_base_url = "http://example.com/api"
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.log_dir, "audit");
        assert_eq!(cfg.ingestion_delay_ms, 10);
        assert_eq!(cfg.reindex_delay_ms, 20);
        assert_eq!(cfg.voice_capture_delay_ms, 30);
        assert_eq!(cfg.default_page_size, 20);
        assert_eq!(cfg.api_base_url, "http://example.com/api");
    }

    #[test]
    fn test_unsupported_page_size_is_replaced() {
        let cfg: AppConfig = toml::from_str("default_page_size = 7").unwrap();
        assert_eq!(cfg.sanitized().default_page_size, 5);
    }
}
