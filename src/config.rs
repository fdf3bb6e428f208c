//! App Configuration
//!
//! Values baked in at build time from the environment:
//! - `YARN_API_BASE`: backend base URL (default `http://localhost:8000/api/v1`)
//! - `YARN_WHATSAPP_NUMBER`: contact number for the homepage chat link
//! - `YARN_LOG_LEVEL`: `error`, `warn`, `info`, `debug` or `trace`

use leptos::prelude::*;

const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub whatsapp_number: Option<String>,
    pub log_level: log::LevelFilter,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            option_env!("YARN_API_BASE"),
            option_env!("YARN_WHATSAPP_NUMBER"),
            option_env!("YARN_LOG_LEVEL"),
        )
    }

    fn from_values(api_base: Option<&str>, whatsapp: Option<&str>, level: Option<&str>) -> Self {
        let api_base = api_base
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();
        let whatsapp_number = whatsapp
            .map(|n| n.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|n| !n.is_empty());
        let log_level = level
            .and_then(|l| l.parse().ok())
            .unwrap_or(log::LevelFilter::Info);
        Self { api_base, whatsapp_number, log_level }
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }

    /// `wa.me` chat link, if a number is configured
    pub fn whatsapp_link(&self) -> Option<String> {
        self.whatsapp_number.as_ref().map(|n| format!("https://wa.me/{n}"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_values(None, None, None)
    }
}

/// Get the config from context
pub fn use_config() -> AppConfig {
    expect_context::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.whatsapp_number, None);
        assert_eq!(cfg.log_level, log::LevelFilter::Info);
    }

    #[test]
    fn test_url_joining() {
        let cfg = AppConfig::from_values(Some("https://api.example.com/v1/"), None, None);
        assert_eq!(cfg.url("/admin/table-groups"), "https://api.example.com/v1/admin/table-groups");
        assert_eq!(cfg.url("homepage/tables"), "https://api.example.com/v1/homepage/tables");
    }

    #[test]
    fn test_whatsapp_number_normalized() {
        let cfg = AppConfig::from_values(None, Some("+91 98765-43210"), Some("debug"));
        assert_eq!(cfg.whatsapp_link().as_deref(), Some("https://wa.me/919876543210"));
        assert_eq!(cfg.log_level, log::LevelFilter::Debug);
    }
}
