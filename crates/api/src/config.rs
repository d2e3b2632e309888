//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `4003`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: Postgres connection string; the in-memory store is used when unset
/// - `DB_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `INVENTORY_BASE_URL`: inventory service base (default: `http://inventory-service:8001/inventory`)
/// - `INVENTORY_SERVICE_TOKEN`: optional bearer sent to inventory
/// - `INVENTORY_TIMEOUT_SECS`: per-call timeout (default: `15`)
/// - `PRINT_BASE_URL`: print service base; printing is skipped when unset
/// - `PRINT_TIMEOUT_SECS`: per-call timeout (default: `5`)
/// - `COMMIT_AFTER_CREATE`: commit reservations after the invoice is stored (default: `true`)
/// - `IDENTITY_BASE_URL`: when set, `/billing/*` requires an admin bearer
/// - `IDENTITY_TIMEOUT_SECS`: per-call timeout (default: `5`)
/// - `REPORT_CURRENCY`: currency code echoed in reports (default: `"COP"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub inventory_base_url: String,
    pub inventory_token: Option<String>,
    pub inventory_timeout: Duration,
    pub print_base_url: Option<String>,
    pub print_timeout: Duration,
    pub commit_after_create: bool,
    pub identity_base_url: Option<String>,
    pub identity_timeout: Duration,
    pub report_currency: String,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.db_max_connections),
            inventory_base_url: var("INVENTORY_BASE_URL").unwrap_or(defaults.inventory_base_url),
            inventory_token: var("INVENTORY_SERVICE_TOKEN"),
            inventory_timeout: var("INVENTORY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.inventory_timeout),
            print_base_url: var("PRINT_BASE_URL"),
            print_timeout: var("PRINT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.print_timeout),
            commit_after_create: var("COMMIT_AFTER_CREATE")
                .and_then(|b| parse_bool(&b))
                .unwrap_or(defaults.commit_after_create),
            identity_base_url: var("IDENTITY_BASE_URL"),
            identity_timeout: var("IDENTITY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.identity_timeout),
            report_currency: var("REPORT_CURRENCY").unwrap_or(defaults.report_currency),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4003,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            db_max_connections: 5,
            inventory_base_url: "http://inventory-service:8001/inventory".to_string(),
            inventory_token: None,
            inventory_timeout: Duration::from_secs(15),
            print_base_url: None,
            print_timeout: Duration::from_secs(5),
            commit_after_create: true,
            identity_base_url: None,
            identity_timeout: Duration::from_secs(5),
            report_currency: "COP".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4003);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.inventory_timeout, Duration::from_secs(15));
        assert!(config.commit_after_create);
        assert!(config.database_url.is_none());
        assert!(config.print_base_url.is_none());
        assert!(config.identity_base_url.is_none());
        assert_eq!(config.report_currency, "COP");
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_log_format() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }
}
