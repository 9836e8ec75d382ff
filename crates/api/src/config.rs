//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LEDGER_BASE_URL` — remote ledger service (default: unset,
///   in-memory simulation)
/// - `COMPLIANCE_BASE_URL` — remote compliance service (default:
///   unset, in-memory simulation)
///
/// Absent variables fall back to defaults; startup never fails on
/// missing configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub ledger_base_url: Option<String>,
    pub compliance_base_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ledger_base_url: std::env::var("LEDGER_BASE_URL").ok(),
            compliance_base_url: std::env::var("COMPLIANCE_BASE_URL").ok(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when either collaborator is configured as a remote
    /// service, selecting the HTTP-backed clients at startup.
    pub fn remote_services(&self) -> bool {
        self.ledger_base_url.is_some() || self.compliance_base_url.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            ledger_base_url: None,
            compliance_base_url: None,
        }
    }
}
