//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL of the panel, decides secure cookies
//!   (default: `http://127.0.0.1:3001`)
//! - `PDR_DATA_DIR` - Directory holding the site snapshots (default: ./data)
//! - `PDR_CONTACT_EMAIL` - Protected contact address re-imposed after every
//!   site configuration replacement (default: contact@prodigitalreviews.com)
//! - `PDR_FALLBACK_POLICY` - `sequential` (try every credential in order) or
//!   `last` (only the last configured credential) (default: sequential)
//! - `PDR_AI_TIMEOUT_SECS` - Per-attempt timeout for AI calls (default: 30)
//! - `GEMINI_MODEL` - Model ID (default: gemini-3-flash-preview)
//! - `GEMINI_API_URL` - API base URL (default: <https://generativelanguage.googleapis.com>)
//! - `GEMINI_API_KEY` - Seeded into the credential list when every stored slot
//!   is blank
//! - `PDR_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use prodigital_core::ContactEmail;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::services::FallbackPolicy;

const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Directory of the file-backed site store
    pub data_dir: PathBuf,
    /// Generative-AI endpoint configuration
    pub gemini: GeminiConfig,
    /// Agent behaviour (fallback policy, protected fields)
    pub agent: AgentSettings,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the bootstrap key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API base URL, without the `/v1beta` path or a trailing slash
    pub api_url: String,
    /// Model ID used for admin commands and site scans
    pub model: String,
    /// Key seeded into an all-blank credential list on start-up
    pub bootstrap_key: Option<SecretString>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field(
                "bootstrap_key",
                &self.bootstrap_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            bootstrap_key: None,
        }
    }
}

/// Settings that shape how admin commands are executed and applied.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Model ID sent with every request
    pub model: String,
    /// Which credentials are tried, and in what order
    pub fallback_policy: FallbackPolicy,
    /// Upper bound for a single credential attempt
    pub attempt_timeout: Duration,
    /// Contact address that AI edits can never change
    pub contact_email: ContactEmail,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            fallback_policy: FallbackPolicy::default(),
            attempt_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            contact_email: ContactEmail::default(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("ADMIN_BASE_URL", &format!("http://{host}:{port}"));
        let data_dir = PathBuf::from(get_env_or_default("PDR_DATA_DIR", "./data"));

        let gemini = GeminiConfig::from_env()?;
        let agent = AgentSettings::from_env(&gemini.model)?;

        let json_logs = get_optional_env("PDR_LOG_FORMAT").is_some_and(|f| f == "json");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            host,
            port,
            base_url,
            data_dir,
            gemini,
            agent,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for a panel on loopback with every default applied.
    #[must_use]
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: "http://127.0.0.1:3001".to_string(),
            data_dir: data_dir.into(),
            gemini: GeminiConfig::default(),
            agent: AgentSettings::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl GeminiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_env_or_default("GEMINI_API_URL", DEFAULT_GEMINI_API_URL);
        let parsed = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("GEMINI_API_URL".to_string(), e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "GEMINI_API_URL".to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        Ok(Self {
            api_url: raw.trim_end_matches('/').to_string(),
            model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            bootstrap_key: get_optional_env("GEMINI_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
        })
    }
}

impl AgentSettings {
    fn from_env(model: &str) -> Result<Self, ConfigError> {
        let fallback_policy = get_env_or_default("PDR_FALLBACK_POLICY", "sequential")
            .parse::<FallbackPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("PDR_FALLBACK_POLICY".to_string(), e))?;

        let timeout_secs = get_env_or_default(
            "PDR_AI_TIMEOUT_SECS",
            &DEFAULT_AI_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("PDR_AI_TIMEOUT_SECS".to_string(), e.to_string()))?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PDR_AI_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let contact_email = match get_optional_env("PDR_CONTACT_EMAIL") {
            Some(raw) => ContactEmail::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("PDR_CONTACT_EMAIL".to_string(), e.to_string())
            })?,
            None => ContactEmail::default(),
        };

        Ok(Self {
            model: model.to_string(),
            fallback_policy,
            attempt_timeout: Duration::from_secs(timeout_secs),
            contact_email,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_the_variable() {
        let err = ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), "not a number".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable ADMIN_PORT: not a number"
        );
    }

    #[test]
    fn test_local_socket_addr() {
        let config = AdminConfig::local("/tmp/pdr");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_default_agent_settings() {
        let settings = AgentSettings::default();
        assert_eq!(settings.model, "gemini-3-flash-preview");
        assert_eq!(settings.fallback_policy, FallbackPolicy::Sequential);
        assert_eq!(settings.attempt_timeout, Duration::from_secs(30));
        assert_eq!(
            settings.contact_email.as_str(),
            "contact@prodigitalreviews.com"
        );
    }

    #[test]
    fn test_default_api_url() {
        assert_eq!(
            GeminiConfig::default().api_url,
            "https://generativelanguage.googleapis.com"
        );
    }

    #[test]
    fn test_gemini_config_debug_redacts_key() {
        let config = GeminiConfig {
            bootstrap_key: Some(SecretString::from("AIzaSy-super-secret")),
            ..GeminiConfig::default()
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("gemini-3-flash-preview"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSy-super-secret"));
    }
}
