//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Environment variable enabling request/response body logging
pub const VERBOSE_REQUEST_LOGGING: &str = "VERBOSE_REQUEST_LOGGING";

/// Environment variable listing paths that are never logged (comma-separated)
pub const REQUEST_LOG_EXCLUDE_PATHS: &str = "REQUEST_LOG_EXCLUDE_PATHS";

/// Environment variable listing extra field names to mask in logged bodies
pub const REQUEST_LOG_SENSITIVE_FIELDS: &str = "REQUEST_LOG_SENSITIVE_FIELDS";

/// Environment variable capping how many body bytes verbose logging buffers
pub const REQUEST_LOG_MAX_BODY_BYTES: &str = "REQUEST_LOG_MAX_BODY_BYTES";

/// Largest body buffered for verbose logging unless configured otherwise
pub const DEFAULT_MAX_LOGGED_BODY_BYTES: usize = 64 * 1024;

/// Paths excluded from request logging unless configured otherwise
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &["/health", "/healthz", "/metrics", "/favicon.ico"];

/// Configuration of the request logging middleware
///
/// # YAML
/// ```yaml
/// verbose_logging: true
/// excluded_paths: ["/health", "/metrics"]
/// sensitive_fields: ["ssn"]
/// max_logged_body_bytes: 65536
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLoggingConfig {
    /// Also log sanitized request and response bodies (debug level)
    pub verbose_logging: bool,

    /// Request paths (exact match) that produce no log line at all
    pub excluded_paths: HashSet<String>,

    /// Field names masked in logged bodies, on top of the built-in list
    pub sensitive_fields: Vec<String>,

    /// Bodies larger than this, or of unknown length, are never buffered
    pub max_logged_body_bytes: usize,
}

impl Default for RequestLoggingConfig {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
            sensitive_fields: Vec::new(),
            max_logged_body_bytes: DEFAULT_MAX_LOGGED_BODY_BYTES,
        }
    }
}

impl RequestLoggingConfig {
    /// Load configuration from the process environment
    ///
    /// Missing variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(VERBOSE_REQUEST_LOGGING) {
            config.verbose_logging = parse_bool(&raw);
        }

        if let Some(raw) = lookup(REQUEST_LOG_EXCLUDE_PATHS) {
            config.excluded_paths = split_list(&raw).collect();
        }

        if let Some(raw) = lookup(REQUEST_LOG_SENSITIVE_FIELDS) {
            config.sensitive_fields = split_list(&raw).collect();
        }

        if let Some(limit) = lookup(REQUEST_LOG_MAX_BODY_BYTES).and_then(|raw| raw.trim().parse().ok()) {
            config.max_logged_body_bytes = limit;
        }

        config
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub fn exclude_path(mut self, path: impl Into<String>) -> Self {
        self.excluded_paths.insert(path.into());
        self
    }

    pub fn with_sensitive_field(mut self, field: impl Into<String>) -> Self {
        self.sensitive_fields.push(field.into());
        self
    }

    pub fn with_max_logged_body_bytes(mut self, limit: usize) -> Self {
        self.max_logged_body_bytes = limit;
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.contains(path)
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
