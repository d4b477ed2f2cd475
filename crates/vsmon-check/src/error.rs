/// Failures while opening or using a session against a management server.
///
/// Every variant names the server so callers can log it without extra context.
///
/// # Examples
///
/// ```rust
/// use vsmon_check::error::ConnectionError;
///
/// let err = ConnectionError::Network {
///     host: "vcenter.lab".to_string(),
///     reason: "connection refused".to_string(),
/// };
/// assert!(err.is_retryable());
/// assert!(err.to_string().contains("vcenter.lab"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// The server rejected the configured credentials.
    #[error("authentication failed for {host}: {reason}")]
    AuthFailed { host: String, reason: String },

    /// The server could not be reached.
    #[error("{host} unreachable: {reason}")]
    Network { host: String, reason: String },

    /// The server speaks an API version this check cannot talk to.
    #[error("{host} reports unsupported API version {version}")]
    ProtocolMismatch { host: String, version: String },

    /// A call on an established session failed.
    #[error("request to {host} failed: {reason}")]
    Request { host: String, reason: String },
}

impl ConnectionError {
    /// Whether reconnecting on a later cycle may succeed without a config change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Request { .. })
    }
}

/// Errors surfaced by the check and its configuration loaders.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The session could not be opened, or a call on it failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A sample carried a unit tag outside the known set.
    #[error("unsupported unit '{0}'")]
    UnsupportedUnit(String),

    /// A sample value was NaN or infinite and cannot be reported.
    #[error("non-finite value {value} in unit '{unit}'")]
    NonFiniteValue { value: f64, unit: String },

    /// An instance or `init_config` entry is missing a field or holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a configuration or fixture file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The check configuration is not valid YAML for the expected layout.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A replay fixture is not valid JSON for the expected layout.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, CheckError>;
