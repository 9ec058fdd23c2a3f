//! Error types for the connectivity probe.
//!
//! Every failure the probe can hit lands in [`ProbeError`]. The binary treats
//! all variants the same way (report, linger, exit); the variants exist so that
//! logs and hints can say *what* went wrong.

use std::io::Write;
use thiserror::Error;

/// DPI-1047: Oracle client library cannot be loaded.
const DPI_CLIENT_NOT_FOUND: i32 = 1047;

/// DPI-1072: Oracle client library version is not supported.
const DPI_CLIENT_UNSUPPORTED: i32 = 1072;

/// ORA codes meaning the server rejected the supplied identity.
const ORA_AUTH_CODES: &[i32] = &[1005, 1017, 28000, 28001];

/// ORA codes meaning the session was lost after it was established.
const ORA_LOST_CONTACT_CODES: &[i32] = &[3113, 3114, 3135];

/// Main error type for the probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The Oracle client library is missing or unusable.
    #[error("Driver error: {message}")]
    Driver {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server could not be reached or dropped the session.
    #[error("Connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server rejected the username or password.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the operator.
        hint: Option<String>,
    },

    /// Query execution failed.
    #[error("{message}")]
    Query {
        /// Server error message.
        message: String,
        /// Oracle error code (e.g., "ORA-00942").
        code: Option<String>,
    },

    /// No password could be resolved for the descriptor.
    #[error("Credentials error: {message}")]
    Credentials {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the operator.
        hint: Option<String>,
    },

    /// OS keychain error.
    #[error("Keyring error: {message}")]
    Keyring {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the operator.
        hint: Option<String>,
    },

    /// Local file storage error (credentials file).
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the operator.
        hint: Option<String>,
    },

    /// Invalid configuration.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Writing to the console failed.
    #[error("Output error: {message}")]
    Output {
        /// Human-readable error message.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    // ========== Constructors ==========

    /// Create a new driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver { message: message.into(), source: None }
    }

    /// Create a new driver error with source.
    pub fn driver_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Driver { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Create a new connection error with source.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            hint: Some("Check username and password".to_string()),
        }
    }

    /// Create a new query error.
    pub fn query(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Query { message: message.into(), code }
    }

    /// Create a new credentials error.
    pub fn credentials(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::Credentials { message: message.into(), hint: hint.map(String::from) }
    }

    /// Create a new storage error.
    pub fn storage(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::Storage { message: message.into(), hint: hint.map(String::from) }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new config error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(Box::new(source)) }
    }

    // ========== Methods ==========

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Driver { .. } => "Driver",
            Self::Connection { .. } => "Connection",
            Self::Authentication { .. } => "Authentication",
            Self::Query { .. } => "Query",
            Self::Credentials { .. } => "Credentials",
            Self::Keyring { .. } => "Keyring",
            Self::Storage { .. } => "Storage",
            Self::Config { .. } => "Config",
            Self::Output { .. } => "Output",
        }
    }

    /// Get actionable hint for the operator.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Driver { .. } => {
                Some("Install Oracle Instant Client and add it to the library search path")
            }
            Self::Connection { .. } => Some("Check that the listener is running and reachable"),
            Self::Authentication { hint, .. } => hint.as_deref(),
            Self::Query { .. } => None,
            Self::Credentials { hint, .. } => hint.as_deref(),
            Self::Keyring { hint, .. } => hint.as_deref(),
            Self::Storage { hint, .. } => hint.as_deref(),
            Self::Config { .. } => None,
            Self::Output { .. } => None,
        }
    }

    /// Get the Oracle error code (if applicable).
    pub fn ora_code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Write `heading`, the error and its full cause chain to `out`.
///
/// Layout:
///
/// ```text
/// Connection failed:
/// Connection error: ORA-12541: TNS:no listener
/// Caused by: ORA-12541: TNS:no listener
/// Hint: Check that the listener is running and reachable
/// ```
pub fn write_trace(out: &mut dyn Write, heading: &str, err: &ProbeError) -> std::io::Result<()> {
    writeln!(out, "{heading}")?;
    writeln!(out, "{err}")?;

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        writeln!(out, "Caused by: {cause}")?;
        source = cause.source();
    }

    if let Some(hint) = err.hint() {
        writeln!(out, "Hint: {hint}")?;
    }
    out.flush()
}

// ========== Error Conversions ==========

/// Convert from oracle::Error to ProbeError, classified by ORA/DPI code.
impl From<oracle::Error> for ProbeError {
    fn from(err: oracle::Error) -> Self {
        let (is_dpi, code, message) = match &err {
            oracle::Error::DpiError(db_err) => (true, db_err.code(), db_err.message().to_string()),
            oracle::Error::OciError(db_err) => (false, db_err.code(), db_err.message().to_string()),
            _ => return ProbeError::query(err.to_string(), None),
        };

        if is_dpi {
            if code == DPI_CLIENT_NOT_FOUND || code == DPI_CLIENT_UNSUPPORTED {
                return ProbeError::driver_with_source(message, err);
            }
            return ProbeError::driver_with_source(format!("DPI-{code:04}: {message}"), err);
        }

        if ORA_AUTH_CODES.contains(&code) {
            return ProbeError::Authentication {
                message,
                hint: Some(
                    "The server rejected the credentials - check username and password".to_string(),
                ),
            };
        }
        if (12150..=12999).contains(&code) || ORA_LOST_CONTACT_CODES.contains(&code) {
            return ProbeError::connection_with_source(message, err);
        }
        ProbeError::query(message, Some(format!("ORA-{code:05}")))
    }
}

/// Convert from std::io::Error to ProbeError.
impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Output { message: err.to_string(), source: err }
    }
}

/// Convert from serde_json::Error to ProbeError.
impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::config_with_source(format!("JSON error: {err}"), err)
    }
}

/// Convert from keyring::Error to ProbeError.
impl From<keyring::Error> for ProbeError {
    fn from(err: keyring::Error) -> Self {
        ProbeError::Keyring {
            message: err.to_string(),
            hint: Some("Grant oraprobe access to the system keychain".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_includes_heading_message_and_hint() {
        let err = ProbeError::connection("ORA-12541: TNS:no listener");
        let mut buf: Vec<u8> = Vec::new();
        write_trace(&mut buf, "Connection failed:", &err).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Connection failed:");
        assert_eq!(lines[1], "Connection error: ORA-12541: TNS:no listener");
        assert_eq!(lines[2], "Hint: Check that the listener is running and reachable");
    }

    #[test]
    fn test_trace_walks_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = ProbeError::connection_with_source("session lost", io);
        let mut buf: Vec<u8> = Vec::new();
        write_trace(&mut buf, "Connection failed:", &err).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Connection error: session lost\n"));
        assert!(text.contains("Caused by: pipe closed\n"));
    }

    #[test]
    fn test_query_error_has_no_hint() {
        let err = ProbeError::query("ORA-00942: table or view does not exist", Some("ORA-00942".into()));
        assert_eq!(err.category(), "Query");
        assert_eq!(err.ora_code(), Some("ORA-00942"));
        assert!(err.hint().is_none());
        assert_eq!(err.to_string(), "ORA-00942: table or view does not exist");
    }

    #[test]
    fn test_authentication_carries_default_hint() {
        let err = ProbeError::authentication("ORA-01017: invalid username/password");
        assert_eq!(err.category(), "Authentication");
        assert_eq!(err.hint(), Some("Check username and password"));
    }

    #[test]
    fn test_io_error_maps_to_output() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err: ProbeError = io.into();
        assert_eq!(err.category(), "Output");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_error_maps_to_config() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ProbeError = json_err.into();
        assert_eq!(err.category(), "Config");
        assert!(err.to_string().starts_with("Config error: JSON error:"));
    }
}
