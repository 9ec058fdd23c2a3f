//! Connection descriptor model.

/// Default listener port.
pub const DEFAULT_PORT: u16 = 1521;

/// Prefix of the display URL (`scheme:vendor:transport`).
const DISPLAY_URL_PREFIX: &str = "oracle:oci:";

/// Parameters needed to open one database session.
///
/// Note: The password is resolved separately via CredentialService and is
/// never stored in this struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectDescriptor {
    /// Server hostname or IP
    pub host: String,
    /// Listener port (default 1521)
    pub port: u16,
    /// Service name (e.g., "FREEPDB1")
    pub service: String,
    /// Login username
    pub username: String,
}

impl Default for ConnectDescriptor {
    fn default() -> Self {
        Self {
            host: "oracle-server".to_string(),
            port: DEFAULT_PORT,
            service: "FREEPDB1".to_string(),
            username: "unzip_user".to_string(),
        }
    }
}

impl ConnectDescriptor {
    /// Create a new descriptor with the default port.
    pub fn new(
        host: impl Into<String>,
        service: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            service: service.into(),
            username: username.into(),
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Validate the descriptor.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host is required".to_string());
        }
        if self.port == 0 {
            return Err("Port must be between 1 and 65535".to_string());
        }
        if self.service.trim().is_empty() {
            return Err("Service name is required".to_string());
        }
        if self.username.trim().is_empty() {
            return Err("Username is required".to_string());
        }
        Ok(())
    }

    /// EZConnect string handed to the Oracle client.
    pub fn connect_string(&self) -> String {
        format!("//{}:{}/{}", self.host, self.port, self.service)
    }

    /// Display URL echoed to the console (without credentials).
    pub fn display_url(&self) -> String {
        format!("{DISPLAY_URL_PREFIX}@{}", self.connect_string())
    }

    /// Lookup key for the password in a credentials provider.
    pub fn credential_key(&self) -> String {
        format!("{}@{}:{}/{}", self.username, self.host, self.port, self.service)
    }
}
