//! Password lookup with configurable providers.
//!
//! The probe never carries a password in source or in its config file.
//! [`CredentialService`] resolves one at run time:
//!
//! 1. `ORAPROBE_PASSWORD` environment variable
//! 2. The store provider:
//!    - **Debug builds**: JSON file at `~/.config/oraprobe/credentials.json`
//!      (override with `ORAPROBE_USE_KEYCHAIN=1`)
//!    - **Release builds**: OS keychain (macOS Keychain, Windows Credential
//!      Manager, Linux Secret Service)

use crate::error::ProbeError;
use crate::models::ConnectDescriptor;

use keyring::Entry;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Service name used for keychain entries.
const KEYRING_SERVICE: &str = "dev.oraprobe.Oraprobe";

/// Environment variable holding the password.
pub const PASSWORD_ENV: &str = "ORAPROBE_PASSWORD";

/// Environment variable to force keychain usage in debug builds.
const FORCE_KEYCHAIN_ENV: &str = "ORAPROBE_USE_KEYCHAIN";

// ============================================================================
// CredentialsProvider Trait
// ============================================================================

/// Trait for password lookup providers.
pub trait CredentialsProvider: Send + Sync {
    /// Get a credential.
    fn get(&self, key: &str) -> Result<Option<String>, ProbeError>;

    /// Check if a credential exists.
    fn exists(&self, key: &str) -> Result<bool, ProbeError> {
        Ok(self.get(key)?.is_some())
    }

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

// ============================================================================
// EnvCredentialsProvider
// ============================================================================

/// Provider returning the value of one environment variable for every key.
#[derive(Debug)]
pub struct EnvCredentialsProvider {
    var: String,
}

impl Default for EnvCredentialsProvider {
    fn default() -> Self {
        Self { var: PASSWORD_ENV.to_string() }
    }
}

impl EnvCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a different variable (for testing).
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialsProvider for EnvCredentialsProvider {
    fn get(&self, _key: &str) -> Result<Option<String>, ProbeError> {
        Ok(std::env::var(&self.var).ok().filter(|v| !v.is_empty()))
    }

    fn name(&self) -> &'static str {
        "EnvCredentialsProvider"
    }
}

// ============================================================================
// FileCredentialsProvider
// ============================================================================

/// File-based password lookup for development builds.
///
/// Reads a JSON file at `~/.config/oraprobe/credentials.json`, once, when the
/// provider is created. A missing file means no passwords.
#[derive(Debug)]
pub struct FileCredentialsProvider {
    /// Path to the credentials file.
    file_path: PathBuf,
    /// Passwords read from the file.
    cache: RwLock<HashMap<String, String>>,
}

/// Credentials file format.
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    credentials: HashMap<String, String>,
}

impl FileCredentialsProvider {
    /// Create a file provider reading the default location.
    pub fn new() -> Result<Self, ProbeError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ProbeError::storage("Could not determine config directory", None))?;

        Self::with_path(config_dir.join("oraprobe").join("credentials.json"))
    }

    /// Create with a custom file path.
    pub fn with_path(file_path: PathBuf) -> Result<Self, ProbeError> {
        let provider = Self { file_path, cache: RwLock::new(HashMap::new()) };
        provider.load_from_file()?;
        Ok(provider)
    }

    /// Load credentials from file into cache.
    fn load_from_file(&self) -> Result<(), ProbeError> {
        if !self.file_path.exists() {
            return Ok(());
        }

        let contents = fs::read_to_string(&self.file_path).map_err(|e| {
            ProbeError::storage(format!("Failed to read credentials file: {e}"), None)
        })?;

        if contents.trim().is_empty() {
            return Ok(());
        }

        let creds_file: CredentialsFile = serde_json::from_str(&contents).map_err(|e| {
            ProbeError::storage(
                format!("Invalid credentials file format: {e}"),
                Some("Expected {\"credentials\": {\"db:<user>@<host>:<port>/<service>\": \"...\"}}"),
            )
        })?;

        tracing::debug!(
            path = %self.file_path.display(),
            entries = creds_file.credentials.len(),
            "Credentials file loaded"
        );
        *self.cache.write() = creds_file.credentials;
        Ok(())
    }
}

impl CredentialsProvider for FileCredentialsProvider {
    fn get(&self, key: &str) -> Result<Option<String>, ProbeError> {
        Ok(self.cache.read().get(key).cloned())
    }

    fn name(&self) -> &'static str {
        "FileCredentialsProvider"
    }
}

// ============================================================================
// KeychainCredentialsProvider
// ============================================================================

/// Keychain-based password lookup for release builds.
#[derive(Debug)]
pub struct KeychainCredentialsProvider {
    /// Service name for keychain entries.
    service: String,
}

impl Default for KeychainCredentialsProvider {
    fn default() -> Self {
        Self { service: KEYRING_SERVICE.to_string() }
    }
}

impl KeychainCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialsProvider for KeychainCredentialsProvider {
    fn get(&self, key: &str) -> Result<Option<String>, ProbeError> {
        match Entry::new(&self.service, key)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "KeychainCredentialsProvider"
    }
}

// ============================================================================
// CredentialService
// ============================================================================

/// Select the store provider consulted after the environment.
fn select_store_provider() -> Box<dyn CredentialsProvider> {
    let force_keychain = std::env::var(FORCE_KEYCHAIN_ENV).map(|v| v == "1").unwrap_or(false);

    #[cfg(debug_assertions)]
    {
        if force_keychain {
            tracing::debug!(
                provider = "KeychainCredentialsProvider",
                reason = "ORAPROBE_USE_KEYCHAIN=1",
                "Using keychain provider (override)"
            );
            return Box::new(KeychainCredentialsProvider::new());
        }

        match FileCredentialsProvider::new() {
            Ok(provider) => {
                tracing::debug!(
                    provider = "FileCredentialsProvider",
                    reason = "debug build",
                    "Using file-based credential storage"
                );
                Box::new(provider)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create file provider, falling back to keychain");
                Box::new(KeychainCredentialsProvider::new())
            }
        }
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = force_keychain;
        tracing::debug!(
            provider = "KeychainCredentialsProvider",
            reason = "release build",
            "Using keychain credential storage"
        );
        Box::new(KeychainCredentialsProvider::new())
    }
}

/// Password resolution service.
///
/// Consults its providers in order and returns the first password found.
pub struct CredentialService {
    providers: Vec<Box<dyn CredentialsProvider>>,
}

impl CredentialService {
    /// Create the default chain: environment, then the build-type store.
    pub fn new() -> Self {
        let providers: Vec<Box<dyn CredentialsProvider>> =
            vec![Box::new(EnvCredentialsProvider::new()), select_store_provider()];
        let service = Self { providers };
        tracing::info!(providers = ?service.provider_names(), "Credential service initialized");
        service
    }

    /// Create with an explicit provider chain.
    pub fn with_providers(providers: Vec<Box<dyn CredentialsProvider>>) -> Self {
        Self { providers }
    }

    /// Names of the providers, in lookup order.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn key(descriptor: &ConnectDescriptor) -> String {
        format!("db:{}", descriptor.credential_key())
    }

    /// Resolve the password for `descriptor`.
    ///
    /// A provider error stops the lookup. Returns a credentials error when no
    /// provider has a password. The password is never logged.
    pub fn resolve_password(&self, descriptor: &ConnectDescriptor) -> Result<String, ProbeError> {
        let key = Self::key(descriptor);
        for provider in &self.providers {
            if let Some(password) = provider.get(&key)? {
                tracing::debug!(provider = provider.name(), key = %key, "Password resolved");
                return Ok(password);
            }
        }

        Err(ProbeError::credentials(
            format!("No password found for {}", descriptor.credential_key()),
            Some("Set ORAPROBE_PASSWORD or store the password under the key shown"),
        ))
    }
}

impl Default for CredentialService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService").field("providers", &self.provider_names()).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_credentials(path: &std::path::Path, entries: &[(&str, &str)]) {
        let credentials: serde_json::Map<String, serde_json::Value> =
            entries.iter().map(|(k, v)| (k.to_string(), serde_json::Value::from(*v))).collect();
        let body = serde_json::json!({ "credentials": credentials });
        fs::write(path, body.to_string()).unwrap();
    }

    #[test]
    fn test_file_provider_reads_entries() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("creds.json");
        write_credentials(&file_path, &[("test_key", "test_value")]);

        let provider = FileCredentialsProvider::with_path(file_path).unwrap();
        assert_eq!(provider.get("test_key").unwrap(), Some("test_value".to_string()));
        assert!(provider.exists("test_key").unwrap());
        assert_eq!(provider.get("other_key").unwrap(), None);
    }

    #[test]
    fn test_file_provider_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("absent").join("creds.json");

        let provider = FileCredentialsProvider::with_path(file_path.clone()).unwrap();
        assert!(!provider.exists("any").unwrap());
        assert!(!file_path.exists());
        assert!(!dir.path().join("absent").exists());
    }

    #[test]
    fn test_file_provider_empty_file_is_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("creds.json");
        fs::write(&file_path, "  \n").unwrap();

        let provider = FileCredentialsProvider::with_path(file_path).unwrap();
        assert_eq!(provider.get("any").unwrap(), None);
    }

    #[test]
    fn test_file_provider_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("creds.json");
        fs::write(&file_path, "not json").unwrap();

        let err = FileCredentialsProvider::with_path(file_path).unwrap_err();
        assert_eq!(err.category(), "Storage");
    }

    #[test]
    fn test_env_provider_reads_variable() {
        let provider = EnvCredentialsProvider::with_var("ORAPROBE_TEST_PASSWORD_SET");
        std::env::set_var("ORAPROBE_TEST_PASSWORD_SET", "from-env");
        assert_eq!(provider.get("any").unwrap(), Some("from-env".to_string()));
        std::env::remove_var("ORAPROBE_TEST_PASSWORD_SET");
        assert_eq!(provider.get("any").unwrap(), None);
    }

    #[test]
    fn test_env_provider_ignores_empty_value() {
        let provider = EnvCredentialsProvider::with_var("ORAPROBE_TEST_PASSWORD_EMPTY");
        std::env::set_var("ORAPROBE_TEST_PASSWORD_EMPTY", "");
        assert_eq!(provider.get("any").unwrap(), None);
        std::env::remove_var("ORAPROBE_TEST_PASSWORD_EMPTY");
    }

    #[test]
    fn test_service_prefers_first_provider() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("creds.json");
        write_credentials(&file_path, &[("db:unzip_user@oracle-server:1521/FREEPDB1", "from-file")]);
        let file = FileCredentialsProvider::with_path(file_path).unwrap();
        let descriptor = ConnectDescriptor::default();

        std::env::set_var("ORAPROBE_TEST_PASSWORD_CHAIN", "from-env");
        let service = CredentialService::with_providers(vec![
            Box::new(EnvCredentialsProvider::with_var("ORAPROBE_TEST_PASSWORD_CHAIN")),
            Box::new(file),
        ]);
        assert_eq!(service.resolve_password(&descriptor).unwrap(), "from-env");

        std::env::remove_var("ORAPROBE_TEST_PASSWORD_CHAIN");
        assert_eq!(service.resolve_password(&descriptor).unwrap(), "from-file");
    }

    #[test]
    fn test_service_looks_up_by_descriptor_key() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("creds.json");
        write_credentials(&file_path, &[("db:scott@db:1521/ORCL", "tiger")]);
        let service = CredentialService::with_providers(vec![Box::new(
            FileCredentialsProvider::with_path(file_path).unwrap(),
        )]);

        let descriptor = ConnectDescriptor::new("db", "ORCL", "scott");
        assert_eq!(service.resolve_password(&descriptor).unwrap(), "tiger");
        assert!(service.resolve_password(&ConnectDescriptor::default()).is_err());
    }

    #[test]
    fn test_service_missing_password_is_credentials_error() {
        let service = CredentialService::with_providers(vec![Box::new(
            EnvCredentialsProvider::with_var("ORAPROBE_TEST_PASSWORD_UNSET"),
        )]);
        let err = service.resolve_password(&ConnectDescriptor::default()).unwrap_err();
        assert_eq!(err.category(), "Credentials");
        assert!(err.to_string().contains("unzip_user@oracle-server:1521/FREEPDB1"));
    }
}
