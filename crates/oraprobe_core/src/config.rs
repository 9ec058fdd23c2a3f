//! Probe configuration loading.
//!
//! Layers, lowest to highest priority:
//!
//! 1. Built-in defaults ([`ProbeConfig::default`])
//! 2. JSON file named by `ORAPROBE_CONFIG` (every field optional)
//! 3. `ORAPROBE_*` environment variables
//!
//! The password is never read here; see `services::credentials`.

use crate::error::ProbeError;
use crate::models::ProbeConfig;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "ORAPROBE_CONFIG";

const HOST_ENV: &str = "ORAPROBE_HOST";
const PORT_ENV: &str = "ORAPROBE_PORT";
const SERVICE_ENV: &str = "ORAPROBE_SERVICE";
const USER_ENV: &str = "ORAPROBE_USER";
const QUERY_ENV: &str = "ORAPROBE_QUERY";
const LINGER_ENV: &str = "ORAPROBE_LINGER_SECS";
const STRICT_EXIT_ENV: &str = "ORAPROBE_STRICT_EXIT";

/// Config file format. Missing fields keep the lower layer's value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    service: Option<String>,
    username: Option<String>,
    query: Option<String>,
    linger_secs: Option<u64>,
    strict_exit: Option<bool>,
}

impl ConfigFile {
    fn apply(self, config: &mut ProbeConfig) {
        let descriptor = &mut config.descriptor;
        if let Some(host) = self.host {
            descriptor.host = host;
        }
        if let Some(port) = self.port {
            descriptor.port = port;
        }
        if let Some(service) = self.service {
            descriptor.service = service;
        }
        if let Some(username) = self.username {
            descriptor.username = username;
        }
        if let Some(query) = self.query {
            config.query = query;
        }
        if let Some(linger_secs) = self.linger_secs {
            config.linger_secs = linger_secs;
        }
        if let Some(strict_exit) = self.strict_exit {
            config.strict_exit = strict_exit;
        }
    }
}

/// Load the configuration from the process environment.
pub fn load_config() -> Result<ProbeConfig, ProbeError> {
    load_config_with(|key| std::env::var(key).ok())
}

/// Load the configuration using `lookup` for environment variables.
pub fn load_config_with<F>(lookup: F) -> Result<ProbeConfig, ProbeError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ProbeConfig::default();

    if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        read_config_file(Path::new(&path))?.apply(&mut config);
        tracing::debug!(path = %path, "Config file applied");
    }

    apply_env(&mut config, &lookup)?;
    config.validate().map_err(ProbeError::config)?;

    tracing::debug!(
        target_url = %config.descriptor.display_url(),
        linger_secs = config.linger_secs,
        strict_exit = config.strict_exit,
        "Configuration loaded"
    );
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ProbeError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ProbeError::config_with_source(format!("Failed to read {}", path.display()), e)
    })?;
    let file: ConfigFile = serde_json::from_str(&contents)?;
    Ok(file)
}

fn apply_env<F>(config: &mut ProbeConfig, lookup: &F) -> Result<(), ProbeError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(HOST_ENV) {
        config.descriptor.host = host;
    }
    if let Some(port) = lookup(PORT_ENV) {
        config.descriptor.port = parse_env(PORT_ENV, &port)?;
    }
    if let Some(service) = lookup(SERVICE_ENV) {
        config.descriptor.service = service;
    }
    if let Some(username) = lookup(USER_ENV) {
        config.descriptor.username = username;
    }
    if let Some(query) = lookup(QUERY_ENV) {
        config.query = query;
    }
    if let Some(linger) = lookup(LINGER_ENV) {
        config.linger_secs = parse_env(LINGER_ENV, &linger)?;
    }
    if let Some(strict) = lookup(STRICT_EXIT_ENV) {
        config.strict_exit = parse_flag(STRICT_EXIT_ENV, &strict)?;
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ProbeError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .map_err(|e| ProbeError::config_with_source(format!("{key} has invalid value '{value}'"), e))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ProbeError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ProbeError::config(format!("{key} must be 1/0 or true/false, got '{value}'"))),
    }
}

/// Get the default data directory (log files live below it).
///
/// Debug builds use `./oraprobe_data` in the current directory.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./oraprobe_data")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_local_dir()
            .map(|d| d.join("oraprobe"))
            .unwrap_or_else(|| PathBuf::from("./oraprobe_data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_LINGER_SECS, DEFAULT_QUERY};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = load_config_with(env(&[])).unwrap();
        assert_eq!(config, ProbeConfig::default());
        assert_eq!(config.query, DEFAULT_QUERY);
        assert_eq!(config.linger_secs, DEFAULT_LINGER_SECS);
    }

    #[test]
    fn test_env_overrides() {
        let config = load_config_with(env(&[
            ("ORAPROBE_HOST", "db.internal"),
            ("ORAPROBE_PORT", "1522"),
            ("ORAPROBE_SERVICE", "ORCLPDB1"),
            ("ORAPROBE_USER", "scott"),
            ("ORAPROBE_QUERY", "SELECT banner FROM v$version"),
            ("ORAPROBE_LINGER_SECS", "0"),
            ("ORAPROBE_STRICT_EXIT", "true"),
        ]))
        .unwrap();

        assert_eq!(config.descriptor.connect_string(), "//db.internal:1522/ORCLPDB1");
        assert_eq!(config.descriptor.username, "scott");
        assert_eq!(config.query, "SELECT banner FROM v$version");
        assert_eq!(config.linger_secs, 0);
        assert!(config.strict_exit);
    }

    #[test]
    fn test_file_then_env_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.json");
        std::fs::write(
            &path,
            r#"{ "host": "from-file", "port": 1600, "linger_secs": 5 }"#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = load_config_with(env(&[
            ("ORAPROBE_CONFIG", path.as_str()),
            ("ORAPROBE_HOST", "from-env"),
        ]))
        .unwrap();

        assert_eq!(config.descriptor.host, "from-env");
        assert_eq!(config.descriptor.port, 1600);
        assert_eq!(config.linger_secs, 5);
        assert_eq!(config.descriptor.service, "FREEPDB1");
    }

    #[test]
    fn test_unknown_file_field_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.json");
        std::fs::write(&path, r#"{ "password": "secret" }"#).unwrap();
        let path = path.to_string_lossy().into_owned();

        let err = load_config_with(env(&[("ORAPROBE_CONFIG", path.as_str())])).unwrap_err();
        assert_eq!(err.category(), "Config");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config_with(env(&[("ORAPROBE_CONFIG", "/nonexistent/oraprobe.json")]))
            .unwrap_err();
        assert_eq!(err.category(), "Config");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = load_config_with(env(&[("ORAPROBE_PORT", "not-a-port")])).unwrap_err();
        assert!(err.to_string().contains("ORAPROBE_PORT"));

        let err = load_config_with(env(&[("ORAPROBE_PORT", "0")])).unwrap_err();
        assert!(err.to_string().contains("Port"));
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let err = load_config_with(env(&[("ORAPROBE_STRICT_EXIT", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("ORAPROBE_STRICT_EXIT"));
    }

    #[test]
    fn test_blank_query_rejected() {
        let err = load_config_with(env(&[("ORAPROBE_QUERY", " ")])).unwrap_err();
        assert_eq!(err.to_string(), "Config error: Query is required");
    }
}
