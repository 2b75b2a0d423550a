//! Shared configuration for Komari tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `komari_core::DashboardConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use komari_core::{
    CoreError, CredentialKey, CredentialStore, DashboardConfig, PollMode, TlsVerification,
};

const KEYRING_SERVICE: &str = "komari";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named dashboard profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The named profile, else the default one.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(String::from)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::ProfileNotFound { name }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Live-status poll period, seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default)]
    pub poll_mode: PollMode,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            poll_mode: PollMode::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    komari_core::config::DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_ssl() -> bool {
    true
}

/// A named dashboard profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Dashboard host without scheme (e.g., "status.example.com").
    pub host: String,

    /// Use https.
    #[serde(default = "default_ssl")]
    pub ssl: bool,

    /// Username for session login.
    pub username: Option<String>,

    /// Password for session login (plaintext; prefer keyring).
    pub password: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll period.
    pub poll_interval: Option<u64>,

    /// Override poll failure handling.
    pub poll_mode: Option<PollMode>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "komari", "komari").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("komari");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + `KOMARI_` environment variables.
///
/// Nested keys use a double underscore: `KOMARI_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KOMARI_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring credential store ────────────────────────────────────────

/// System keyring entries scoped to one profile (`{profile}/{key}`).
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    profile: String,
}

impl KeyringCredentialStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self, key: CredentialKey) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/{}", self.profile, key.as_ref()))
    }
}

fn keyring_error(err: &keyring::Error) -> CoreError {
    CoreError::Config {
        message: format!("keyring: {err}"),
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.entry(key).ok()?.get_password().ok()
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CoreError> {
        self.entry(key)
            .and_then(|entry| entry.set_password(value))
            .map_err(|e| keyring_error(&e))
    }

    fn remove(&self, key: CredentialKey) -> Result<(), CoreError> {
        match self.entry(key).and_then(|entry| entry.delete_credential()) {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_error(&e)),
        }
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API key: profile env var, then the store, then plaintext.
pub fn resolve_api_key(profile: &Profile, store: &dyn CredentialStore) -> Option<SecretString> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. Credential store
    if let Some(key) = store.get(CredentialKey::ApiKey).filter(|k| !k.is_empty()) {
        return Some(SecretString::from(key));
    }

    // 3. Plaintext in config
    profile.api_key.clone().map(SecretString::from)
}

/// Resolve a session password: `KOMARI_PASSWORD`, then the store, then plaintext.
pub fn resolve_password(profile: &Profile, store: &dyn CredentialStore) -> Option<SecretString> {
    if let Ok(pw) = std::env::var("KOMARI_PASSWORD") {
        return Some(SecretString::from(pw));
    }
    if let Some(pw) = store.get(CredentialKey::Password).filter(|p| !p.is_empty()) {
        return Some(SecretString::from(pw));
    }
    profile.password.clone().map(SecretString::from)
}

pub fn resolve_username(profile: &Profile) -> Option<String> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("KOMARI_USERNAME").ok())
        .filter(|u| !u.is_empty())
}

/// Username and password, both required.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    store: &dyn CredentialStore,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };
    let username = resolve_username(profile).ok_or_else(no_credentials)?;
    let password = resolve_password(profile, store).ok_or_else(no_credentials)?;
    Ok((username, password))
}

/// Build a `DashboardConfig` from a profile, no CLI flag overrides.
///
/// Credentials are optional: a dashboard without them still serves
/// public nodes.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    store: &dyn CredentialStore,
) -> Result<DashboardConfig, ConfigError> {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let config = DashboardConfig {
        host: profile.host.trim().to_owned(),
        ssl: profile.ssl,
        username: resolve_username(profile),
        password: resolve_password(profile, store),
        two_factor_code: None,
        api_key: resolve_api_key(profile, store),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        poll_interval: Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval)),
        poll_mode: profile.poll_mode.unwrap_or(defaults.poll_mode),
    };

    if config.is_configured() {
        config.base_url().map_err(|e| ConfigError::Validation {
            field: "host".into(),
            reason: e.to_string(),
        })?;
    }
    debug!(profile = profile_name, host = %config.host, "resolved dashboard config");
    Ok(config)
}
