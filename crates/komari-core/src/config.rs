// ── Runtime dashboard configuration ──
//
// These types describe *how* to reach a Komari dashboard. They carry
// credential data and polling tuning, but never touch disk. The CLI
// builds a `DashboardConfig` (from a profile or a credential store) and
// hands it to `Dashboard`.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use komari_api::{KomariClient, TlsMode, TransportConfig};

use crate::credentials::{CredentialKey, CredentialStore};
use crate::error::CoreError;

/// Default live-status poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// What a failed background poll does to the dashboard state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PollMode {
    /// Log at debug level and keep the last good snapshot.
    #[default]
    BestEffort,
    /// Surface the failure as `LoadState::Error`.
    Strict,
}

/// Configuration for one Komari dashboard.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Dashboard host, optionally with port and sub-path (no scheme).
    pub host: String,
    /// `https` when true, `http` otherwise.
    pub ssl: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// One-time code sent with the login request when non-empty.
    pub two_factor_code: Option<String>,
    /// Bearer API key. Takes precedence over session login for one-shot paths.
    pub api_key: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Live-status poll period. Zero disables polling.
    pub poll_interval: Duration,
    pub poll_mode: PollMode,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            ssl: true,
            username: None,
            password: None,
            two_factor_code: None,
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_mode: PollMode::default(),
        }
    }
}

impl DashboardConfig {
    /// A dashboard is configured once it has a host.
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    /// Username and password, only when both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &SecretString)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())?;
        Some((username, password))
    }

    /// `{https|http}://{host}`.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        Ok(KomariClient::base_url_for(&self.host, self.ssl)?)
    }

    /// Build a config from an opaque credential store.
    ///
    /// Missing keys become empty fields; a missing `ssl` flag means https.
    pub fn from_credentials(store: &dyn CredentialStore) -> Self {
        let non_empty = |key: CredentialKey| store.get(key).filter(|v: &String| !v.is_empty());
        Self {
            host: store.get(CredentialKey::Link).unwrap_or_default(),
            ssl: store
                .get(CredentialKey::Ssl)
                .is_none_or(|v| matches!(v.trim(), "true" | "1" | "yes")),
            username: non_empty(CredentialKey::Username),
            password: non_empty(CredentialKey::Password).map(SecretString::from),
            api_key: non_empty(CredentialKey::ApiKey).map(SecretString::from),
            ..Self::default()
        }
    }

    /// Build a `KomariClient` for this dashboard.
    pub fn build_client(&self) -> Result<KomariClient, CoreError> {
        let url = self.base_url()?;
        Ok(KomariClient::new(
            url,
            self.api_key.as_ref(),
            &self.transport(),
        )?)
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: Some(self.timeout),
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;

    #[test]
    fn credentials_require_both_fields() {
        let mut config = DashboardConfig {
            username: Some("admin".into()),
            ..DashboardConfig::default()
        };
        assert!(config.credentials().is_none());

        config.password = Some(SecretString::from(String::new()));
        assert!(config.credentials().is_none());

        config.password = Some(SecretString::from("pw".to_string()));
        assert_eq!(config.credentials().map(|(u, _)| u), Some("admin"));
    }

    #[test]
    fn from_credentials_reads_store() {
        let store = MemoryCredentialStore::new();
        store.set(CredentialKey::Link, "status.example.com").unwrap();
        store.set(CredentialKey::Ssl, "false").unwrap();
        store.set(CredentialKey::ApiKey, "k").unwrap();
        store.set(CredentialKey::Username, "").unwrap();

        let config = DashboardConfig::from_credentials(&store);
        assert!(config.is_configured());
        assert!(!config.ssl);
        assert!(config.has_api_key());
        assert!(config.username.is_none());
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://status.example.com/"
        );
    }

    #[test]
    fn empty_store_is_not_configured() {
        let config = DashboardConfig::from_credentials(&MemoryCredentialStore::new());
        assert!(!config.is_configured());
        assert!(config.ssl);
        assert!(matches!(config.base_url(), Err(CoreError::NotConfigured)));
    }

    #[test]
    fn poll_mode_parses_kebab_case() {
        assert_eq!("best-effort".parse::<PollMode>().unwrap(), PollMode::BestEffort);
        assert_eq!(PollMode::Strict.to_string(), "strict");
    }
}
