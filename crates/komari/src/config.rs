//! CLI configuration: thin wrapper around `komari_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --api-key, etc.).

use std::time::Duration;

use secrecy::SecretString;

use komari_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use komari_config::{
    Config, KeyringCredentialStore, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help, sorted.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Build a `DashboardConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--host` plus credential flags describe the
/// dashboard on their own; failing that, the profile's keyring entries are
/// read as a bare credential store. An explicitly requested profile that
/// does not exist is an error.
pub fn build_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let store = KeyringCredentialStore::new(&profile_name);

    let mut dashboard = if let Some(profile) = cfg.profiles.get(&profile_name) {
        komari_config::profile_to_dashboard_config(profile, &profile_name, &cfg.defaults, &store)?
    } else if global.host.is_some() {
        DashboardConfig {
            username: std::env::var("KOMARI_USERNAME").ok(),
            password: std::env::var("KOMARI_PASSWORD").ok().map(SecretString::from),
            ..defaults_only(&cfg)
        }
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    } else {
        let from_store = DashboardConfig::from_credentials(&store);
        DashboardConfig {
            tls: defaults_only(&cfg).tls,
            ..from_store
        }
    };

    apply_overrides(&mut dashboard, global)?;
    tracing::debug!(
        profile = %profile_name,
        host = %dashboard.host,
        configured = dashboard.is_configured(),
        "resolved dashboard config"
    );
    Ok(dashboard)
}

/// A config carrying only the `[defaults]` section's tuning.
fn defaults_only(cfg: &Config) -> DashboardConfig {
    DashboardConfig {
        tls: if cfg.defaults.insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        },
        timeout: Duration::from_secs(cfg.defaults.timeout),
        poll_interval: Duration::from_secs(cfg.defaults.poll_interval),
        poll_mode: cfg.defaults.poll_mode,
        ..DashboardConfig::default()
    }
}

/// Flags take priority over profile and environment values.
fn apply_overrides(config: &mut DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref host) = global.host {
        config.host = host.trim().to_owned();
    }
    if global.http {
        config.ssl = false;
    }
    if let Some(ref key) = global.api_key {
        config.api_key = Some(SecretString::from(key.clone()));
    }
    if let Some(ref username) = global.username {
        config.username = Some(username.clone());
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(timeout) = global.timeout {
        config.timeout = Duration::from_secs(timeout);
    }

    if config.is_configured() {
        config.base_url().map_err(|e| CliError::Validation {
            field: "host".into(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
