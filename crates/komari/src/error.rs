//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use komari_config::ConfigError;
use komari_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to dashboard at {url}")]
    #[diagnostic(
        code(komari::connection_failed),
        help(
            "Check that the dashboard is running and reachable.\n\
             Self-signed certificate? Try --insecure (-k). Plain http? Try --http."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(komari::auth_failed),
        help(
            "Verify your username, password or API key.\n\
             Run: komari config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(komari::no_credentials),
        help(
            "Configure credentials with: komari config init\n\
             Or set KOMARI_API_KEY, or KOMARI_USERNAME and KOMARI_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(komari::not_found),
        help("Run: komari {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(komari::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(komari::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(komari::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: komari config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No dashboard configured")]
    #[diagnostic(
        code(komari::no_config),
        help(
            "Create a profile with: komari config init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(komari::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(komari::keyring),
        help("Store the secret in the config file or an environment variable instead.")
    )]
    Keyring(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(komari::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(komari::timeout),
        help("Increase timeout with --timeout or check dashboard responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(komari::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::Keyring(_) => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotConfigured => CliError::NoConfig {
                path: komari_config::config_path().display().to_string(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NodeNotFound { identifier } => CliError::NotFound {
                resource_type: "node".into(),
                identifier,
                list_command: "nodes list".into(),
            },

            CoreError::Api {
                message,
                status: Some(status @ (401 | 403)),
            } => CliError::AuthFailed {
                profile: "current".into(),
                message: format!("{message} (HTTP {status})"),
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "api".into(), |s| s.to_string()),
                message,
            },

            CoreError::Rpc { code, message } => CliError::ApiError {
                code: code.map_or_else(|| "rpc".into(), |c| c.to_string()),
                message,
            },

            CoreError::Decode { message } => CliError::ApiError {
                code: "decode".into(),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::ShutDown => CliError::ApiError {
                code: "shutdown".into(),
                message: CoreError::ShutDown.to_string(),
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Keyring(message) => CliError::Keyring(message),
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let not_found: CliError = CoreError::NodeNotFound {
            identifier: "tokyo".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let forbidden: CliError = CoreError::Api {
            message: "denied".into(),
            status: Some(403),
        }
        .into();
        assert_eq!(forbidden.exit_code(), exit_code::AUTH);

        let unconfigured: CliError = CoreError::NotConfigured.into();
        assert_eq!(unconfigured.exit_code(), exit_code::USAGE);

        let rpc: CliError = CoreError::Rpc {
            code: Some(-32601),
            message: "Method not found".into(),
        }
        .into();
        assert!(matches!(rpc, CliError::ApiError { ref code, .. } if code == "-32601"));
        assert_eq!(rpc.exit_code(), exit_code::GENERAL);

        let shut_down: CliError = CoreError::ShutDown.into();
        assert!(matches!(shut_down, CliError::ApiError { ref code, .. } if code == "shutdown"));
    }

    #[test]
    fn config_errors_map_to_usage() {
        let err: CliError = ConfigError::ProfileNotFound {
            name: "lab".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
