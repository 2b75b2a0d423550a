// ── Core error types ──
//
// User-facing errors from komari-core. Consumers never match on HTTP
// status codes or serde failures directly; the `From<komari_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Setup errors ─────────────────────────────────────────────────
    #[error("Dashboard is not properly configured")]
    NotConfigured,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to dashboard at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Dashboard request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Node not found: {identifier}")]
    NodeNotFound { identifier: String },

    #[error("{message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("RPC error: {message}")]
    Rpc { code: Option<i64>, message: String },

    #[error("Unexpected response from dashboard: {message}")]
    Decode { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Dashboard has been shut down")]
    ShutDown,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<komari_api::Error> for CoreError {
    fn from(err: komari_api::Error) -> Self {
        let status = err.status();
        match err {
            komari_api::Error::NotConfigured => CoreError::NotConfigured,
            komari_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            komari_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            komari_api::Error::Http { status } => CoreError::Api {
                message: format!("Dashboard returned HTTP {status}"),
                status: Some(status),
            },
            komari_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            komari_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            komari_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
            komari_api::Error::Rpc { code, message } => CoreError::Rpc { code, message },
            komari_api::Error::IdMismatch { expected, got } => CoreError::Decode {
                message: format!("RPC response id {got} does not match request id {expected}"),
            },
            komari_api::Error::MalformedResponse(message) => CoreError::Decode { message },
            komari_api::Error::Api { message } => CoreError::Api {
                message,
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn api_errors_map_to_domain_variants() {
        let err: CoreError = komari_api::Error::Authentication {
            message: "bad creds".into(),
        }
        .into();
        assert!(matches!(err, CoreError::AuthenticationFailed { ref message } if message == "bad creds"));

        let err: CoreError = komari_api::Error::Http { status: 500 }.into();
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));

        let err: CoreError = komari_api::Error::NotConfigured.into();
        assert_eq!(err.to_string(), "Dashboard is not properly configured");
    }

    #[test]
    fn envelope_message_passes_through() {
        let err: CoreError = komari_api::Error::Api {
            message: "Failed to fetch records".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Failed to fetch records");
    }
}
