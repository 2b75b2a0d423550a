use thiserror::Error;

/// Top-level error type for the `komari-api` crate.
///
/// Covers every failure mode of the dashboard API surfaces: configuration,
/// authentication, transport, JSON-RPC, and the REST `{status, message, data}`
/// envelope. `komari-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// No dashboard host configured.
    #[error("Dashboard is not properly configured")]
    NotConfigured,

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (bad credentials, non-200 on login or `/api/me`).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status other than 200.
    #[error("Request failed with HTTP status {status}")]
    Http { status: u16 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── JSON-RPC ────────────────────────────────────────────────────
    /// The response carried a JSON-RPC `error` object.
    #[error("RPC error: {message}")]
    Rpc { code: Option<i64>, message: String },

    /// The echoed response id does not belong to the request.
    #[error("RPC response id mismatch: expected {expected}, got {got}")]
    IdMismatch { expected: u64, got: u64 },

    /// Success status but the expected payload is missing.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ── REST envelope ───────────────────────────────────────────────
    /// Non-success `status` in the `{status, message, data}` envelope.
    #[error("{message}")]
    Api { message: String },
}

impl Error {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
