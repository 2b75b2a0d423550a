// Komari dashboard HTTP client
//
// Wraps `reqwest::Client` with Komari-specific URL construction, bearer
// API-key injection, and `{status, message, data}` envelope unwrapping.
// Endpoint groups (rpc, auth, records, admin) are implemented as inherent
// methods in separate files to keep this module focused on transport.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthStrategy;
use crate::error::Error;
use crate::models::Envelope;
use crate::rpc::RequestIdGenerator;
use crate::transport::TransportConfig;

/// Raw HTTP client for a single Komari dashboard.
///
/// Cheap to clone: clones share the HTTP connection pool, the cookie jar
/// and the JSON-RPC request id counter, so ids stay unique across every
/// clone of one client.
#[derive(Clone)]
pub struct KomariClient {
    http: reqwest::Client,
    base_url: Url,
    strategy: AuthStrategy,
    ids: Arc<RequestIdGenerator>,
    /// Cookie jar reference for inspecting the session cookie.
    cookie_jar: Option<Arc<Jar>>,
}

impl KomariClient {
    /// Create a client from a base URL, an optional API key and a transport config.
    ///
    /// A non-empty API key is sent as `Authorization: Bearer <key>` on every
    /// request. A cookie jar is always attached so that a session
    /// established through [`login`](Self::login) carries over to later calls.
    pub fn new(
        base_url: Url,
        api_key: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();

        let mut headers = HeaderMap::new();
        let api_key = api_key.filter(|key| !key.expose_secret().is_empty());
        let strategy = if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|e| Error::Authentication {
                    message: format!("invalid API key header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            AuthStrategy::ApiKey
        } else {
            AuthStrategy::Session
        };

        let http = config.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url,
            strategy,
            ids: Arc::new(RequestIdGenerator::new()),
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller owns auth headers and cookie handling.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            strategy: AuthStrategy::Session,
            ids: Arc::new(RequestIdGenerator::new()),
            cookie_jar: None,
        }
    }

    /// Build the dashboard base URL: `{https|http}://{host}`.
    ///
    /// Tolerates a scheme the user already typed (it is replaced according
    /// to `ssl`) and trailing slashes.
    pub fn base_url_for(host: &str, ssl: bool) -> Result<Url, Error> {
        let host = host.trim();
        let host = host
            .strip_prefix("https://")
            .or_else(|| host.strip_prefix("http://"))
            .unwrap_or(host)
            .trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::NotConfigured);
        }
        let scheme = if ssl { "https" } else { "http" };
        Ok(Url::parse(&format!("{scheme}://{host}"))?)
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The dashboard base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Which auth strategy this client was built with.
    pub fn strategy(&self) -> AuthStrategy {
        self.strategy
    }

    /// The JSON-RPC request id generator shared by all clones.
    pub fn ids(&self) -> &RequestIdGenerator {
        &self.ids
    }

    /// The `Cookie` header the jar would send to the dashboard, if any.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an absolute API path such as `/api/rpc2`.
    ///
    /// Keeps any path prefix the base URL carries (reverse-proxied
    /// dashboards served under a sub-path).
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the `{status, message, data}` envelope.
    pub(crate) async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        failure: &str,
    ) -> Result<Option<T>, Error> {
        debug!("GET {url} params={query:?}");

        let resp = self.http.get(url).query(query).send().await?;
        self.parse_envelope(resp, failure).await
    }

    /// Send a POST request with an optional JSON body and unwrap the envelope.
    pub(crate) async fn post_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
        failure: &str,
    ) -> Result<Option<T>, Error> {
        debug!("POST {url}");

        let mut builder = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        self.parse_envelope(resp, failure).await
    }

    /// Require HTTP 200, decode the envelope, and return `data` on success.
    ///
    /// A non-`"success"` status yields [`Error::Api`] carrying the server
    /// message, or `failure` when the server sent none.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        failure: &str,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            debug!(status = status.as_u16(), "{failure}");
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let envelope: Envelope<T> = decode(&body, "response envelope")?;

        if envelope.is_success() {
            Ok(envelope.data)
        } else {
            Err(Error::Api {
                message: envelope.message.unwrap_or_else(|| failure.to_owned()),
            })
        }
    }
}

/// Decode a JSON body, logging which line, column and category failed.
pub(crate) fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| decode_error(&e, body, what))
}

/// Convert a serde failure into [`Error::Deserialization`] with diagnostics.
pub(crate) fn decode_error(e: &serde_json::Error, body: &str, what: &str) -> Error {
    warn!(
        category = ?e.classify(),
        line = e.line(),
        column = e.column(),
        "failed to decode {what}: {e}"
    );
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{e} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_scheme_from_ssl_flag() {
        let url = KomariClient::base_url_for("status.example.com", true).unwrap();
        assert_eq!(url.as_str(), "https://status.example.com/");

        let url = KomariClient::base_url_for("10.0.0.2:25774", false).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:25774/");
    }

    #[test]
    fn base_url_replaces_typed_scheme_and_trailing_slash() {
        let url = KomariClient::base_url_for("http://status.example.com/", true).unwrap();
        assert_eq!(url.as_str(), "https://status.example.com/");
    }

    #[test]
    fn empty_host_is_not_configured() {
        assert!(matches!(
            KomariClient::base_url_for("  ", true),
            Err(Error::NotConfigured)
        ));
    }

    #[test]
    fn api_url_keeps_sub_path() {
        let base = Url::parse("https://example.com/komari/").unwrap();
        let client = KomariClient::with_client(reqwest::Client::new(), base);
        assert_eq!(
            client.api_url("/api/rpc2").unwrap().as_str(),
            "https://example.com/komari/api/rpc2"
        );
    }

    #[test]
    fn api_key_selects_bearer_strategy() {
        let base = Url::parse("https://example.com").unwrap();
        let key = SecretString::from("k-123".to_string());
        let client = KomariClient::new(base.clone(), Some(&key), &TransportConfig::default()).unwrap();
        assert_eq!(client.strategy(), AuthStrategy::ApiKey);

        let empty = SecretString::from(String::new());
        let client = KomariClient::new(base, Some(&empty), &TransportConfig::default()).unwrap();
        assert_eq!(client.strategy(), AuthStrategy::Session);
    }

    #[test]
    fn decode_error_truncates_preview() {
        let body = "x".repeat(500);
        let err = decode::<serde_json::Value>(&body, "test").unwrap_err();
        match err {
            Error::Deserialization { message, body: raw } => {
                assert!(message.len() < 400);
                assert_eq!(raw.len(), 500);
            }
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }
}
