// Dashboard authentication
//
// Session login/logout and the `/api/me` probe. A successful login sets
// the session cookie in the client's jar; every later request (REST and
// RPC alike) carries it automatically. Clients built with an API key skip
// all of this and send a bearer header instead.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::debug;

use crate::client::{KomariClient, decode};
use crate::error::Error;
use crate::models::MeData;

/// Which authentication strategy a client was built with.
///
/// Marker enum: the key itself lives in the client's default headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Cookie session established by [`KomariClient::login`].
    Session,
    /// `Authorization: Bearer <key>` on every request.
    ApiKey,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(rename = "2fa_code", skip_serializing_if = "Option::is_none")]
    two_factor_code: Option<&'a str>,
}

impl KomariClient {
    /// Authenticate with username/password and an optional 2FA code.
    ///
    /// The code is only sent when non-empty. Any non-200 answer or a
    /// non-success envelope is an [`Error::Authentication`].
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        two_factor_code: Option<&str>,
    ) -> Result<(), Error> {
        let url = self.api_url("/api/login")?;
        debug!("logging in at {url}");

        let body = LoginRequest {
            username,
            password: password.expose_secret(),
            two_factor_code: two_factor_code.filter(|code| !code.is_empty()),
        };

        match self
            .post_envelope::<IgnoredAny>(url, Some(&body), "Login failed")
            .await
        {
            Ok(_) => {
                debug!("login successful");
                Ok(())
            }
            Err(Error::Http { status }) => Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            }),
            Err(Error::Api { message }) => Err(Error::Authentication { message }),
            Err(e) => Err(e),
        }
    }

    /// Fetch the current identity.
    ///
    /// `/api/me` answers 200 even for anonymous callers, so
    /// `logged_in != true` is treated as an authentication failure.
    pub async fn me(&self) -> Result<MeData, Error> {
        let url = self.api_url("/api/me")?;
        debug!("GET {url}");

        let resp = self.http().get(url).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Authentication {
                message: format!("identity check failed (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await?;
        let me: MeData = decode(&body, "identity")?;
        if me.logged_in != Some(true) {
            return Err(Error::Authentication {
                message: "not logged in".into(),
            });
        }
        Ok(me)
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("/api/logout")?;
        debug!("logging out at {url}");

        let resp = self.http().post(url).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        debug!("logout complete");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn login_body_omits_empty_two_factor_code() {
        let body = LoginRequest {
            username: "admin",
            password: "pw",
            two_factor_code: Some("").filter(|c| !c.is_empty()),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"username": "admin", "password": "pw"})
        );
    }

    #[test]
    fn login_body_carries_two_factor_code() {
        let body = LoginRequest {
            username: "admin",
            password: "pw",
            two_factor_code: Some("123456"),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["2fa_code"], "123456");
    }
}
