// JSON-RPC 2.0 over `POST /api/rpc2`
//
// Every dashboard query that is not a plain REST endpoint goes through
// here. Request ids come from a per-client atomic counter shared by all
// clones of the client.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::{KomariClient, decode, decode_error};
use crate::error::Error;

pub const JSONRPC_VERSION: &str = "2.0";

const RPC_PATH: &str = "/api/rpc2";

/// Monotonic JSON-RPC request id source, starting at 1.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Hand out the next id. Concurrent callers never observe the same value.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a P>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
    #[serde(default)]
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl KomariClient {
    /// Call a JSON-RPC method that takes no parameters.
    pub async fn call<R: DeserializeOwned>(&self, method: &str) -> Result<R, Error> {
        self.send_rpc::<(), R>(method, None).await
    }

    /// Call a JSON-RPC method with a `params` object.
    pub async fn call_with<P, R>(&self, method: &str, params: &P) -> Result<R, Error>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.send_rpc(method, Some(params)).await
    }

    async fn send_rpc<P, R>(&self, method: &str, params: Option<&P>) -> Result<R, Error>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let id = self.ids().next_id();
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        };
        let url = self.api_url(RPC_PATH)?;
        debug!(method, id, "rpc call");

        let resp = self
            .http()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            debug!(method, status = status.as_u16(), "rpc call rejected");
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let response: RpcResponse = decode(&body, "rpc response")?;

        if let Some(err) = response.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err
                    .message
                    .unwrap_or_else(|| "Unknown RPC error".to_owned()),
            });
        }

        if let Some(got) = response.id.filter(|got| *got != id) {
            return Err(Error::IdMismatch { expected: id, got });
        }

        let result = match response.result {
            Some(Value::Null) | None => {
                return Err(Error::MalformedResponse(
                    "RPC2 response missing result".into(),
                ));
            }
            Some(result) => result,
        };

        serde_json::from_value(result).map_err(|e| decode_error(&e, &body, method))
    }
}
