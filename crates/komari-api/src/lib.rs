// komari-api: Async Rust client for the Komari monitoring dashboard
//
// JSON-RPC 2.0 queries (`/api/rpc2`) and the REST `{status, message, data}`
// endpoints share one `reqwest` client with a cookie jar and an optional
// bearer API key.

pub mod admin;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod nodes;
pub mod records;
pub mod rpc;
pub mod transport;

pub use auth::AuthStrategy;
pub use client::KomariClient;
pub use error::Error;
pub use models::{
    MeData, NodeData, NodeStatusData, PingRecordData, PingTaskData, RecordData,
};
pub use records::{PingHistory, RecordWindow};
pub use rpc::RequestIdGenerator;
pub use transport::{TlsMode, TransportConfig};
