//! Reactive data layer between `komari-api` and its consumers (CLI and
//! widget-style snapshots).
//!
//! - **[`Dashboard`]**: refresh coordinator. [`load_dashboard()`](Dashboard::load_dashboard)
//!   logs in, loads the inventory then live status, and starts a fixed-interval
//!   live-status poll. Each resource has at most one fetch in flight; a newer
//!   fetch cancels the older one and a cancelled fetch never writes.
//!   [`refresh_once()`](Dashboard::refresh_once) serves scheduled one-shot callers.
//!
//! - **[`DataStore`]**: node inventory and live status in `DashMap`s with
//!   `tokio::sync::watch` snapshots, plus the derived online set.
//!
//! - **[`downsample`]**: bucket averaging for charts and stride sampling for
//!   fixed point budgets. [`series`] turns records into chart series.
//!
//! - **Domain model** ([`model`]): `Node`, `LiveStatus`, `Record`, ping
//!   samples and tasks, converted from API payloads in [`convert`].

pub mod config;
pub mod convert;
pub mod credentials;
pub mod dashboard;
pub mod downsample;
pub mod error;
pub mod format;
pub mod model;
pub mod series;
pub mod store;
pub mod widget;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DashboardConfig, PollMode, TlsVerification};
pub use credentials::{CredentialKey, CredentialStore, MemoryCredentialStore};
pub use dashboard::{
    Dashboard, DashboardSnapshot, DashboardSource, FetchPhase, LoadState, Refresh, Resource,
};
pub use downsample::{ChartPoint, Strategy};
pub use error::CoreError;
pub use model::{LiveStatus, Node, NodeSort, PingHistory, PingRecord, PingTask, Record};
pub use series::{LoadMetric, PingSeries};
pub use store::{DataStore, NodeQuery};
pub use widget::{WidgetMetric, WidgetState};

// Re-exported so consumers don't need a direct `komari-api` dependency.
pub use komari_api::{MeData, RecordWindow};
