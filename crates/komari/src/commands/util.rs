//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use komari_core::{
    CoreError, Dashboard, LoadMetric, Node, NodeQuery, NodeSort, RecordWindow, WidgetMetric,
};

use crate::cli::{Metric, NodeFilterArgs, SortKey, Window, WidgetMetricArg};
use crate::error::CliError;

// ── Flag → domain conversions ───────────────────────────────────────

impl From<SortKey> for NodeSort {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Index => Self::Index,
            SortKey::Uptime => Self::Uptime,
            SortKey::Cpu => Self::Cpu,
            SortKey::Memory => Self::Memory,
            SortKey::Disk => Self::Disk,
            SortKey::Upload => Self::Upload,
            SortKey::Download => Self::Download,
        }
    }
}

impl From<Window> for RecordWindow {
    fn from(window: Window) -> Self {
        match window {
            Window::Hour1 => Self::Hour1,
            Window::Hours4 => Self::Hours4,
            Window::Hours6 => Self::Hours6,
            Window::Hours12 => Self::Hours12,
            Window::Day1 => Self::Day1,
            Window::Days7 => Self::Days7,
            Window::Days30 => Self::Days30,
        }
    }
}

impl From<Metric> for LoadMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Cpu => Self::Cpu,
            Metric::Gpu => Self::Gpu,
            Metric::Memory => Self::Memory,
            Metric::Disk => Self::Disk,
            Metric::NetIn => Self::NetIn,
            Metric::NetOut => Self::NetOut,
            Metric::TcpConnections => Self::TcpConnections,
            Metric::UdpConnections => Self::UdpConnections,
            Metric::Processes => Self::Processes,
        }
    }
}

impl From<WidgetMetricArg> for WidgetMetric {
    fn from(metric: WidgetMetricArg) -> Self {
        match metric {
            WidgetMetricArg::Cpu => Self::Cpu,
            WidgetMetricArg::Memory => Self::Memory,
            WidgetMetricArg::Disk => Self::Disk,
            WidgetMetricArg::NetIn => Self::NetIn,
            WidgetMetricArg::NetOut => Self::NetOut,
        }
    }
}

impl From<&NodeFilterArgs> for NodeQuery {
    fn from(args: &NodeFilterArgs) -> Self {
        Self {
            group: args.group.clone(),
            search: args.search.clone(),
            sort: args.sort.into(),
            ascending: args.ascending,
            include_hidden: args.all,
        }
    }
}

// ── Lookups ─────────────────────────────────────────────────────────

/// Resolve a node identifier (uuid or name) via snapshot lookup.
pub fn resolve_node(dashboard: &Dashboard, identifier: &str) -> Result<Arc<Node>, CliError> {
    dashboard
        .store()
        .find_node(identifier)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "node".into(),
            identifier: identifier.into(),
            list_command: "nodes list".into(),
        })
}

/// Log in when session credentials are configured and no API key is.
///
/// Without either, requests go out anonymously and the dashboard answers
/// with its public nodes only.
pub async fn authenticate(dashboard: &Dashboard) -> Result<(), CliError> {
    if !dashboard.is_configured() {
        return Err(CoreError::NotConfigured.into());
    }
    let config = dashboard.config();
    if config.credentials().is_some() && !config.has_api_key() {
        dashboard.login().await?;
    }
    Ok(())
}

/// Authenticate and load the node inventory, without live status.
pub async fn load_inventory(dashboard: &Dashboard) -> Result<(), CliError> {
    authenticate(dashboard).await?;
    dashboard.load_nodes().await?;
    Ok(())
}

/// Authenticate, then load the inventory followed by live status.
pub async fn refresh(dashboard: &Dashboard) -> Result<(), CliError> {
    load_inventory(dashboard).await?;
    dashboard.load_live_status().await?;
    Ok(())
}

// ── Prompts & files ─────────────────────────────────────────────────

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// `-` for missing values in detail views.
pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn dash(value: &str) -> &str {
    or_dash(Some(value))
}
