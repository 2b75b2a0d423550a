//! Live status command handler.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use komari_core::format::{format_bytes, format_percent, format_rate, format_uptime};
use komari_core::{Dashboard, DataStore, LiveStatus, Node, NodeQuery};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// One node joined with its latest live status.
#[derive(Debug, Serialize)]
pub struct NodeStatus {
    pub id: String,
    pub name: String,
    pub online: bool,
    pub status: Option<Arc<LiveStatus>>,
}

impl NodeStatus {
    pub fn new(node: &Node, store: &DataStore) -> Self {
        Self {
            id: node.id.clone(),
            name: node.display_name().to_owned(),
            online: store.is_online(&node.id),
            status: store.live_status(&node.id),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct StatusRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "RAM")]
    memory: String,
    #[tabled(rename = "Disk")]
    disk: String,
    #[tabled(rename = "Net ↓")]
    net_in: String,
    #[tabled(rename = "Net ↑")]
    net_out: String,
    #[tabled(rename = "Load")]
    load: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

impl From<&NodeStatus> for StatusRow {
    fn from(entry: &NodeStatus) -> Self {
        let live = entry.status.as_deref().filter(|s| s.online);
        Self {
            name: entry.name.clone(),
            state: output::online_label(entry.online, false),
            cpu: metric(live, |s| format_percent(s.cpu)),
            memory: metric(live, |s| format_percent(s.memory_ratio() * 100.0)),
            disk: metric(live, |s| format_percent(s.disk_ratio() * 100.0)),
            net_in: metric(live, |s| format_rate(s.net_in)),
            net_out: metric(live, |s| format_rate(s.net_out)),
            load: metric(live, |s| format!("{:.2}", s.load1)),
            uptime: metric(live, |s| format_uptime(s.uptime, true)),
        }
    }
}

/// `-` unless the node reported and is online.
fn metric(live: Option<&LiveStatus>, f: impl FnOnce(&LiveStatus) -> String) -> String {
    live.map_or_else(|| "-".into(), f)
}

pub fn detail(entry: &NodeStatus, color: bool) -> String {
    let mut lines = vec![
        format!("ID:          {}", entry.id),
        format!("Name:        {}", entry.name),
        format!("State:       {}", output::online_label(entry.online, color)),
    ];
    let Some(s) = entry.status.as_deref() else {
        lines.push(format!("Status:      {}", output::dim("no report", color)));
        return lines.join("\n");
    };
    lines.extend([
        format!("Uptime:      {}", format_uptime(s.uptime, false)),
        format!("CPU:         {}", format_percent(s.cpu)),
        format!(
            "Memory:      {} / {} ({})",
            format_bytes(s.memory_used),
            format_bytes(s.memory_total),
            format_percent(s.memory_ratio() * 100.0)
        ),
        format!(
            "Swap:        {} / {} ({})",
            format_bytes(s.swap_used),
            format_bytes(s.swap_total),
            format_percent(s.swap_ratio() * 100.0)
        ),
        format!(
            "Disk:        {} / {} ({})",
            format_bytes(s.disk_used),
            format_bytes(s.disk_total),
            format_percent(s.disk_ratio() * 100.0)
        ),
        format!(
            "Load:        {:.2} {:.2} {:.2}",
            s.load1, s.load5, s.load15
        ),
        format!(
            "Network:     ↓ {}  ↑ {}",
            format_rate(s.net_in),
            format_rate(s.net_out)
        ),
        format!(
            "Traffic:     ↓ {}  ↑ {}",
            format_bytes(s.net_total_down),
            format_bytes(s.net_total_up)
        ),
        format!(
            "Connections: {} tcp, {} udp",
            s.tcp_connections, s.udp_connections
        ),
        format!("Processes:   {}", s.process_count),
    ]);
    if s.temperature > 0.0 {
        lines.push(format!("Temperature: {:.1}°C", s.temperature));
    }
    if s.gpu > 0.0 {
        lines.push(format!("GPU:         {}", format_percent(s.gpu)));
    }
    if let Some(at) = s.sampled_at {
        lines.push(format!("Reported:    {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines.join("\n")
}

/// Status entries for the nodes matching `query`, in query order.
pub fn entries(store: &DataStore, query: &NodeQuery) -> Vec<NodeStatus> {
    store
        .query(query)
        .iter()
        .map(|n| NodeStatus::new(n, store))
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::refresh(dashboard).await?;
    let store = dashboard.store();

    let out = if let Some(ref node) = args.node {
        let found = util::resolve_node(dashboard, node)?;
        let color = output::should_color(&global.color);
        output::render_single(
            &global.output,
            &NodeStatus::new(&found, store),
            |e| detail(e, color),
            |e| e.id.clone(),
        )
    } else {
        output::render_list(
            &global.output,
            &entries(store, &NodeQuery::from(&args.filter)),
            |e| StatusRow::from(e),
            |e| format!("{}\t{}", e.id, if e.online { "online" } else { "offline" }),
        )
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(online: bool, status: Option<LiveStatus>) -> NodeStatus {
        NodeStatus {
            id: "n1".into(),
            name: "Tokyo".into(),
            online,
            status: status.map(Arc::new),
        }
    }

    #[test]
    fn offline_rows_blank_their_metrics() {
        let row = StatusRow::from(&entry(
            false,
            Some(LiveStatus {
                cpu: 50.0,
                online: false,
                ..LiveStatus::default()
            }),
        ));
        assert_eq!(row.state, "offline");
        assert_eq!(row.cpu, "-");
    }

    #[test]
    fn online_rows_format_metrics() {
        let row = StatusRow::from(&entry(
            true,
            Some(LiveStatus {
                online: true,
                cpu: 12.34,
                memory_used: 512,
                memory_total: 1024,
                net_in: 1536,
                uptime: 90_000,
                ..LiveStatus::default()
            }),
        ));
        assert_eq!(row.cpu, "12.3%");
        assert_eq!(row.memory, "50.0%");
        assert_eq!(row.net_in, "1.5 KB/s");
        assert_eq!(row.uptime, "1d");
    }

    #[test]
    fn detail_without_report_says_so() {
        let text = detail(&entry(false, None), false);
        assert!(text.contains("no report"));
        assert!(text.contains("offline"));
    }
}
