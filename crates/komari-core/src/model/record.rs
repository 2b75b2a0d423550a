// ── Historical record domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical load sample. Metrics the agent did not report are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub node_id: Option<String>,
    /// `None` when the server sent no timestamp or one that failed to parse.
    pub time: Option<DateTime<Utc>>,
    pub cpu: Option<f64>,
    pub gpu: Option<f64>,
    pub memory_used: Option<u64>,
    pub memory_total: Option<u64>,
    pub swap_used: Option<u64>,
    pub swap_total: Option<u64>,
    pub load: Option<f64>,
    pub temperature: Option<f64>,
    pub disk_used: Option<u64>,
    pub disk_total: Option<u64>,
    pub net_in: Option<u64>,
    pub net_out: Option<u64>,
    pub net_total_up: Option<u64>,
    pub net_total_down: Option<u64>,
    pub process_count: Option<u32>,
    pub tcp_connections: Option<u32>,
    pub udp_connections: Option<u32>,
}

/// One latency sample from a probe task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingRecord {
    pub node_id: Option<String>,
    pub task_id: Option<i64>,
    pub time: Option<DateTime<Utc>>,
    /// Milliseconds; negative values mark timeouts.
    pub value: Option<f64>,
}

/// A latency probe configured on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingTask {
    pub id: i64,
    pub name: String,
    /// Probe interval, seconds.
    pub interval: Option<u64>,
    /// Loss, percent.
    pub loss: Option<f64>,
    pub p50: Option<f64>,
    pub p99: Option<f64>,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub latest: Option<f64>,
    pub total: Option<u64>,
    pub probe_type: Option<String>,
}

/// Latency samples for one node together with their tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingHistory {
    pub count: u64,
    pub records: Vec<PingRecord>,
    pub tasks: Vec<PingTask>,
}

impl PingHistory {
    pub fn task(&self, id: i64) -> Option<&PingTask> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
