// ── Live status domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The most recent report from one node's agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub node_id: String,
    pub online: bool,
    pub uptime: u64,
    /// CPU utilisation, percent.
    pub cpu: f64,
    /// GPU utilisation, percent.
    pub gpu: f64,
    pub memory_used: u64,
    pub memory_total: u64,
    pub swap_used: u64,
    pub swap_total: u64,
    pub disk_used: u64,
    pub disk_total: u64,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub temperature: f64,
    /// Inbound rate, bytes per second.
    pub net_in: u64,
    /// Outbound rate, bytes per second.
    pub net_out: u64,
    pub net_total_up: u64,
    pub net_total_down: u64,
    pub process_count: u32,
    pub tcp_connections: u32,
    pub udp_connections: u32,
    pub sampled_at: Option<DateTime<Utc>>,
}

impl LiveStatus {
    /// Used memory as a fraction of total, 0 when the total is unknown.
    pub fn memory_ratio(&self) -> f64 {
        ratio(self.memory_used, self.memory_total)
    }

    pub fn swap_ratio(&self) -> f64 {
        ratio(self.swap_used, self.swap_total)
    }

    pub fn disk_ratio(&self) -> f64 {
        ratio(self.disk_used, self.disk_total)
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn ratio(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_guard_zero_totals() {
        let status = LiveStatus {
            memory_used: 512,
            memory_total: 2048,
            disk_used: 10,
            ..LiveStatus::default()
        };
        assert!((status.memory_ratio() - 0.25).abs() < f64::EPSILON);
        assert!(status.disk_ratio().abs() < f64::EPSILON);
    }
}
