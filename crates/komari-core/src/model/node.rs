// ── Node domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::status::LiveStatus;

/// A monitored server as listed in the dashboard inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable uuid.
    pub id: String,
    pub name: String,
    pub cpu_name: String,
    pub gpu_name: String,
    pub cpu_cores: u32,
    pub arch: String,
    pub virtualization: String,
    pub os: String,
    pub kernel_version: String,
    pub memory_total: u64,
    pub swap_total: u64,
    pub disk_total: u64,
    pub region: String,
    pub group: Option<String>,
    pub tags: Vec<String>,
    /// Display ordering; higher weights sort first.
    pub weight: i64,
    pub price: Option<f64>,
    /// Billing cycle in days.
    pub billing_cycle: Option<i64>,
    pub currency: Option<String>,
    pub traffic_limit: Option<i64>,
    pub traffic_limit_type: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    /// Agent version.
    pub version: Option<String>,
    pub public_remark: Option<String>,
    pub hidden: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Node {
    /// The name to show, falling back to "Untitled" for blank names.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Untitled"
        } else {
            &self.name
        }
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.group.as_deref() == Some(group)
    }
}

/// Sort keys offered for node lists.
///
/// `Index` is the dashboard's own ordering (weight descending); the
/// others read the node's live status, treating a missing status as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum NodeSort {
    #[default]
    Index,
    Uptime,
    Cpu,
    Memory,
    Disk,
    Upload,
    Download,
}

impl NodeSort {
    /// The numeric key this sort compares, for metric sorts.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn metric(self, status: Option<&LiveStatus>) -> f64 {
        match (self, status) {
            (Self::Index, _) | (_, None) => 0.0,
            (Self::Uptime, Some(s)) => s.uptime as f64,
            (Self::Cpu, Some(s)) => s.cpu,
            (Self::Memory, Some(s)) => s.memory_ratio(),
            (Self::Disk, Some(s)) => s.disk_ratio(),
            (Self::Upload, Some(s)) => s.net_out as f64,
            (Self::Download, Some(s)) => s.net_in as f64,
        }
    }
}
