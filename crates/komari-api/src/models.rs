// Komari wire types
//
// Raw shapes of the dashboard's JSON payloads. Field names follow the
// server's snake_case keys; `komari-core` converts these into domain types.
// Most fields default when absent because older agents omit metrics.

use serde::{Deserialize, Serialize};

/// The REST envelope: `{status, message?, data?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Node inventory entry from `common:getNodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeData {
    pub uuid: String,
    pub name: String,
    pub cpu_name: String,
    pub virtualization: String,
    pub arch: String,
    pub cpu_cores: u32,
    pub os: String,
    pub kernel_version: String,
    pub gpu_name: String,
    pub region: String,
    pub public_remark: Option<String>,
    #[serde(rename = "mem_total")]
    pub memory_total: u64,
    pub swap_total: u64,
    pub disk_total: u64,
    pub version: Option<String>,
    pub weight: i64,
    pub price: Option<f64>,
    pub billing_cycle: Option<i64>,
    pub currency: Option<String>,
    pub group: Option<String>,
    pub tags: Option<String>,
    pub hidden: Option<bool>,
    pub traffic_limit: Option<i64>,
    pub traffic_limit_type: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Latest status entry from `common:getNodesLatestStatus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStatusData {
    pub client: String,
    pub time: String,
    pub cpu: f64,
    pub gpu: f64,
    pub ram: u64,
    pub ram_total: u64,
    pub swap: u64,
    pub swap_total: u64,
    pub load: f64,
    pub load5: f64,
    pub load15: f64,
    pub temp: f64,
    pub disk: u64,
    pub disk_total: u64,
    pub net_in: u64,
    pub net_out: u64,
    pub net_total_up: u64,
    pub net_total_down: u64,
    pub process: u32,
    pub connections: u32,
    pub connections_udp: u32,
    pub online: bool,
    pub uptime: u64,
}

/// One historical load sample. Every metric is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordData {
    pub client: Option<String>,
    pub time: Option<String>,
    pub cpu: Option<f64>,
    pub gpu: Option<f64>,
    pub ram: Option<u64>,
    pub ram_total: Option<u64>,
    pub swap: Option<u64>,
    pub swap_total: Option<u64>,
    pub load: Option<f64>,
    pub temp: Option<f64>,
    pub disk: Option<u64>,
    pub disk_total: Option<u64>,
    pub net_in: Option<u64>,
    pub net_out: Option<u64>,
    pub net_total_up: Option<u64>,
    pub net_total_down: Option<u64>,
    pub process: Option<u32>,
    pub connections: Option<u32>,
    pub connections_udp: Option<u32>,
}

/// `data` payload of `GET /api/records/load`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoadRecordsData {
    pub records: Option<Vec<RecordData>>,
    pub count: Option<u64>,
}

/// One latency sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingRecordData {
    pub client: Option<String>,
    pub task_id: Option<i64>,
    pub time: Option<String>,
    pub value: Option<f64>,
}

/// Probe-task descriptor accompanying ping records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingTaskData {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub loss: Option<f64>,
    #[serde(default)]
    pub p99: Option<f64>,
    #[serde(default)]
    pub p50: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub latest: Option<f64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default, rename = "type")]
    pub probe_type: Option<String>,
}

/// Result of the `common:getRecords` ping query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PingRecordsData {
    pub count: Option<u64>,
    pub records: Option<Vec<PingRecordData>>,
    pub tasks: Option<Vec<PingTaskData>>,
}

/// `GET /api/me`: a flat object, not wrapped in the envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeData {
    pub username: Option<String>,
    pub logged_in: Option<bool>,
    pub uuid: Option<String>,
    pub sso_type: Option<String>,
    pub sso_id: Option<String>,
    #[serde(rename = "2fa_enabled")]
    pub two_factor_enabled: Option<bool>,
}
