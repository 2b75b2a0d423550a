// ── API-to-domain type conversions ──
//
// Bridges raw `komari_api` wire types into canonical `komari_core::model`
// domain types. Each `From` impl renames fields, parses timestamps and
// splits delimited strings, filling sensible defaults for missing data.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use komari_api::models::{NodeData, NodeStatusData, PingRecordData, PingTaskData, RecordData};

use crate::model::{LiveStatus, Node, PingHistory, PingRecord, PingTask, Record};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, with or without fractional seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_optional(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| parse_timestamp(s))
}

/// Split the dashboard's `;`-delimited tag string.
fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|tags| {
        tags.split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

// ── Inventory ──────────────────────────────────────────────────────

impl From<NodeData> for Node {
    fn from(n: NodeData) -> Self {
        Node {
            tags: split_tags(n.tags.as_deref()),
            created_at: parse_optional(n.created_at.as_ref()),
            updated_at: parse_optional(n.updated_at.as_ref()),
            id: n.uuid,
            name: n.name,
            cpu_name: n.cpu_name,
            gpu_name: n.gpu_name,
            cpu_cores: n.cpu_cores,
            arch: n.arch,
            virtualization: n.virtualization,
            os: n.os,
            kernel_version: n.kernel_version,
            memory_total: n.memory_total,
            swap_total: n.swap_total,
            disk_total: n.disk_total,
            region: n.region,
            group: non_empty(n.group),
            weight: n.weight,
            price: n.price,
            billing_cycle: n.billing_cycle,
            currency: non_empty(n.currency),
            traffic_limit: n.traffic_limit,
            traffic_limit_type: non_empty(n.traffic_limit_type),
            ipv4: non_empty(n.ipv4),
            ipv6: non_empty(n.ipv6),
            version: non_empty(n.version),
            public_remark: non_empty(n.public_remark),
            hidden: n.hidden.unwrap_or(false),
        }
    }
}

/// Convert the keyed inventory map into nodes sorted by weight descending.
///
/// Ties fall back to the node id so the order is stable across refreshes.
pub fn nodes_from_map(raw: HashMap<String, NodeData>) -> Vec<Node> {
    let mut nodes: Vec<Node> = raw
        .into_iter()
        .map(|(key, mut data)| {
            if data.uuid.is_empty() {
                data.uuid = key;
            }
            Node::from(data)
        })
        .collect();
    sort_by_weight(&mut nodes);
    nodes
}

pub(crate) fn sort_by_weight(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.id.cmp(&b.id)));
}

// ── Live status ────────────────────────────────────────────────────

impl From<NodeStatusData> for LiveStatus {
    fn from(s: NodeStatusData) -> Self {
        LiveStatus {
            sampled_at: parse_timestamp(&s.time),
            node_id: s.client,
            online: s.online,
            uptime: s.uptime,
            cpu: s.cpu,
            gpu: s.gpu,
            memory_used: s.ram,
            memory_total: s.ram_total,
            swap_used: s.swap,
            swap_total: s.swap_total,
            disk_used: s.disk,
            disk_total: s.disk_total,
            load1: s.load,
            load5: s.load5,
            load15: s.load15,
            temperature: s.temp,
            net_in: s.net_in,
            net_out: s.net_out,
            net_total_up: s.net_total_up,
            net_total_down: s.net_total_down,
            process_count: s.process,
            tcp_connections: s.connections,
            udp_connections: s.connections_udp,
        }
    }
}

/// Convert the keyed status map, keeping the map key as the node id.
pub fn statuses_from_map(raw: HashMap<String, NodeStatusData>) -> HashMap<String, LiveStatus> {
    raw.into_iter()
        .map(|(key, data)| {
            let mut status = LiveStatus::from(data);
            if status.node_id.is_empty() {
                status.node_id.clone_from(&key);
            }
            (key, status)
        })
        .collect()
}

// ── Records ────────────────────────────────────────────────────────

impl From<RecordData> for Record {
    fn from(r: RecordData) -> Self {
        Record {
            time: parse_optional(r.time.as_ref()),
            node_id: r.client,
            cpu: r.cpu,
            gpu: r.gpu,
            memory_used: r.ram,
            memory_total: r.ram_total,
            swap_used: r.swap,
            swap_total: r.swap_total,
            load: r.load,
            temperature: r.temp,
            disk_used: r.disk,
            disk_total: r.disk_total,
            net_in: r.net_in,
            net_out: r.net_out,
            net_total_up: r.net_total_up,
            net_total_down: r.net_total_down,
            process_count: r.process,
            tcp_connections: r.connections,
            udp_connections: r.connections_udp,
        }
    }
}

impl From<PingRecordData> for PingRecord {
    fn from(r: PingRecordData) -> Self {
        PingRecord {
            time: parse_optional(r.time.as_ref()),
            node_id: r.client,
            task_id: r.task_id,
            value: r.value,
        }
    }
}

impl From<PingTaskData> for PingTask {
    fn from(t: PingTaskData) -> Self {
        PingTask {
            id: t.id,
            name: t.name,
            interval: t.interval,
            loss: t.loss,
            p50: t.p50,
            p99: t.p99,
            avg: t.avg,
            min: t.min,
            max: t.max,
            latest: t.latest,
            total: t.total,
            probe_type: t.probe_type,
        }
    }
}

impl From<komari_api::PingHistory> for PingHistory {
    fn from(h: komari_api::PingHistory) -> Self {
        PingHistory {
            count: h.count,
            records: h.records.into_iter().map(PingRecord::from).collect(),
            tasks: h.tasks.into_iter().map(PingTask::from).collect(),
        }
    }
}
