// Shared fixtures for unit tests.

use crate::model::{LiveStatus, Node};

pub(crate) fn node(id: &str, weight: i64, group: Option<&str>) -> Node {
    Node {
        id: id.to_owned(),
        name: id.to_uppercase(),
        cpu_name: String::new(),
        gpu_name: String::new(),
        cpu_cores: 1,
        arch: "amd64".into(),
        virtualization: String::new(),
        os: "linux".into(),
        kernel_version: String::new(),
        memory_total: 0,
        swap_total: 0,
        disk_total: 0,
        region: String::new(),
        group: group.map(String::from),
        tags: Vec::new(),
        weight,
        price: None,
        billing_cycle: None,
        currency: None,
        traffic_limit: None,
        traffic_limit_type: None,
        ipv4: None,
        ipv6: None,
        version: None,
        public_remark: None,
        hidden: false,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn status(id: &str, online: bool) -> LiveStatus {
    LiveStatus {
        node_id: id.to_owned(),
        online,
        ..LiveStatus::default()
    }
}
