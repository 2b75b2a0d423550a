// ── Chart series extraction ──
//
// Turns historical records into per-metric point series and latency
// samples into per-task series, then reduces them with the window's
// downsampling strategy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use komari_api::RecordWindow;

use crate::downsample::{ChartPoint, Strategy};
use crate::model::{PingHistory, PingTask, Record};

/// A metric charted from load records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LoadMetric {
    Cpu,
    Gpu,
    /// Used memory as percent of the record's own total.
    Memory,
    /// Used disk as percent of the record's own total.
    Disk,
    /// Inbound rate, KiB/s.
    NetIn,
    /// Outbound rate, KiB/s.
    NetOut,
    TcpConnections,
    UdpConnections,
    Processes,
}

impl LoadMetric {
    pub fn unit(self) -> &'static str {
        match self {
            Self::Cpu | Self::Gpu | Self::Memory | Self::Disk => "%",
            Self::NetIn | Self::NetOut => "KiB/s",
            Self::TcpConnections | Self::UdpConnections | Self::Processes => "",
        }
    }

    /// The metric's value in `record`, `None` when not reported.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            Self::Cpu => record.cpu,
            Self::Gpu => record.gpu,
            Self::Memory => percent_of(record.memory_used, record.memory_total),
            Self::Disk => percent_of(record.disk_used, record.disk_total),
            Self::NetIn => record.net_in.map(|v| v as f64 / 1024.0),
            Self::NetOut => record.net_out.map(|v| v as f64 / 1024.0),
            Self::TcpConnections => record.tcp_connections.map(f64::from),
            Self::UdpConnections => record.udp_connections.map(f64::from),
            Self::Processes => record.process_count.map(f64::from),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub(crate) fn percent_of(used: Option<u64>, total: Option<u64>) -> Option<f64> {
    match (used, total) {
        (Some(used), Some(total)) if total > 0 => Some(used as f64 / total as f64 * 100.0),
        _ => None,
    }
}

/// Whether any record carries a GPU reading. Nodes without a GPU get no GPU chart.
pub fn has_gpu(records: &[Record]) -> bool {
    records.iter().any(|r| r.gpu.is_some())
}

/// Raw points for `metric`, skipping records without a timestamp or value.
pub fn load_series(records: &[Record], metric: LoadMetric) -> Vec<ChartPoint> {
    records
        .iter()
        .filter_map(|r| Some(ChartPoint::new(r.time?, metric.value(r)?)))
        .collect()
}

/// Chart-ready points for `metric` over `window`.
pub fn load_chart(records: &[Record], metric: LoadMetric, window: RecordWindow) -> Vec<ChartPoint> {
    Strategy::for_window(window).apply(&load_series(records, metric))
}

/// One probe task's latency points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingSeries {
    pub task: PingTask,
    pub points: Vec<ChartPoint>,
}

/// Group latency samples by task, in task order.
///
/// Samples without a timestamp, value or known task are dropped, as are
/// negative values (timeouts).
pub fn ping_series(history: &PingHistory) -> Vec<PingSeries> {
    let mut by_task: HashMap<i64, Vec<ChartPoint>> = HashMap::new();
    for record in &history.records {
        let (Some(task_id), Some(time), Some(value)) = (record.task_id, record.time, record.value)
        else {
            continue;
        };
        if value < 0.0 || history.task(task_id).is_none() {
            continue;
        }
        by_task
            .entry(task_id)
            .or_default()
            .push(ChartPoint::new(time, value));
    }

    history
        .tasks
        .iter()
        .map(|task| PingSeries {
            task: task.clone(),
            points: by_task.remove(&task.id).unwrap_or_default(),
        })
        .collect()
}

/// Per-task chart-ready latency series over `window`.
pub fn ping_chart(history: &PingHistory, window: RecordWindow) -> Vec<PingSeries> {
    let strategy = Strategy::for_window(window);
    ping_series(history)
        .into_iter()
        .map(|mut series| {
            series.points = strategy.apply(&series.points);
            series
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::PingRecord;

    fn record(secs: i64) -> Record {
        Record {
            time: DateTime::from_timestamp(secs, 0),
            ..Record::default()
        }
    }

    fn task(id: i64, name: &str) -> PingTask {
        PingTask {
            id,
            name: name.to_owned(),
            interval: None,
            loss: None,
            p50: None,
            p99: None,
            avg: None,
            min: None,
            max: None,
            latest: None,
            total: None,
            probe_type: None,
        }
    }

    #[test]
    fn memory_percent_uses_record_total() {
        let r = Record {
            memory_used: Some(256),
            memory_total: Some(1024),
            ..record(0)
        };
        assert_eq!(LoadMetric::Memory.value(&r), Some(25.0));

        let no_total = Record {
            memory_used: Some(256),
            memory_total: Some(0),
            ..record(0)
        };
        assert_eq!(LoadMetric::Memory.value(&no_total), None);
    }

    #[test]
    fn network_in_kib_per_second() {
        let r = Record {
            net_in: Some(2048),
            ..record(0)
        };
        assert_eq!(LoadMetric::NetIn.value(&r), Some(2.0));
    }

    #[test]
    fn series_skips_missing_time_and_value() {
        let records = vec![
            Record {
                cpu: Some(10.0),
                ..record(0)
            },
            Record {
                cpu: Some(20.0),
                time: None,
                ..Record::default()
            },
            record(60),
            Record {
                cpu: Some(30.0),
                ..record(120)
            },
        ];
        let values: Vec<f64> = load_series(&records, LoadMetric::Cpu)
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![10.0, 30.0]);
        assert!(!has_gpu(&records));
    }

    #[test]
    fn ping_series_drops_timeouts_and_unknown_tasks() {
        let at = |task_id: i64, secs: i64, value: f64| PingRecord {
            node_id: None,
            task_id: Some(task_id),
            time: DateTime::from_timestamp(secs, 0),
            value: Some(value),
        };
        let history = PingHistory {
            count: 5,
            records: vec![
                at(1, 0, 12.0),
                at(1, 60, -1.0),
                at(2, 0, 40.0),
                at(9, 0, 5.0),
                at(1, 120, 14.0),
            ],
            tasks: vec![task(1, "CF"), task(2, "Google")],
        };

        let series = ping_series(&history);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].task.name, "CF");
        assert_eq!(
            series[0].points.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![12.0, 14.0]
        );
        assert_eq!(series[1].points.len(), 1);
    }

    #[test]
    fn metric_names_parse() {
        assert_eq!("net-in".parse::<LoadMetric>().unwrap(), LoadMetric::NetIn);
        assert_eq!(LoadMetric::TcpConnections.to_string(), "tcp-connections");
    }
}
