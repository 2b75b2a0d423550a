// ── Home-screen style widget snapshots ──
//
// Compact, one-shot views of a single node: status, a load chart and a
// latency chart. Each is built from a fresh refresh and reduced with
// stride sampling to a fixed point budget. Missing configuration is a
// distinct state rather than an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use komari_api::RecordWindow;

use crate::dashboard::{Dashboard, DashboardSource};
use crate::downsample::{ChartPoint, stride_sample, stride_sample_by_key};
use crate::error::CoreError;
use crate::format::format_bytes;
use crate::model::{LiveStatus, Node, PingHistory, PingTask, Record};
use crate::series::percent_of;

/// History window of the load widget.
pub const LOAD_WIDGET_WINDOW: RecordWindow = RecordWindow::Hours4;
/// Maximum points drawn by the load widget.
pub const LOAD_WIDGET_POINTS: usize = 60;
/// History window of the latency widget.
pub const PING_WIDGET_WINDOW: RecordWindow = RecordWindow::Hour1;
/// Maximum points per probe task drawn by the latency widget.
pub const PING_WIDGET_POINTS_PER_TASK: usize = 30;

/// Suggested refresh period of the status widget.
pub const STATUS_WIDGET_REFRESH: Duration = Duration::from_secs(15 * 60);
/// Suggested refresh period of the load widget.
pub const LOAD_WIDGET_REFRESH: Duration = Duration::from_secs(30 * 60);
/// Suggested refresh period of the latency widget.
pub const PING_WIDGET_REFRESH: Duration = Duration::from_secs(15 * 60);

/// Metric shown by the load widget.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum WidgetMetric {
    #[default]
    Cpu,
    Memory,
    Disk,
    NetIn,
    NetOut,
}

impl WidgetMetric {
    pub fn unit(self) -> &'static str {
        match self {
            Self::Cpu | Self::Memory | Self::Disk => "%",
            Self::NetIn | Self::NetOut => "/s",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "RAM",
            Self::Disk => "Disk",
            Self::NetIn => "Net ↓",
            Self::NetOut => "Net ↑",
        }
    }

    /// The metric's value in `record`.
    ///
    /// Memory and disk are percentages of the node's capacity totals, not
    /// the record's; network rates stay in bytes per second.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn value(self, record: &Record, node: &Node) -> Option<f64> {
        match self {
            Self::Cpu => record.cpu,
            Self::Memory => percent_of(record.memory_used, Some(node.memory_total)),
            Self::Disk => percent_of(record.disk_used, Some(node.disk_total)),
            Self::NetIn => record.net_in.map(|v| v as f64),
            Self::NetOut => record.net_out.map(|v| v as f64),
        }
    }

    /// Latest-value label: "--" when absent, "42.5%" or "1.5 KB/s".
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    pub fn format_current(self, value: Option<f64>) -> String {
        let Some(value) = value else {
            return "--".into();
        };
        match self {
            Self::Cpu | Self::Memory | Self::Disk => format!("{value:.1}%"),
            Self::NetIn | Self::NetOut => format!("{}/s", format_bytes(value.max(0.0) as u64)),
        }
    }
}

/// What a widget displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum WidgetState<T> {
    /// No dashboard configured yet.
    NotConfigured,
    Error(String),
    Ready(T),
}

impl<T> WidgetState<T> {
    fn from_result(result: Result<T, CoreError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(CoreError::NotConfigured) => Self::NotConfigured,
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusWidget {
    pub node: Node,
    pub status: Option<LiveStatus>,
    pub online: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWidget {
    pub node: Node,
    pub metric: WidgetMetric,
    pub points: Vec<ChartPoint>,
    /// Formatted latest raw value.
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingPoint {
    pub task_id: i64,
    pub task_name: String,
    pub time: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingWidget {
    pub node: Node,
    pub tasks: Vec<PingTask>,
    pub points: Vec<PingPoint>,
}

// ── Builders ─────────────────────────────────────────────────────

/// Pick `requested` by uuid or name, else the node with the lowest weight.
pub fn select_node(nodes: &[Arc<Node>], requested: Option<&str>) -> Result<Arc<Node>, CoreError> {
    let found = match requested {
        Some(wanted) => nodes
            .iter()
            .find(|n| n.id == wanted || n.name.eq_ignore_ascii_case(wanted)),
        None => nodes
            .iter()
            .min_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.id.cmp(&b.id))),
    };
    found.cloned().ok_or_else(|| CoreError::NodeNotFound {
        identifier: requested.unwrap_or("default").to_owned(),
    })
}

pub fn build_load_widget(node: &Node, records: &[Record], metric: WidgetMetric) -> LoadWidget {
    let raw: Vec<ChartPoint> = records
        .iter()
        .filter_map(|r| Some(ChartPoint::new(r.time?, metric.value(r, node)?)))
        .collect();
    let current = metric.format_current(raw.last().map(|p| p.value));

    LoadWidget {
        node: node.clone(),
        metric,
        points: stride_sample(&raw, LOAD_WIDGET_POINTS),
        current,
    }
}

/// Latency points joined to task names, stride-sampled per task.
///
/// Samples of unknown tasks and negative values (timeouts) are dropped.
pub fn build_ping_widget(node: &Node, history: &PingHistory) -> PingWidget {
    let points: Vec<PingPoint> = history
        .records
        .iter()
        .filter_map(|r| {
            let task = history.task(r.task_id?)?;
            let value = r.value.filter(|v| *v >= 0.0)?;
            Some(PingPoint {
                task_id: task.id,
                task_name: task.name.clone(),
                time: r.time?,
                value,
            })
        })
        .collect();

    PingWidget {
        node: node.clone(),
        tasks: history.tasks.clone(),
        points: stride_sample_by_key(&points, |p| p.task_id, PING_WIDGET_POINTS_PER_TASK),
    }
}

// ── Dashboard entry points ───────────────────────────────────────

impl<S: DashboardSource> Dashboard<S> {
    /// Status of one node (or the default node) from a one-shot refresh.
    pub async fn status_widget(&self, node: Option<&str>) -> WidgetState<StatusWidget> {
        let result = async {
            let snapshot = self.refresh_once().await?;
            let node = select_node(&snapshot.nodes, node)?;
            let status = self.store().live_status(&node.id).map(|s| (*s).clone());
            Ok::<_, CoreError>(StatusWidget {
                online: status.as_ref().is_some_and(|s| s.online),
                node: (*node).clone(),
                status,
                fetched_at: snapshot.fetched_at,
            })
        };
        WidgetState::from_result(result.await)
    }

    /// Recent history of one metric for one node.
    pub async fn load_widget(
        &self,
        node: Option<&str>,
        metric: WidgetMetric,
    ) -> WidgetState<LoadWidget> {
        let result = async {
            let node = self.widget_node(node).await?;
            let records = self.load_history(&node.id, LOAD_WIDGET_WINDOW).await?;
            Ok::<_, CoreError>(build_load_widget(&node, &records, metric))
        };
        WidgetState::from_result(result.await)
    }

    /// Recent per-task latency for one node.
    pub async fn ping_widget(&self, node: Option<&str>) -> WidgetState<PingWidget> {
        let result = async {
            let node = self.widget_node(node).await?;
            let history = self.ping_history(&node.id, PING_WIDGET_WINDOW).await?;
            Ok::<_, CoreError>(build_ping_widget(&node, &history))
        };
        WidgetState::from_result(result.await)
    }

    async fn widget_node(&self, requested: Option<&str>) -> Result<Arc<Node>, CoreError> {
        self.ensure_auth().await?;
        self.load_nodes().await?;
        select_node(&self.store().nodes_snapshot(), requested)
    }
}
