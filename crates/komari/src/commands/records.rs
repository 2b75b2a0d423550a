//! Historical record command handlers.

use chrono::{DateTime, Local, Utc};
use tabled::Tabled;

use komari_core::format::format_rate;
use komari_core::series::{
    PingSeries, has_gpu, load_chart, load_series, ping_chart, ping_series,
};
use komari_core::{
    ChartPoint, Dashboard, LoadMetric, PingHistory, PingRecord, Record, RecordWindow, Strategy,
};

use crate::cli::{GlobalOpts, OutputFormat, RecordsArgs, RecordsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Time")]
    time: String,
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
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        let percent = |metric: LoadMetric| {
            metric
                .value(r)
                .map_or_else(|| "-".into(), |v| format!("{v:.1}%"))
        };
        Self {
            time: local_time(r.time),
            cpu: percent(LoadMetric::Cpu),
            memory: percent(LoadMetric::Memory),
            disk: percent(LoadMetric::Disk),
            net_in: r.net_in.map_or_else(|| "-".into(), format_rate),
            net_out: r.net_out.map_or_else(|| "-".into(), format_rate),
            load: r.load.map_or_else(|| "-".into(), |v| format!("{v:.2}")),
        }
    }
}

#[derive(Tabled)]
struct PingSampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Avg")]
    avg: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Loss")]
    loss: String,
}

impl From<&PingSeries> for TaskRow {
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn from(series: &PingSeries) -> Self {
        let values = series.points.iter().map(|p| p.value);
        let (min, max, sum) = values.fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), v| (min.min(v), max.max(v), sum + v),
        );
        let n = series.points.len();
        let ms = |v: f64| if n == 0 { "-".into() } else { format!("{v:.1} ms") };
        Self {
            task: series.task.name.clone(),
            samples: n,
            min: ms(min),
            avg: ms(if n == 0 { 0.0 } else { sum / n as f64 }),
            max: ms(max),
            loss: series
                .task
                .loss
                .map_or_else(|| "-".into(), |l| format!("{l:.1}%")),
        }
    }
}

// ── Formatting helpers ──────────────────────────────────────────────

fn local_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%m-%d %H:%M").to_string(),
    )
}

fn rfc3339(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339()).unwrap_or_default()
}

/// A chart value with its unit: "42.5%", "12.30 KiB/s", "118.0".
fn format_value(value: f64, unit: &str) -> String {
    match unit {
        "" => format!("{value:.1}"),
        "%" => format!("{value:.1}%"),
        unit => format!("{value:.2} {unit}"),
    }
}

fn ping_label(record: &PingRecord, history: &PingHistory) -> (String, String) {
    let task = record
        .task_id
        .and_then(|id| history.task(id))
        .map_or_else(|| "?".into(), |t| t.name.clone());
    let latency = match record.value {
        Some(v) if v < 0.0 => "timeout".into(),
        Some(v) => format!("{v:.1} ms"),
        None => "-".into(),
    };
    (task, latency)
}

/// Per-task series stride-sampled to at most `max` points each.
fn ping_strided(history: &PingHistory, max: usize) -> Vec<PingSeries> {
    let strategy = Strategy::Stride { max };
    ping_series(history)
        .into_iter()
        .map(|mut series| {
            series.points = strategy.apply(&series.points);
            series
        })
        .collect()
}

/// A GPU chart for a node that never reported a GPU reading.
fn missing_gpu(records: &[Record], metric: LoadMetric) -> bool {
    metric == LoadMetric::Gpu && !records.is_empty() && !has_gpu(records)
}

fn announce(global: &GlobalOpts, header: &str) {
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!("{header}");
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: RecordsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::load_inventory(dashboard).await?;

    match args.command {
        RecordsCommand::Load {
            node,
            window,
            metric,
            raw,
            points,
        } => {
            let found = util::resolve_node(dashboard, &node)?;
            let window = RecordWindow::from(window);
            let metric = LoadMetric::from(metric);
            let records = dashboard.load_history(&found.id, window).await?;

            let out = if raw {
                announce(
                    global,
                    &format!("{} · {window} · {} records", found.display_name(), records.len()),
                );
                output::render_list(
                    &global.output,
                    &records,
                    |r| RecordRow::from(r),
                    |r| rfc3339(r.time),
                )
            } else {
                if missing_gpu(&records, metric) && !global.quiet {
                    eprintln!("{} reports no GPU data", found.display_name());
                }
                let series: Vec<ChartPoint> = match points {
                    Some(max) => Strategy::Stride { max }.apply(&load_series(&records, metric)),
                    None => load_chart(&records, metric, window),
                };
                announce(
                    global,
                    &format!(
                        "{} · {metric} · {window} · {} points",
                        found.display_name(),
                        series.len()
                    ),
                );
                output::render_list(
                    &global.output,
                    &series,
                    |p| PointRow {
                        time: local_time(Some(p.time)),
                        value: format_value(p.value, metric.unit()),
                    },
                    |p| format!("{}\t{}", p.time.to_rfc3339(), p.value),
                )
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RecordsCommand::Ping {
            node,
            window,
            raw,
            points,
        } => {
            let found = util::resolve_node(dashboard, &node)?;
            let window = RecordWindow::from(window);
            let history = dashboard.ping_history(&found.id, window).await?;

            let out = if raw {
                announce(
                    global,
                    &format!(
                        "{} · {window} · {} samples",
                        found.display_name(),
                        history.records.len()
                    ),
                );
                output::render_list(
                    &global.output,
                    &history.records,
                    |r| {
                        let (task, latency) = ping_label(r, &history);
                        PingSampleRow {
                            time: local_time(r.time),
                            task,
                            latency,
                        }
                    },
                    |r| rfc3339(r.time),
                )
            } else {
                let series = match points {
                    Some(max) => ping_strided(&history, max),
                    None => ping_chart(&history, window),
                };
                announce(
                    global,
                    &format!(
                        "{} · {window} · {} task(s)",
                        found.display_name(),
                        series.len()
                    ),
                );
                output::render_list(
                    &global.output,
                    &series,
                    |s| TaskRow::from(s),
                    |s| s.task.name.clone(),
                )
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use komari_core::PingTask;

    use super::*;

    fn task(id: i64, name: &str, loss: Option<f64>) -> PingTask {
        PingTask {
            id,
            name: name.into(),
            interval: Some(60),
            loss,
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
    fn values_carry_their_units() {
        assert_eq!(format_value(42.46, "%"), "42.5%");
        assert_eq!(format_value(12.3, "KiB/s"), "12.30 KiB/s");
        assert_eq!(format_value(118.0, ""), "118.0");
    }

    #[test]
    fn gpu_chart_without_gpu_readings_is_flagged() {
        let plain = vec![Record::default(), Record::default()];
        let with_gpu = vec![
            Record::default(),
            Record {
                gpu: Some(12.0),
                ..Record::default()
            },
        ];
        assert!(missing_gpu(&plain, LoadMetric::Gpu));
        assert!(!missing_gpu(&with_gpu, LoadMetric::Gpu));
        assert!(!missing_gpu(&plain, LoadMetric::Cpu));
        assert!(!missing_gpu(&[], LoadMetric::Gpu));
    }

    #[test]
    fn point_budget_strides_each_task() {
        let t0 = Utc::now();
        let sample = |value: f64| PingRecord {
            node_id: None,
            task_id: Some(1),
            time: Some(t0),
            value: Some(value),
        };
        let history = PingHistory {
            count: 4,
            records: vec![sample(1.0), sample(2.0), sample(3.0), sample(4.0)],
            tasks: vec![task(1, "CN", None)],
        };
        let series = ping_strided(&history, 2);
        assert_eq!(series.len(), 1);
        let values: Vec<f64> = series[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn task_rows_summarise_points() {
        let t0 = Utc::now();
        let series = PingSeries {
            task: task(1, "CN", Some(2.5)),
            points: vec![ChartPoint::new(t0, 10.0), ChartPoint::new(t0, 30.0)],
        };
        let row = TaskRow::from(&series);
        assert_eq!(row.samples, 2);
        assert_eq!(row.min, "10.0 ms");
        assert_eq!(row.avg, "20.0 ms");
        assert_eq!(row.max, "30.0 ms");
        assert_eq!(row.loss, "2.5%");

        let empty = TaskRow::from(&PingSeries {
            task: task(2, "US", None),
            points: Vec::new(),
        });
        assert_eq!(empty.avg, "-");
        assert_eq!(empty.loss, "-");
    }

    #[test]
    fn negative_latency_is_a_timeout() {
        let history = PingHistory {
            count: 1,
            records: Vec::new(),
            tasks: vec![task(7, "HK", None)],
        };
        let record = PingRecord {
            node_id: None,
            task_id: Some(7),
            time: None,
            value: Some(-1.0),
        };
        assert_eq!(
            ping_label(&record, &history),
            ("HK".to_owned(), "timeout".to_owned())
        );
    }
}
