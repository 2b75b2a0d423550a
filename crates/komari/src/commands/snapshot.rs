//! Widget snapshot handlers.
//!
//! Structured formats print the widget state object as-is (including the
//! `not_configured` and `error` states). Table and plain output render
//! the ready widget as compact text and turn the other states into errors.

use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::Serialize;

use komari_core::format::{format_percent, format_rate, format_uptime};
use komari_core::widget::{
    LOAD_WIDGET_REFRESH, LoadWidget, PING_WIDGET_REFRESH, PingWidget, STATUS_WIDGET_REFRESH,
    StatusWidget,
};
use komari_core::{Dashboard, WidgetMetric, WidgetState};

use crate::cli::{GlobalOpts, OutputFormat, SnapshotArgs, SnapshotCommand};
use crate::error::CliError;
use crate::output;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per value, scaled between the series minimum and maximum.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn sparkline(values: &[f64]) -> String {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = max - min;
    values
        .iter()
        .map(|v| {
            let level = if span > 0.0 {
                ((v - min) / span * 7.0).round() as usize
            } else {
                0
            };
            BARS[level.min(BARS.len() - 1)]
        })
        .collect()
}

/// "updated 12:00 · next 12:15" for a widget fetched at `fetched_at`
/// that should be refreshed every `period`.
fn freshness(fetched_at: DateTime<Utc>, period: Duration) -> String {
    let next = TimeDelta::from_std(period)
        .ok()
        .and_then(|delta| fetched_at.checked_add_signed(delta))
        .unwrap_or(fetched_at);
    let clock = |t: DateTime<Utc>| t.with_timezone(&Local).format("%H:%M").to_string();
    format!("updated {} · next {}", clock(fetched_at), clock(next))
}

// ── Text renderings ─────────────────────────────────────────────────

fn status_text(w: &StatusWidget, color: bool) -> String {
    let mut lines = vec![format!(
        "{}  {}",
        w.node.display_name(),
        output::online_label(w.online, color)
    )];
    if let Some(s) = w.status.as_ref().filter(|s| s.online) {
        lines.push(format!(
            "CPU {}  RAM {}  Disk {}",
            format_percent(s.cpu),
            format_percent(s.memory_ratio() * 100.0),
            format_percent(s.disk_ratio() * 100.0)
        ));
        lines.push(format!(
            "↓ {}  ↑ {}  up {}",
            format_rate(s.net_in),
            format_rate(s.net_out),
            format_uptime(s.uptime, true)
        ));
    }
    lines.push(output::dim(
        &freshness(w.fetched_at, STATUS_WIDGET_REFRESH),
        color,
    ));
    lines.join("\n")
}

fn load_text(w: &LoadWidget, fetched_at: DateTime<Utc>, color: bool) -> String {
    let values: Vec<f64> = w.points.iter().map(|p| p.value).collect();
    [
        format!(
            "{}  {} {}",
            w.node.display_name(),
            w.metric.label(),
            w.current
        ),
        if values.is_empty() {
            output::dim("no data", color)
        } else {
            sparkline(&values)
        },
        output::dim(&freshness(fetched_at, LOAD_WIDGET_REFRESH), color),
    ]
    .join("\n")
}

fn ping_text(w: &PingWidget, fetched_at: DateTime<Utc>, color: bool) -> String {
    let mut lines = vec![w.node.display_name().to_owned()];
    for task in &w.tasks {
        let values: Vec<f64> = w
            .points
            .iter()
            .filter(|p| p.task_id == task.id)
            .map(|p| p.value)
            .collect();
        let latest = values
            .last()
            .map_or_else(|| "--".into(), |v| format!("{v:.0} ms"));
        let chart = if values.is_empty() {
            output::dim("no data", color)
        } else {
            sparkline(&values)
        };
        lines.push(format!("{:<12} {latest:>7}  {chart}", task.name));
    }
    if w.tasks.is_empty() {
        lines.push(output::dim("no latency tasks", color));
    }
    lines.push(output::dim(&freshness(fetched_at, PING_WIDGET_REFRESH), color));
    lines.join("\n")
}

// ── Output ──────────────────────────────────────────────────────────

fn finish<T: Serialize>(
    state: &WidgetState<T>,
    global: &GlobalOpts,
    text: impl Fn(&T) -> String,
) -> Result<(), CliError> {
    let out = match (&global.output, state) {
        (OutputFormat::Table | OutputFormat::Plain, WidgetState::Ready(widget)) => text(widget),
        (OutputFormat::Table | OutputFormat::Plain, WidgetState::NotConfigured) => {
            return Err(CliError::NoConfig {
                path: komari_config::config_path().display().to_string(),
            });
        }
        (OutputFormat::Table | OutputFormat::Plain, WidgetState::Error(message)) => {
            return Err(CliError::ApiError {
                code: "snapshot".into(),
                message: message.clone(),
            });
        }
        (format, state) => output::render_single(format, state, |_| String::new(), |_| String::new()),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        SnapshotCommand::Status { node } => {
            let state = dashboard.status_widget(node.as_deref()).await;
            finish(&state, global, |w| status_text(w, color))
        }
        SnapshotCommand::Load { node, metric } => {
            let state = dashboard
                .load_widget(node.as_deref(), WidgetMetric::from(metric))
                .await;
            let fetched_at = Utc::now();
            finish(&state, global, |w| load_text(w, fetched_at, color))
        }
        SnapshotCommand::Ping { node } => {
            let state = dashboard.ping_widget(node.as_deref()).await;
            let fetched_at = Utc::now();
            finish(&state, global, |w| ping_text(w, fetched_at, color))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn freshness_names_the_next_refresh() {
        let fetched = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = |t: DateTime<Utc>| t.with_timezone(&Local).format("%H:%M").to_string();

        let status = freshness(fetched, STATUS_WIDGET_REFRESH);
        assert_eq!(
            status,
            format!(
                "updated {} · next {}",
                clock(fetched),
                clock(fetched + TimeDelta::minutes(15))
            )
        );
        assert!(
            freshness(fetched, LOAD_WIDGET_REFRESH)
                .ends_with(&format!("next {}", clock(fetched + TimeDelta::minutes(30))))
        );
    }

    #[test]
    fn sparkline_spans_the_range() {
        assert_eq!(sparkline(&[0.0, 50.0, 100.0]), "▁▅█");
        assert_eq!(sparkline(&[3.0, 3.0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }
}
