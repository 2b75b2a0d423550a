//! Live status watch: load once, then re-render on every poll.

use std::io::IsTerminal;
use std::time::Duration;

use komari_core::{Dashboard, DashboardConfig, LoadState, NodeQuery};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status::{StatusRow, entries};

/// Parse a humantime period such as "5s" or "2m". Zero is rejected.
fn parse_interval(raw: &str) -> Result<Duration, CliError> {
    let period = humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: "interval".into(),
        reason: e.to_string(),
    })?;
    if period.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(period)
}

fn render(dashboard: &Dashboard, query: &NodeQuery, global: &GlobalOpts, clear: bool) {
    let store = dashboard.store();
    let rows = entries(store, query);
    let out = output::render_list(
        &global.output,
        &rows,
        |e| StatusRow::from(e),
        |e| format!("{}\t{}", e.id, if e.online { "online" } else { "offline" }),
    );
    if clear {
        print!("\x1b[2J\x1b[H");
        let refreshed = store.last_status_refresh().map_or_else(
            || "-".into(),
            |t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
        );
        let online = store.online_ids().len();
        let header = format!(
            "{online}/{} online · updated {refreshed} · Ctrl-C to quit",
            store.node_count()
        );
        println!(
            "{}",
            output::dim(&header, output::should_color(&global.color))
        );
    }
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    dashboard: &Dashboard,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut config: DashboardConfig = dashboard.config().clone();
    if let Some(ref raw) = args.interval {
        config.poll_interval = parse_interval(raw)?;
    }
    if config.poll_interval.is_zero() {
        return Err(CliError::Validation {
            field: "poll_interval".into(),
            reason: "polling is disabled for this profile; pass --interval".into(),
        });
    }

    let watcher = Dashboard::new(config)?;
    watcher.load_dashboard().await?;

    let query = NodeQuery::from(&args.filter);
    let clear = matches!(global.output, OutputFormat::Table) && std::io::stdout().is_terminal();
    let mut statuses = watcher.store().subscribe_statuses();
    let mut state = watcher.load_state();
    let mut rendered = 0_u32;

    loop {
        render(&watcher, &query, global, clear);
        rendered += 1;
        if args.count.is_some_and(|max| rendered >= max) {
            break;
        }

        tokio::select! {
            changed = statuses.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                if let LoadState::Error(ref message) = *state.borrow_and_update() {
                    if !global.quiet {
                        eprintln!("refresh failed: {message}");
                    }
                }
                continue;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intervals_use_humantime() {
        assert_eq!(parse_interval("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_interval("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn zero_and_garbage_intervals_are_rejected() {
        assert!(matches!(
            parse_interval("0s"),
            Err(CliError::Validation { .. })
        ));
        assert!(parse_interval("soon").is_err());
    }
}
