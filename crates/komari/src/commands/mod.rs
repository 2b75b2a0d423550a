//! Command dispatch: bridges CLI args -> dashboard calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod nodes;
pub mod records;
pub mod snapshot;
pub mod status;
pub mod util;
pub mod watch;

use komari_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a dashboard-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Nodes(args) => nodes::handle(dashboard, args, global).await,
        Command::Status(args) => status::handle(dashboard, args, global).await,
        Command::Records(args) => records::handle(dashboard, args, global).await,
        Command::Watch(args) => watch::handle(dashboard, args, global).await,
        Command::Snapshot(args) => snapshot::handle(dashboard, args, global).await,
        Command::Login => auth::login(dashboard, global).await,
        Command::Whoami => auth::whoami(dashboard, global).await,
        Command::Logout => auth::logout(dashboard, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
