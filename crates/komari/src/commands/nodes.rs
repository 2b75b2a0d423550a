//! Node command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use komari_core::format::{format_bytes, format_uptime};
use komari_core::{Dashboard, DataStore, Node, NodeQuery};

use crate::cli::{GlobalOpts, NodeEditArgs, NodesArgs, NodesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

impl NodeRow {
    fn new(node: &Node, store: &DataStore) -> Self {
        let status = store.live_status(&node.id);
        Self {
            id: node.id.clone(),
            name: node.display_name().to_owned(),
            group: util::or_dash(node.group.as_deref()).to_owned(),
            region: util::dash(&node.region).to_owned(),
            os: util::dash(&node.os).to_owned(),
            state: output::online_label(store.is_online(&node.id), false),
            uptime: status
                .filter(|s| s.online)
                .map_or_else(|| "-".into(), |s| format_uptime(s.uptime, true)),
        }
    }
}

#[derive(Serialize)]
struct GroupSummary {
    name: String,
    nodes: usize,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    name: String,
    #[tabled(rename = "Nodes")]
    nodes: usize,
}

fn detail(node: &Node, store: &DataStore, color: bool) -> String {
    let mut lines = vec![
        format!("ID:             {}", node.id),
        format!("Name:           {}", node.display_name()),
        format!(
            "State:          {}",
            output::online_label(store.is_online(&node.id), color)
        ),
        format!("Group:          {}", util::or_dash(node.group.as_deref())),
        format!("Region:         {}", util::dash(&node.region)),
        format!("OS:             {}", util::dash(&node.os)),
        format!("Kernel:         {}", util::dash(&node.kernel_version)),
        format!("Arch:           {}", util::dash(&node.arch)),
        format!("Virtualization: {}", util::dash(&node.virtualization)),
        format!(
            "CPU:            {} ({} cores)",
            util::dash(&node.cpu_name),
            node.cpu_cores
        ),
        format!("GPU:            {}", util::dash(&node.gpu_name)),
        format!("Memory:         {}", format_bytes(node.memory_total)),
        format!("Swap:           {}", format_bytes(node.swap_total)),
        format!("Disk:           {}", format_bytes(node.disk_total)),
        format!("Weight:         {}", node.weight),
    ];
    if !node.tags.is_empty() {
        lines.push(format!("Tags:           {}", node.tags.join(", ")));
    }
    if let Some(ref version) = node.version {
        lines.push(format!("Agent:          {version}"));
    }
    if let Some(price) = node.price {
        let currency = node.currency.as_deref().unwrap_or("");
        let cycle = node
            .billing_cycle
            .map_or_else(String::new, |days| format!(" / {days}d"));
        lines.push(format!("Price:          {currency}{price:.2}{cycle}"));
    }
    if let Some(ref remark) = node.public_remark {
        lines.push(format!("Remark:         {remark}"));
    }
    if node.hidden {
        lines.push(format!("Hidden:         {}", output::dim("yes", color)));
    }
    lines.join("\n")
}

/// JSON object of the fields set by `nodes edit` flags.
fn edit_changes(args: &NodeEditArgs) -> Result<serde_json::Value, CliError> {
    if let Some(ref path) = args.from_file {
        let changes = util::read_json_file(path)?;
        if !changes.is_object() {
            return Err(CliError::Validation {
                field: "from-file".into(),
                reason: "expected a JSON object of field changes".into(),
            });
        }
        return Ok(changes);
    }

    let mut changes = serde_json::Map::new();
    if let Some(ref name) = args.name {
        changes.insert("name".into(), name.clone().into());
    }
    if let Some(ref group) = args.group {
        changes.insert("group".into(), group.clone().into());
    }
    if let Some(weight) = args.weight {
        changes.insert("weight".into(), weight.into());
    }
    if let Some(hidden) = args.hidden {
        changes.insert("hidden".into(), hidden.into());
    }
    if let Some(ref remark) = args.remark {
        changes.insert("public_remark".into(), remark.clone().into());
    }

    if changes.is_empty() {
        return Err(CliError::Validation {
            field: "changes".into(),
            reason: "nothing to edit; pass at least one field flag or --from-file".into(),
        });
    }
    Ok(changes.into())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: NodesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = dashboard.store();
    let color = output::should_color(&global.color);

    match args.command {
        NodesCommand::List(filter) => {
            util::refresh(dashboard).await?;
            let nodes = store.query(&NodeQuery::from(&filter));
            let out = output::render_list(
                &global.output,
                &nodes,
                |n| NodeRow::new(n, store),
                |n| n.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Show { node } => {
            util::refresh(dashboard).await?;
            let found = util::resolve_node(dashboard, &node)?;
            let out = output::render_single(
                &global.output,
                &found,
                |n: &Arc<Node>| detail(n, store, color),
                |n| n.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Groups => {
            util::load_inventory(dashboard).await?;
            let nodes = store.nodes_snapshot();
            let groups: Vec<GroupSummary> = store
                .group_names()
                .into_iter()
                .map(|name| GroupSummary {
                    nodes: nodes.iter().filter(|n| n.in_group(&name)).count(),
                    name,
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &groups,
                |g| GroupRow {
                    name: g.name.clone(),
                    nodes: g.nodes,
                },
                |g| g.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Edit(edit) => {
            let changes = edit_changes(&edit)?;
            util::load_inventory(dashboard).await?;
            let found = util::resolve_node(dashboard, &edit.node)?;
            dashboard.edit_node(&found.id, &changes).await?;
            if !global.quiet {
                eprintln!("Node '{}' updated", found.display_name());
            }
            Ok(())
        }

        NodesCommand::Remove { node } => {
            util::load_inventory(dashboard).await?;
            let found = util::resolve_node(dashboard, &node)?;
            let prompt = format!(
                "Remove node '{}' and all of its history?",
                found.display_name()
            );
            if !util::confirm("nodes remove", &prompt, global.yes)? {
                return Ok(());
            }
            dashboard.remove_node(&found.id).await?;
            if !global.quiet {
                eprintln!("Node '{}' removed", found.display_name());
            }
            Ok(())
        }

        NodesCommand::Reorder { nodes } => {
            util::load_inventory(dashboard).await?;
            let uuids = nodes
                .iter()
                .map(|n| util::resolve_node(dashboard, n).map(|found| found.id.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            dashboard.reorder_nodes(&uuids).await?;
            if !global.quiet {
                eprintln!("Reordered {} node(s)", uuids.len());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn edit_args() -> NodeEditArgs {
        NodeEditArgs {
            node: "tokyo".into(),
            name: None,
            group: None,
            weight: None,
            hidden: None,
            remark: None,
            from_file: None,
        }
    }

    #[test]
    fn edit_flags_build_a_change_object() {
        let args = NodeEditArgs {
            name: Some("Tokyo 2".into()),
            weight: Some(5),
            hidden: Some(false),
            remark: Some("primary".into()),
            ..edit_args()
        };
        let changes = edit_changes(&args).unwrap();
        assert_eq!(
            changes,
            serde_json::json!({
                "name": "Tokyo 2",
                "weight": 5,
                "hidden": false,
                "public_remark": "primary",
            })
        );
    }

    #[test]
    fn edit_without_changes_is_rejected() {
        assert!(matches!(
            edit_changes(&edit_args()),
            Err(CliError::Validation { ref field, .. }) if field == "changes"
        ));
    }

    #[test]
    fn edit_file_must_hold_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let args = NodeEditArgs {
            from_file: Some(path),
            ..edit_args()
        };
        assert!(edit_changes(&args).is_err());
    }
}
