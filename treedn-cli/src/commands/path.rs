//! Path command implementation for the TreeDN CLI

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use treedn_common::types::{HostId, SwitchId};
use treedn_controller::planner::PathPlanner;
use treedn_controller::Topology;

use crate::utils::print_header;

/// Print the hops an Interest for `name` arriving at `switch` would take
pub fn show_path(topology: Topology, source: &str, switch: &str, name: &str) -> Result<()> {
    let topology = Arc::new(topology);
    let source = HostId::new(source);
    let planner = PathPlanner::new(Arc::clone(&topology), source.clone());
    let from = SwitchId::new(switch);

    let path = planner
        .plan_path(&from, &name.into())
        .with_context(|| format!("Failed to plan a path from {} to {}", from, source))?;
    info!("Planned {} hop(s) from {}", path.len() - 1, from);

    print_header(&format!("Path from {} to content source {}", from, source));
    for hop in path.windows(2) {
        let port = topology
            .egress_port(&hop[0], &hop[1])
            .context("Planned hop has no link")?;
        println!("  {:<8} port {:<4} -> {}", hop[0], port, hop[1]);
    }
    if let Some(last) = path.last() {
        let port = topology.host_port(&source)?;
        println!("  {:<8} port {:<4} -> {} (source)", last, port, source);
    }

    Ok(())
}
