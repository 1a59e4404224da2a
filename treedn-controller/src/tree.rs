//! Tree builder.
//!
//! Processes one Interest end to end: plan the path to the content source,
//! install forwarding at every hop, register the ingress port in the name's
//! multicast tree and push the arrival switch's group and binding.
//!
//! Membership is registered only at the switch where the Interest arrived.
//! Requesters converging on an interior switch are not aggregated there; each
//! arrival switch replicates for its own ports only.

use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use treedn_common::metrics::ControllerMetrics;
use treedn_common::types::{ContentName, PortId, SwitchId, TreeId, MAX_NAME_LEN};
use treedn_common::{Error, Result};

use crate::installer::{RuleInstaller, WriteStatus};
use crate::name_table::NameTable;
use crate::planner::PathPlanner;

/// An Interest as seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    /// Switch that punted the Interest.
    pub switch: SwitchId,
    pub ingress_port: PortId,
    pub name: ContentName,
}

impl Interest {
    pub fn new(switch: impl Into<SwitchId>, ingress_port: u32, name: impl Into<ContentName>) -> Self {
        Self {
            switch: switch.into(),
            ingress_port: PortId(ingress_port),
            name: name.into(),
        }
    }
}

/// What handling an Interest did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestOutcome {
    pub tree_id: TreeId,
    /// Hops from the arrival switch to the source switch.
    pub path: Vec<SwitchId>,
    pub new_tree: bool,
    pub new_port: bool,
    /// Full replication port set of the arrival switch after the update.
    pub ports: BTreeSet<PortId>,
    /// Forwarding rules actually written (identical rules are skipped).
    pub forwarding_written: usize,
}

pub struct TreeBuilder {
    planner: PathPlanner,
    names: Arc<NameTable>,
    installer: Arc<RuleInstaller>,
    metrics: Arc<ControllerMetrics>,
}

impl TreeBuilder {
    pub fn new(
        planner: PathPlanner,
        names: Arc<NameTable>,
        installer: Arc<RuleInstaller>,
        metrics: Arc<ControllerMetrics>,
    ) -> Self {
        Self {
            planner,
            names,
            installer,
            metrics,
        }
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// Handle one Interest.
    ///
    /// Planning and name validation happen before any state changes, so a
    /// `NoPath`, `UnknownHost`, `UnknownSwitch` or `InvalidName` error leaves
    /// the tables and the switches untouched.
    pub async fn handle_interest(&self, interest: &Interest) -> Result<InterestOutcome> {
        let started = Instant::now();
        self.metrics.interests_received.increment();

        let result = self.build(interest).await;
        match &result {
            Ok(_) => self.metrics.interests_handled.increment(),
            Err(_) => self.metrics.interests_dropped.increment(),
        }
        self.metrics.interest_processing_time.observe_duration(started.elapsed());
        result
    }

    async fn build(&self, interest: &Interest) -> Result<InterestOutcome> {
        let Interest {
            switch,
            ingress_port,
            name,
        } = interest;

        validate_name(name)?;
        let path = self.planner.plan_path(switch, name)?;
        info!(
            "[{}] Path for {} from port {}: {:?}",
            switch,
            name,
            ingress_port,
            path.iter().map(SwitchId::as_str).collect::<Vec<_>>()
        );

        let mut forwarding_written = 0;
        for hop in path.windows(2) {
            let status = self.installer.install_forwarding(&hop[0], name, &hop[1]).await?;
            if status == WriteStatus::Written {
                forwarding_written += 1;
            }
        }

        let membership = self.names.add_member(name, switch, *ingress_port).await;
        let tree_id = membership.tree.id;
        if membership.new_tree {
            self.metrics.trees_created.increment();
            self.metrics.trees.set(self.names.len().await as u64);
            info!("New multicast tree {} for {}", tree_id, name);
        }
        if !membership.new_port {
            debug!("[{}] Port {} already replicates {}", switch, ingress_port, name);
        }

        let ports = self
            .installer
            .install_group(switch, tree_id, &membership.tree.ports(switch))
            .await?;
        self.installer.bind_name(switch, name, tree_id).await?;

        Ok(InterestOutcome {
            tree_id,
            path,
            new_tree: membership.new_tree,
            new_port: membership.new_port,
            ports,
            forwarding_written,
        })
    }
}

/// Names must fit the pipeline's match field and may not be empty.
fn validate_name(name: &ContentName) -> Result<()> {
    let reason = if name.is_empty() {
        "empty name".to_string()
    } else if name.len() > MAX_NAME_LEN {
        format!("{} bytes exceed the {}-byte match field", name.len(), MAX_NAME_LEN)
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        name: name.clone(),
        reason,
    })
}
