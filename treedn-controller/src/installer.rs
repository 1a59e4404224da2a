//! Rule installer.
//!
//! Turns tree-builder decisions into writes on the switch connections. Each
//! switch gets a handle holding a mirror of what has been written to it; the
//! mirror's lock is held across the write, so writes to one switch never
//! overlap and identical forwarding or binding rules are written only once.
//! Multicast groups are always rewritten with the full port set.
//!
//! Nothing is rolled back: when a write fails, rules already written for the
//! same Interest stay in place.

use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use treedn_common::metrics::ControllerMetrics;
use treedn_common::types::{ContentName, PortId, SwitchId, TreeId};
use treedn_common::{Error, Result};

use crate::switch::{
    ForwardingRule, GroupBinding, MulticastGroup, SwitchConnection, FIB_TABLE, PIT_TABLE,
};
use crate::topology::Topology;

/// Whether an install call reached the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// The switch already holds this exact rule.
    Unchanged,
}

/// What the controller has successfully written to one switch.
#[derive(Debug, Default)]
struct Installed {
    forwarding: HashMap<ContentName, PortId>,
    bindings: HashMap<ContentName, TreeId>,
    groups: HashMap<TreeId, BTreeSet<PortId>>,
}

struct SwitchHandle {
    connection: Arc<dyn SwitchConnection>,
    installed: Mutex<Installed>,
}

pub struct RuleInstaller {
    topology: Arc<Topology>,
    switches: HashMap<SwitchId, SwitchHandle>,
    metrics: Arc<ControllerMetrics>,
}

impl RuleInstaller {
    pub fn new(
        topology: Arc<Topology>,
        connections: impl IntoIterator<Item = Arc<dyn SwitchConnection>>,
        metrics: Arc<ControllerMetrics>,
    ) -> Self {
        let switches = connections
            .into_iter()
            .map(|connection| {
                (
                    connection.id().clone(),
                    SwitchHandle {
                        connection,
                        installed: Mutex::new(Installed::default()),
                    },
                )
            })
            .collect();

        Self {
            topology,
            switches,
            metrics,
        }
    }

    fn handle(&self, switch: &SwitchId) -> Result<&SwitchHandle> {
        self.switches
            .get(switch)
            .ok_or_else(|| Error::transport(switch, "no control connection"))
    }

    fn track(&self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            self.metrics.transport_errors.increment();
            warn!("Switch write failed: {}", e);
        }
        result
    }

    /// Route `name` at `switch` toward the adjacent switch `next_hop`.
    pub async fn install_forwarding(
        &self,
        switch: &SwitchId,
        name: &ContentName,
        next_hop: &SwitchId,
    ) -> Result<WriteStatus> {
        let egress_port = self.topology.egress_port(switch, next_hop).ok_or_else(|| {
            Error::Topology(format!("{} has no port toward {}", switch, next_hop))
        })?;
        let handle = self.handle(switch)?;

        let mut installed = handle.installed.lock().await;
        if installed.forwarding.get(name) == Some(&egress_port) {
            self.metrics.forwarding_skipped.increment();
            debug!("[{}] FIB rule for {} -> port {} already present", switch, name, egress_port);
            return Ok(WriteStatus::Unchanged);
        }

        let rule = ForwardingRule {
            switch: switch.clone(),
            name: name.clone(),
            next_hop: next_hop.clone(),
            egress_port,
        };
        info!(
            "[{}] Installing FIB rule in {}: {} -> port {} (toward {})",
            switch, FIB_TABLE, name, egress_port, next_hop
        );
        self.track(handle.connection.install_forwarding_rule(&rule).await)?;
        installed.forwarding.insert(name.clone(), egress_port);
        self.metrics.forwarding_writes.increment();
        Ok(WriteStatus::Written)
    }

    /// (Re)write multicast group `tree_id` at `switch` with the full port set.
    ///
    /// Ports already written for the group are kept, so a write carrying an
    /// older membership snapshot never shrinks the group. Returns the port set
    /// that was written.
    pub async fn install_group(
        &self,
        switch: &SwitchId,
        tree_id: TreeId,
        ports: &BTreeSet<PortId>,
    ) -> Result<BTreeSet<PortId>> {
        let handle = self.handle(switch)?;
        let mut installed = handle.installed.lock().await;

        let mut ports = ports.clone();
        if let Some(written) = installed.groups.get(&tree_id) {
            ports.extend(written.iter().copied());
        }
        let group = MulticastGroup {
            switch: switch.clone(),
            tree_id,
            ports,
        };
        info!(
            "[{}] Setting up multicast group {} with ports {:?}",
            switch,
            tree_id,
            group.ports.iter().map(|p| p.0).collect::<Vec<_>>()
        );
        self.track(handle.connection.install_multicast_group(&group).await)?;
        installed.groups.insert(tree_id, group.ports.clone());
        self.metrics.group_writes.increment();
        Ok(group.ports)
    }

    /// Bind `name` to multicast group `tree_id` at `switch`.
    pub async fn bind_name(
        &self,
        switch: &SwitchId,
        name: &ContentName,
        tree_id: TreeId,
    ) -> Result<WriteStatus> {
        let handle = self.handle(switch)?;

        let mut installed = handle.installed.lock().await;
        if installed.bindings.get(name) == Some(&tree_id) {
            self.metrics.binding_skipped.increment();
            debug!("[{}] PIT binding {} -> group {} already present", switch, name, tree_id);
            return Ok(WriteStatus::Unchanged);
        }

        let binding = GroupBinding {
            switch: switch.clone(),
            name: name.clone(),
            tree_id,
        };
        info!(
            "[{}] Installing PIT rule in {}: {} -> mcast group {}",
            switch, PIT_TABLE, name, tree_id
        );
        self.track(handle.connection.bind_name_to_group(&binding).await)?;
        installed.bindings.insert(name.clone(), tree_id);
        self.metrics.binding_writes.increment();
        Ok(WriteStatus::Written)
    }
}
