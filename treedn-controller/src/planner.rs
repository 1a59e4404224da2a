//! Path planner.

use log::debug;
use std::sync::Arc;
use treedn_common::types::{ContentName, HostId, SwitchId};
use treedn_common::Result;

use crate::topology::Topology;

/// Computes the hop sequence from a requesting switch to the switch the
/// content source is attached to. Holds no state besides the topology.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    topology: Arc<Topology>,
    source: HostId,
}

impl PathPlanner {
    pub fn new(topology: Arc<Topology>, source: HostId) -> Self {
        Self { topology, source }
    }

    pub fn source(&self) -> &HostId {
        &self.source
    }

    /// The switch the content source hangs off.
    pub fn source_switch(&self) -> Result<&SwitchId> {
        self.topology.attachment_switch(&self.source)
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Switches from `from` to the source switch, both included.
    pub fn plan_path(&self, from: &SwitchId, name: &ContentName) -> Result<Vec<SwitchId>> {
        let to = self.source_switch()?;
        let path = self.topology.shortest_path(from, to)?;
        debug!(
            "Path for {} from {} to {}: {:?}",
            name,
            from,
            to,
            path.iter().map(SwitchId::as_str).collect::<Vec<_>>()
        );
        Ok(path)
    }
}
