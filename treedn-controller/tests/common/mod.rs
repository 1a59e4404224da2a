#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use treedn_common::types::SwitchId;
use treedn_controller::sim::{NotificationSender, SimulatedSwitch};
use treedn_controller::{Controller, ControllerConfig, SwitchConnection, Topology};

pub struct Fixture {
    pub controller: Controller,
    pub switches: BTreeMap<String, Arc<SimulatedSwitch>>,
    pub senders: BTreeMap<String, NotificationSender>,
}

impl Fixture {
    pub fn new(topology: Topology) -> Self {
        let mut switches = BTreeMap::new();
        let mut senders = BTreeMap::new();
        let mut connections: Vec<Arc<dyn SwitchConnection>> = Vec::new();
        for id in topology.switch_ids() {
            let (switch, sender) = SimulatedSwitch::new(id.clone(), 16);
            connections.push(switch.clone());
            switches.insert(id.to_string(), switch);
            senders.insert(id.to_string(), sender);
        }

        let controller =
            Controller::new(&ControllerConfig::default(), Arc::new(topology), connections);
        Self {
            controller,
            switches,
            senders,
        }
    }

    pub fn switch(&self, id: &str) -> &Arc<SimulatedSwitch> {
        &self.switches[id]
    }

    pub fn sender(&self, id: &str) -> &NotificationSender {
        &self.senders[id]
    }
}

/// `s1 - s2 - s3` with the content source `h1` on `s3`.
///
/// Ports: s1:1 -> s2, s2:1 -> s1, s2:2 -> s3, s3:1 -> s2, s3:2 -> h1.
pub fn line() -> Topology {
    Topology::builder()
        .link("s1", "s2")
        .link("s2", "s3")
        .host("h1", "s3")
        .build()
        .unwrap()
}

pub fn sw(id: &str) -> SwitchId {
    SwitchId::new(id)
}
