//! In-process switch.
//!
//! [`SimulatedSwitch`] implements [`SwitchConnection`] over plain tables and
//! a channel of packet-ins. The daemon runs on it when no hardware is
//! attached, and the tests use it to observe exactly what the controller
//! wrote.

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use treedn_common::types::{ContentName, PortId, SwitchId, TreeId};
use treedn_common::wire::{encode_frame, Packet};
use treedn_common::{Error, Result};

use crate::switch::{
    ForwardingRule, GroupBinding, MulticastGroup, PacketIn, SwitchConnection, FIB_TABLE, PIT_TABLE,
};

/// Source address of frames injected through a [`NotificationSender`].
pub const HOST_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];

/// One write as received by the switch, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchWrite {
    Forwarding(ForwardingRule),
    Group(MulticastGroup),
    Binding(GroupBinding),
}

impl SwitchWrite {
    /// Pipeline table the write targets. Groups live in the replication
    /// engine, not in a table.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            SwitchWrite::Forwarding(_) => Some(FIB_TABLE),
            SwitchWrite::Binding(_) => Some(PIT_TABLE),
            SwitchWrite::Group(_) => None,
        }
    }
}

/// Table contents of a simulated switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub fib: BTreeMap<ContentName, PortId>,
    pub groups: BTreeMap<TreeId, BTreeSet<PortId>>,
    pub bindings: BTreeMap<ContentName, TreeId>,
    pub writes: Vec<SwitchWrite>,
}

pub struct SimulatedSwitch {
    id: SwitchId,
    tables: Mutex<Tables>,
    notifications: Mutex<mpsc::Receiver<PacketIn>>,
    fail_writes: AtomicBool,
}

impl SimulatedSwitch {
    /// Create a switch whose packet-in queue holds up to `capacity` entries.
    pub fn new(id: impl Into<SwitchId>, capacity: usize) -> (Arc<Self>, NotificationSender) {
        let id = id.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let switch = Arc::new(Self {
            id: id.clone(),
            tables: Mutex::new(Tables::default()),
            notifications: Mutex::new(rx),
            fail_writes: AtomicBool::new(false),
        });
        (switch, NotificationSender { switch: id, tx })
    }

    /// Make every following write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn tables(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<SwitchWrite> {
        self.tables.lock().await.writes.clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::transport(&self.id, "write rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl SwitchConnection for SimulatedSwitch {
    fn id(&self) -> &SwitchId {
        &self.id
    }

    async fn install_forwarding_rule(&self, rule: &ForwardingRule) -> Result<()> {
        self.check_writable()?;
        rule.match_key()?;
        let mut tables = self.tables.lock().await;
        tables.fib.insert(rule.name.clone(), rule.egress_port);
        tables.writes.push(SwitchWrite::Forwarding(rule.clone()));
        Ok(())
    }

    async fn install_multicast_group(&self, group: &MulticastGroup) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let ports = group.replicas().into_iter().map(|r| r.egress_port).collect();
        tables.groups.insert(group.tree_id, ports);
        tables.writes.push(SwitchWrite::Group(group.clone()));
        Ok(())
    }

    async fn bind_name_to_group(&self, binding: &GroupBinding) -> Result<()> {
        self.check_writable()?;
        binding.match_key()?;
        let mut tables = self.tables.lock().await;
        tables.bindings.insert(binding.name.clone(), binding.tree_id);
        tables.writes.push(SwitchWrite::Binding(binding.clone()));
        Ok(())
    }

    async fn receive_notification(&self) -> Option<PacketIn> {
        self.notifications.lock().await.recv().await
    }
}

/// Feeds packet-ins to a [`SimulatedSwitch`]. Dropping every sender closes
/// the switch's notification stream.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    switch: SwitchId,
    tx: mpsc::Sender<PacketIn>,
}

impl NotificationSender {
    pub fn switch(&self) -> &SwitchId {
        &self.switch
    }

    pub async fn send(&self, packet_in: PacketIn) -> Result<()> {
        self.tx
            .send(packet_in)
            .await
            .map_err(|_| Error::transport(&self.switch, "notification stream closed"))
    }

    /// Punt a raw frame as if it arrived on `port`.
    pub async fn send_frame(&self, port: u32, frame: impl Into<Bytes>) -> Result<()> {
        self.send(PacketIn {
            payload: frame.into(),
            ingress_port: PortId(port),
        })
        .await
    }

    /// Punt an Interest for `name` as if it arrived on `port`.
    pub async fn send_interest(&self, port: u32, name: impl Into<ContentName>) -> Result<()> {
        let frame = encode_frame(HOST_MAC, &Packet::interest(name))?;
        debug!("[{}] Injecting {} byte Interest on port {}", self.switch, frame.len(), port);
        self.send_frame(port, frame).await
    }
}
