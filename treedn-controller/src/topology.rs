//! Topology store.
//!
//! An undirected graph of switches, the host attachment map, and the explicit
//! per-switch port assignment used to turn a next-hop switch into an egress
//! port. Built once from the topology file and read-only afterwards, so it is
//! shared between dispatcher tasks through an `Arc` without locking.

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::Path;
use treedn_common::types::{DeviceId, HostId, PortId, SwitchId};
use treedn_common::{Error, Result};

/* ---------------------------------------------------------------- *
 * Import format
 * ---------------------------------------------------------------- */

/// The topology file: hosts, switches with their P4Runtime endpoints, and
/// links between any of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologyDescription {
    #[serde(default)]
    pub hosts: BTreeMap<String, serde_json::Value>,
    /// Kept in file order; a switch's position is its default device id.
    pub switches: IndexMap<String, SwitchDescription>,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

/// Per-switch entry of the topology file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchDescription {
    /// Local P4Runtime port; the switch listens on `127.0.0.1:<p4rt_port>`.
    pub p4rt_port: Option<u16>,
    /// Full P4Runtime address, takes precedence over `p4rt_port`.
    pub address: Option<String>,
    pub device_id: Option<u64>,
}

/// One link of the topology file: `["s1", "s2"]`, optionally followed by a
/// numeric cost. Endpoints written `s1-p3` pin the port used on that switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<serde_json::Value>")]
pub struct LinkDescription {
    pub a: String,
    pub b: String,
    pub cost: Option<u32>,
}

impl LinkDescription {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            cost: None,
        }
    }
}

impl TryFrom<Vec<serde_json::Value>> for LinkDescription {
    type Error = String;

    fn try_from(fields: Vec<serde_json::Value>) -> std::result::Result<Self, Self::Error> {
        let endpoint = |idx: usize| {
            fields
                .get(idx)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| format!("link {:?} needs two endpoint names", fields))
        };

        Ok(Self {
            a: endpoint(0)?,
            b: endpoint(1)?,
            // Latency/bandwidth strings from mininet-style files are ignored
            cost: fields
                .get(2)
                .and_then(|v| v.as_u64())
                .and_then(|c| u32::try_from(c).ok()),
        })
    }
}

/* ---------------------------------------------------------------- *
 * Store
 * ---------------------------------------------------------------- */

/// A switch as known to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchInfo {
    pub id: SwitchId,
    pub device_id: DeviceId,
    /// P4Runtime endpoint, when the topology file names one.
    pub address: Option<String>,
}

/// An undirected switch-to-switch link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub a: SwitchId,
    pub b: SwitchId,
    /// Carried from the topology file; path computation ignores it.
    pub cost: Option<u32>,
}

/// Where a host plugs into the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAttachment {
    pub switch: SwitchId,
    pub port: PortId,
}

#[derive(Debug, Clone, Default)]
pub struct Topology {
    switches: BTreeMap<SwitchId, SwitchInfo>,
    adjacency: BTreeMap<SwitchId, BTreeSet<SwitchId>>,
    ports: HashMap<(SwitchId, SwitchId), PortId>,
    links: Vec<Link>,
    hosts: BTreeMap<HostId, HostAttachment>,
}

enum Node {
    Switch(SwitchId),
    Host(HostId),
}

impl Topology {
    /// Load a topology file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let topology = Self::from_json(&raw)?;
        info!(
            "Topology loaded from {}: {} switches, {} links, hosts {:?}",
            path.as_ref().display(),
            topology.switches.len(),
            topology.links.len(),
            topology
                .hosts
                .iter()
                .map(|(h, at)| format!("{}@{}", h, at.switch))
                .collect::<Vec<_>>()
        );
        Ok(topology)
    }

    /// Parse a topology from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let description: TopologyDescription =
            serde_json::from_str(raw).map_err(|e| Error::Topology(e.to_string()))?;
        Self::from_description(&description)
    }

    /// Build the store, assigning ports in link declaration order.
    pub fn from_description(desc: &TopologyDescription) -> Result<Self> {
        let mut topology = Topology::default();

        for (idx, (name, sw)) in desc.switches.iter().enumerate() {
            let id = SwitchId::new(name.as_str());
            let address = sw
                .address
                .clone()
                .or_else(|| sw.p4rt_port.map(|p| format!("127.0.0.1:{}", p)));
            topology.switches.insert(
                id.clone(),
                SwitchInfo {
                    id: id.clone(),
                    device_id: DeviceId(sw.device_id.unwrap_or(idx as u64)),
                    address,
                },
            );
            topology.adjacency.insert(id, BTreeSet::new());
        }

        // Resolve endpoints first so explicit ports are reserved before any
        // automatic assignment happens.
        let mut resolved = Vec::with_capacity(desc.links.len());
        let mut taken: HashMap<SwitchId, BTreeSet<PortId>> = HashMap::new();
        for link in &desc.links {
            let a = resolve_endpoint(desc, &link.a)?;
            let b = resolve_endpoint(desc, &link.b)?;
            for (node, port) in [&a, &b] {
                if let (Node::Switch(sw), Some(port)) = (node, port) {
                    if !taken.entry(sw.clone()).or_default().insert(*port) {
                        return Err(Error::Topology(format!(
                            "port {} of {} is used by more than one link",
                            port, sw
                        )));
                    }
                }
            }
            resolved.push((a, b, link.cost));
        }

        let mut next_port: HashMap<SwitchId, u32> = HashMap::new();
        let mut assign = |sw: &SwitchId, explicit: Option<PortId>| -> PortId {
            if let Some(port) = explicit {
                return port;
            }
            let used = taken.entry(sw.clone()).or_default();
            let next = next_port.entry(sw.clone()).or_insert(1);
            while used.contains(&PortId(*next)) {
                *next += 1;
            }
            let port = PortId(*next);
            used.insert(port);
            port
        };

        for ((a, pa), (b, pb), cost) in resolved {
            match (a, b) {
                (Node::Switch(a), Node::Switch(b)) => {
                    if a == b {
                        return Err(Error::Topology(format!("self link on {}", a)));
                    }
                    if topology.ports.contains_key(&(a.clone(), b.clone())) {
                        return Err(Error::Topology(format!("duplicate link {} - {}", a, b)));
                    }
                    let port_a = assign(&a, pa);
                    let port_b = assign(&b, pb);
                    topology.ports.insert((a.clone(), b.clone()), port_a);
                    topology.ports.insert((b.clone(), a.clone()), port_b);
                    topology.adjacency.entry(a.clone()).or_default().insert(b.clone());
                    topology.adjacency.entry(b.clone()).or_default().insert(a.clone());
                    debug!("Link {}:{} <-> {}:{}", a, port_a, b, port_b);
                    topology.links.push(Link { a, b, cost });
                }
                (Node::Host(host), Node::Switch(sw)) | (Node::Switch(sw), Node::Host(host)) => {
                    // Only the switch side can carry an explicit port
                    let port = assign(&sw, pa.or(pb));
                    match topology.hosts.entry(host.clone()) {
                        Entry::Occupied(existing) => {
                            return Err(Error::Topology(format!(
                                "host {} attached to both {} and {}",
                                host,
                                existing.get().switch,
                                sw
                            )));
                        }
                        Entry::Vacant(slot) => {
                            debug!("Host {} attached to {}:{}", host, sw, port);
                            slot.insert(HostAttachment { switch: sw, port });
                        }
                    }
                }
                (Node::Host(a), Node::Host(b)) => {
                    return Err(Error::Topology(format!(
                        "link {} - {} does not touch a switch",
                        a, b
                    )));
                }
            }
        }

        Ok(topology)
    }

    /// Start building a topology in code.
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    /// Switches adjacent to `switch`.
    pub fn neighbors(&self, switch: &SwitchId) -> Result<&BTreeSet<SwitchId>> {
        self.adjacency
            .get(switch)
            .ok_or_else(|| Error::UnknownSwitch(switch.clone()))
    }

    /// Unweighted shortest path from `src` to `dst`, both included.
    ///
    /// Breadth-first search visiting neighbors in id order, so ties always
    /// resolve the same way.
    pub fn shortest_path(&self, src: &SwitchId, dst: &SwitchId) -> Result<Vec<SwitchId>> {
        self.neighbors(src)?;
        self.neighbors(dst)?;
        if src == dst {
            return Ok(vec![src.clone()]);
        }

        let mut parent: HashMap<&SwitchId, &SwitchId> = HashMap::new();
        let mut visited: HashSet<&SwitchId> = HashSet::from([src]);
        let mut queue: VecDeque<&SwitchId> = VecDeque::from([src]);

        while let Some(current) = queue.pop_front() {
            for next in self.adjacency.get(current).into_iter().flatten() {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == dst {
                    let mut path = vec![dst.clone()];
                    let mut hop = dst;
                    while let Some(&prev) = parent.get(hop) {
                        path.push(prev.clone());
                        hop = prev;
                    }
                    path.reverse();
                    return Ok(path);
                }
                queue.push_back(next);
            }
        }

        Err(Error::NoPath {
            from: src.clone(),
            to: dst.clone(),
        })
    }

    /// The switch `host` is attached to.
    pub fn attachment_switch(&self, host: &HostId) -> Result<&SwitchId> {
        self.hosts
            .get(host)
            .map(|at| &at.switch)
            .ok_or_else(|| Error::UnknownHost(host.clone()))
    }

    /// The switch port `host` is plugged into.
    pub fn host_port(&self, host: &HostId) -> Result<PortId> {
        self.hosts
            .get(host)
            .map(|at| at.port)
            .ok_or_else(|| Error::UnknownHost(host.clone()))
    }

    /// Port on `switch` leading to the adjacent switch `neighbor`.
    pub fn egress_port(&self, switch: &SwitchId, neighbor: &SwitchId) -> Option<PortId> {
        self.ports.get(&(switch.clone(), neighbor.clone())).copied()
    }

    pub fn switch(&self, id: &SwitchId) -> Option<&SwitchInfo> {
        self.switches.get(id)
    }

    pub fn contains_switch(&self, id: &SwitchId) -> bool {
        self.switches.contains_key(id)
    }

    /// Switch ids in sorted order.
    pub fn switch_ids(&self) -> impl Iterator<Item = &SwitchId> {
        self.switches.keys()
    }

    pub fn switches(&self) -> impl Iterator<Item = &SwitchInfo> {
        self.switches.values()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&HostId, &HostAttachment)> {
        self.hosts.iter()
    }
}

fn resolve_endpoint(desc: &TopologyDescription, raw: &str) -> Result<(Node, Option<PortId>)> {
    if desc.switches.contains_key(raw) {
        return Ok((Node::Switch(SwitchId::new(raw)), None));
    }
    if desc.hosts.contains_key(raw) {
        return Ok((Node::Host(HostId::new(raw)), None));
    }
    if let Some((node, port)) = raw.rsplit_once("-p") {
        if let Ok(port) = port.parse::<u32>() {
            if desc.switches.contains_key(node) {
                return Ok((Node::Switch(SwitchId::new(node)), Some(PortId(port))));
            }
            if desc.hosts.contains_key(node) {
                // Host-side port numbers are the host's business
                return Ok((Node::Host(HostId::new(node)), None));
            }
        }
    }
    Err(Error::Topology(format!("link endpoint {} is not a declared node", raw)))
}

/* ---------------------------------------------------------------- *
 * Builder
 * ---------------------------------------------------------------- */

/// Builds a [`Topology`] through the same import path as the topology file.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    description: TopologyDescription,
}

impl TopologyBuilder {
    pub fn switch(mut self, id: &str) -> Self {
        self.description
            .switches
            .entry(id.to_string())
            .or_default();
        self
    }

    /// Link two switches, declaring them if needed.
    pub fn link(self, a: &str, b: &str) -> Self {
        let mut this = self.switch(a).switch(b);
        this.description.links.push(LinkDescription::new(a, b));
        this
    }

    /// Attach `host` to `switch`, declaring the switch if needed.
    pub fn host(self, host: &str, switch: &str) -> Self {
        let mut this = self.switch(switch);
        this.description
            .hosts
            .insert(host.to_string(), serde_json::Value::Object(Default::default()));
        this.description.links.push(LinkDescription::new(host, switch));
        this
    }

    pub fn build(self) -> Result<Topology> {
        Topology::from_description(&self.description)
    }
}
