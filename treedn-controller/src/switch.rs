//! Switch Control Interface.
//!
//! The boundary between the controller core and a forwarding device: the
//! three table writes the core issues and the packet-in stream it consumes.
//! Rule types also carry the table match encoding of the TreeDN pipeline.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::BTreeSet;
use treedn_common::types::{ContentName, PortId, SwitchId, TreeId, MAX_NAME_LEN};
use treedn_common::{Error, Result};

/// Forwarding table of the TreeDN pipeline (LPM on the name).
pub const FIB_TABLE: &str = "IngressImpl.fib";
/// Name to multicast group table (exact match on the name).
pub const PIT_TABLE: &str = "IngressImpl.pit";
/// Replica instance used for every multicast group member.
pub const REPLICA_INSTANCE: u32 = 1;

/// Zero-pad `name` to the width of the pipeline's name match field.
pub fn padded_name(name: &ContentName) -> Result<Bytes> {
    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName {
            name: name.clone(),
            reason: format!("longer than the {}-byte match field", MAX_NAME_LEN),
        });
    }
    let mut buf = BytesMut::zeroed(MAX_NAME_LEN);
    buf[..name.len()].copy_from_slice(name.as_bytes());
    Ok(buf.freeze())
}

/// FIB rule: send Interests for `name` out of `egress_port`, toward `next_hop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingRule {
    pub switch: SwitchId,
    pub name: ContentName,
    pub next_hop: SwitchId,
    pub egress_port: PortId,
}

impl ForwardingRule {
    /// LPM key: padded name and prefix length in bits.
    pub fn match_key(&self) -> Result<(Bytes, u32)> {
        Ok((padded_name(&self.name)?, (self.name.len() * 8) as u32))
    }
}

/// One member of a multicast group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replica {
    pub egress_port: PortId,
    pub instance: u32,
}

/// Multicast group `tree_id` on `switch` replicating to `ports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastGroup {
    pub switch: SwitchId,
    pub tree_id: TreeId,
    pub ports: BTreeSet<PortId>,
}

impl MulticastGroup {
    pub fn replicas(&self) -> Vec<Replica> {
        self.ports
            .iter()
            .map(|&egress_port| Replica {
                egress_port,
                instance: REPLICA_INSTANCE,
            })
            .collect()
    }
}

/// PIT-like binding of `name` to multicast group `tree_id` on `switch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBinding {
    pub switch: SwitchId,
    pub name: ContentName,
    pub tree_id: TreeId,
}

impl GroupBinding {
    /// Exact-match key: the padded name.
    pub fn match_key(&self) -> Result<Bytes> {
        padded_name(&self.name)
    }
}

/// A packet punted to the controller by a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    /// The raw Ethernet frame.
    pub payload: Bytes,
    /// Port the frame arrived on, from the packet-in metadata.
    pub ingress_port: PortId,
}

/// Control connection to one switch.
///
/// Writes either complete or fail with [`Error::Transport`]; the controller
/// issues at most one write at a time per switch.
#[async_trait]
pub trait SwitchConnection: Send + Sync {
    fn id(&self) -> &SwitchId;

    async fn install_forwarding_rule(&self, rule: &ForwardingRule) -> Result<()>;

    async fn install_multicast_group(&self, group: &MulticastGroup) -> Result<()>;

    async fn bind_name_to_group(&self, binding: &GroupBinding) -> Result<()>;

    /// Wait for the next packet-in. `None` once the connection is closed.
    async fn receive_notification(&self) -> Option<PacketIn>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fib_match_key_is_padded_lpm() {
        let rule = ForwardingRule {
            switch: SwitchId::new("s1"),
            name: ContentName::from("/live/a"),
            next_hop: SwitchId::new("s2"),
            egress_port: PortId(2),
        };
        let (key, prefix_len) = rule.match_key().unwrap();
        assert_eq!(key.len(), MAX_NAME_LEN);
        assert_eq!(&key[..7], b"/live/a");
        assert!(key[7..].iter().all(|&b| b == 0));
        assert_eq!(prefix_len, 56);
    }

    #[test]
    fn oversized_names_have_no_key() {
        let binding = GroupBinding {
            switch: SwitchId::new("s1"),
            name: ContentName::new(vec![b'a'; MAX_NAME_LEN + 1]),
            tree_id: TreeId(1),
        };
        assert!(matches!(binding.match_key(), Err(Error::InvalidName { .. })));
    }

    #[test]
    fn replicas_use_a_single_instance() {
        let group = MulticastGroup {
            switch: SwitchId::new("s1"),
            tree_id: TreeId(1),
            ports: BTreeSet::from([PortId(7), PortId(4)]),
        };
        let replicas = group.replicas();
        assert_eq!(replicas.len(), 2);
        assert_eq!(replicas[0].egress_port, PortId(4));
        assert!(replicas.iter().all(|r| r.instance == REPLICA_INSTANCE));
    }
}
