//! Error types for the TreeDN controller.

use crate::types::{ContentName, HostId, SwitchId};
use thiserror::Error;

/// All possible errors that can occur within the TreeDN controller.
///
/// Every variant is terminal for the Interest (or notification) being
/// processed; none of them is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// The requesting switch and the content source are disconnected.
    #[error("no path from {from} to {to}")]
    NoPath { from: SwitchId, to: SwitchId },

    /// A host has no recorded attachment switch.
    #[error("unknown host: {0}")]
    UnknownHost(HostId),

    /// A switch id that is not part of the topology.
    #[error("unknown switch: {0}")]
    UnknownSwitch(SwitchId),

    /// The content name cannot be used as a table match key.
    #[error("invalid content name {name}: {reason}")]
    InvalidName { name: ContentName, reason: String },

    /// A Switch Control Interface call failed.
    #[error("transport error on {switch}: {reason}")]
    Transport { switch: SwitchId, reason: String },

    /// A malformed inbound notification.
    #[error("decode error: {0}")]
    Decode(String),

    /// Topology description could not be imported.
    #[error("topology error: {0}")]
    Topology(String),

    /// Invalid controller configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a transport failure on `switch`.
    pub fn transport(switch: &SwitchId, reason: impl Into<String>) -> Self {
        Error::Transport {
            switch: switch.clone(),
            reason: reason.into(),
        }
    }
}
