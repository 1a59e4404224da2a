//! Ingest dispatcher.
//!
//! One task per switch consumes that switch's packet-in stream, decodes each
//! frame and hands Interests to the tree builder. A failure on one
//! notification is logged and the loop moves on to the next one.

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use treedn_common::metrics::ControllerMetrics;
use treedn_common::wire::{decode_frame, PacketType};
use treedn_common::{Error, Result};

use crate::switch::{PacketIn, SwitchConnection};
use crate::tree::{Interest, InterestOutcome, TreeBuilder};

/// Start the dispatch loop for `connection`.
///
/// The task ends when the notification stream closes or `cancel` fires.
pub fn spawn_dispatcher(
    connection: Arc<dyn SwitchConnection>,
    builder: Arc<TreeBuilder>,
    metrics: Arc<ControllerMetrics>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let switch = connection.id().clone();
        info!("[{}] Listening for packet-ins", switch);

        loop {
            let packet_in = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("[{}] Dispatcher stopped", switch);
                    break;
                }
                next = connection.receive_notification() => match next {
                    Some(packet_in) => packet_in,
                    None => {
                        info!("[{}] Notification stream closed", switch);
                        break;
                    }
                },
            };

            match process_notification(connection.as_ref(), &builder, &metrics, packet_in).await {
                Ok(Some(outcome)) => debug!(
                    "[{}] Tree {} now replicates to {} port(s)",
                    switch,
                    outcome.tree_id,
                    outcome.ports.len()
                ),
                Ok(None) => {}
                Err(e) => error!("[{}] Failed to handle packet-in: {}", switch, e),
            }
        }
    })
}

/// Decode one packet-in and run the tree builder if it carries an Interest.
///
/// Returns `Ok(None)` for frames that are not ours or not Interests.
pub async fn process_notification(
    connection: &dyn SwitchConnection,
    builder: &TreeBuilder,
    metrics: &ControllerMetrics,
    packet_in: PacketIn,
) -> Result<Option<InterestOutcome>> {
    let switch = connection.id();
    metrics.notifications_received.increment();

    let packet = match decode_frame(&packet_in.payload) {
        Ok(Some(packet)) => packet,
        Ok(None) => {
            metrics.packets_ignored.increment();
            debug!("[{}] Ignoring non-TreeDN frame", switch);
            return Ok(None);
        }
        Err(e) => {
            metrics.decode_errors.increment();
            return Err(match e {
                Error::Decode(reason) => Error::Decode(format!(
                    "frame from port {}: {}",
                    packet_in.ingress_port, reason
                )),
                other => other,
            });
        }
    };

    match packet.packet_type {
        PacketType::Interest => {}
        PacketType::Data => {
            metrics.packets_ignored.increment();
            debug!("[{}] Ignoring Data packet for {}", switch, packet.name);
            return Ok(None);
        }
        PacketType::Unknown(t) => {
            metrics.packets_ignored.increment();
            warn!("[{}] Ignoring packet of unknown type {}", switch, t);
            return Ok(None);
        }
    }

    info!(
        "[{}] Interest for {} on port {}",
        switch, packet.name, packet_in.ingress_port
    );
    let interest = Interest {
        switch: switch.clone(),
        ingress_port: packet_in.ingress_port,
        name: packet.name,
    };
    builder.handle_interest(&interest).await.map(Some)
}
