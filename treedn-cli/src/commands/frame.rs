//! Frame encoding and decoding for the TreeDN CLI

use anyhow::{Context, Result};
use bytes::Bytes;
use treedn_common::wire::{decode_frame, encode_frame, EthernetHeader, Packet};

use crate::utils::{format_mac, parse_mac, print_header};
use crate::FrameCommands;

/// Encode a packet and print the frame as hex
pub fn encode(cmd: FrameCommands) -> Result<()> {
    let (src, packet) = match cmd {
        FrameCommands::Interest {
            name,
            hop_limit,
            src,
        } => (src, Packet::interest(name).with_hop_limit(hop_limit)),
        FrameCommands::Data {
            name,
            payload,
            hop_limit,
            src,
        } => (
            src,
            Packet::data(name, Bytes::from(payload)).with_hop_limit(hop_limit),
        ),
    };

    let frame = encode_frame(parse_mac(&src)?, &packet).context("Failed to encode frame")?;
    println!("{}", hex::encode(&frame));
    Ok(())
}

/// Decode a hex frame and print its fields
pub fn decode(raw: &str) -> Result<()> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let bytes = hex::decode(&cleaned).context("Frame is not valid hex")?;

    let ethernet = EthernetHeader::decode(&mut bytes.as_slice()).context("Failed to decode frame")?;
    let packet = match decode_frame(&bytes).context("Failed to decode frame")? {
        Some(packet) => packet,
        None => {
            println!("Not a TreeDN frame (ethertype 0x{:04x})", ethernet.ethertype);
            return Ok(());
        }
    };

    print_header("TreeDN frame");
    println!("  src:       {}", format_mac(&ethernet.src));
    println!("  dst:       {}", format_mac(&ethernet.dst));
    println!("  type:      {}", packet.packet_type);
    println!("  hop limit: {}", packet.hop_limit);
    println!("  name:      {} ({} bytes)", packet.name, packet.name.len());
    if !packet.payload.is_empty() {
        println!(
            "  payload:   {} bytes: {}",
            packet.payload.len(),
            String::from_utf8_lossy(&packet.payload)
        );
    }
    Ok(())
}
