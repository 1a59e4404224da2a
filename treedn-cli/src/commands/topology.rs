//! Topology command implementation for the TreeDN CLI

use anyhow::Result;
use treedn_controller::Topology;

use crate::utils::print_header;

/// Print switches, links with their ports, and host attachments
pub fn show_topology(topology: &Topology) -> Result<()> {
    print_header("Switches");
    for switch in topology.switches() {
        println!(
            "  {:<8} device {:<4} {}",
            switch.id,
            switch.device_id,
            switch.address.as_deref().unwrap_or("-")
        );
    }

    print_header("Links");
    for link in topology.links() {
        let port_a = topology.egress_port(&link.a, &link.b);
        let port_b = topology.egress_port(&link.b, &link.a);
        match (port_a, port_b) {
            (Some(pa), Some(pb)) => println!("  {}:{} <-> {}:{}", link.a, pa, link.b, pb),
            _ => println!("  {} <-> {}", link.a, link.b),
        }
    }

    print_header("Hosts");
    for (host, attachment) in topology.hosts() {
        println!("  {:<8} on {}:{}", host, attachment.switch, attachment.port);
    }

    Ok(())
}
