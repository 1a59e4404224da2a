//! Utility functions for the TreeDN CLI

use anyhow::{bail, Context, Result};

/// Parse a MAC address written as six colon-separated hex octets.
pub fn parse_mac(raw: &str) -> Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut octets = raw.split(':');
    for byte in mac.iter_mut() {
        let octet = octets.next().with_context(|| format!("MAC address {} is too short", raw))?;
        *byte = u8::from_str_radix(octet, 16)
            .with_context(|| format!("Invalid octet {:?} in MAC address {}", octet, raw))?;
    }
    if octets.next().is_some() {
        bail!("MAC address {} is too long", raw);
    }
    Ok(mac)
}

pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Print a section header in the CLI output
pub fn print_header(title: &str) {
    let separator = "=".repeat(title.len());
    println!("\n{}", title);
    println!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_round_trip() {
        let mac = parse_mac("02:00:00:0a:ff:01").unwrap();
        assert_eq!(mac, [0x02, 0x00, 0x00, 0x0a, 0xff, 0x01]);
        assert_eq!(format_mac(&mac), "02:00:00:0a:ff:01");
    }

    #[test]
    fn test_bad_macs() {
        assert!(parse_mac("02:00:00").is_err());
        assert!(parse_mac("02:00:00:00:00:01:02").is_err());
        assert!(parse_mac("zz:00:00:00:00:01").is_err());
    }
}
