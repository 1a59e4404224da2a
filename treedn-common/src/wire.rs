//! TreeDN wire format.
//!
//! A TreeDN packet travels in an Ethernet frame tagged with
//! [`ETHERTYPE_TREEDN`]. It starts with a fixed 4-byte header (network byte
//! order) followed by the content name and, for Data packets, a payload:
//!
//! ```text
//!  0       4       8               16                              32
//! +-------+-------+---------------+-------------------------------+
//! |version| type  |   hop limit   |          name length          |
//! +-------+-------+---------------+-------------------------------+
//! |                 name (name length bytes) ...                  |
//! +---------------------------------------------------------------+
//! |                 payload (Data only) ...                       |
//! +---------------------------------------------------------------+
//! ```

use crate::error::Error;
use crate::types::ContentName;
use crate::Result;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

#[cfg(test)]
mod tests;

/* ---------------------------------------------------------------- *
 * Constants
 * ---------------------------------------------------------------- */

/// Reserved ethertype carrying TreeDN packets.
pub const ETHERTYPE_TREEDN: u16 = 0x1234;

/// The only protocol version understood by this implementation.
pub const PROTOCOL_VERSION: u8 = 1;

/// Hop limit written into freshly encoded packets.
pub const DEFAULT_HOP_LIMIT: u8 = 64;

/// Size of the fixed TreeDN header.
pub const HEADER_LEN: usize = 4;

/// Size of an untagged Ethernet II header.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Ethernet broadcast address, used as destination by end hosts.
pub const BROADCAST_MAC: [u8; 6] = [0xff; 6];

const TYPE_INTEREST: u8 = 0x1;
const TYPE_DATA: u8 = 0x2;

/* ---------------------------------------------------------------- *
 * Header
 * ---------------------------------------------------------------- */

/// Packet type carried in the low nibble of the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// A consumer's named request.
    Interest,
    /// The content source's response.
    Data,
    /// Any other nibble value; carried through so callers can ignore it.
    Unknown(u8),
}

impl PacketType {
    fn from_nibble(nibble: u8) -> Self {
        match nibble {
            TYPE_INTEREST => PacketType::Interest,
            TYPE_DATA => PacketType::Data,
            other => PacketType::Unknown(other),
        }
    }

    fn to_nibble(self) -> u8 {
        match self {
            PacketType::Interest => TYPE_INTEREST,
            PacketType::Data => TYPE_DATA,
            PacketType::Unknown(other) => other & 0x0f,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketType::Interest => write!(f, "Interest"),
            PacketType::Data => write!(f, "Data"),
            PacketType::Unknown(t) => write!(f, "Unknown({})", t),
        }
    }
}

/// The fixed 4-byte TreeDN header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub packet_type: PacketType,
    pub hop_limit: u8,
    pub name_length: u16,
}

impl Header {
    /// Encode the header into `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8((self.version << 4) | self.packet_type.to_nibble());
        buf.put_u8(self.hop_limit);
        buf.put_u16(self.name_length);
    }

    /// Decode the header from `buf`. The version is not checked here.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < HEADER_LEN {
            return Err(Error::Decode(format!(
                "TreeDN header requires {} bytes but only {} available",
                HEADER_LEN,
                buf.remaining()
            )));
        }

        let first = buf.get_u8();
        Ok(Self {
            version: first >> 4,
            packet_type: PacketType::from_nibble(first & 0x0f),
            hop_limit: buf.get_u8(),
            name_length: buf.get_u16(),
        })
    }
}

/* ---------------------------------------------------------------- *
 * Packet
 * ---------------------------------------------------------------- */

/// A decoded TreeDN packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: PacketType,
    pub hop_limit: u8,
    pub name: ContentName,
    /// Opaque Data payload; always empty for Interests.
    pub payload: Bytes,
}

impl Packet {
    /// Creates a new Interest for `name`.
    pub fn interest(name: impl Into<ContentName>) -> Self {
        Self {
            packet_type: PacketType::Interest,
            hop_limit: DEFAULT_HOP_LIMIT,
            name: name.into(),
            payload: Bytes::new(),
        }
    }

    /// Creates a new Data packet for `name` carrying `payload`.
    pub fn data(name: impl Into<ContentName>, payload: impl Into<Bytes>) -> Self {
        Self {
            packet_type: PacketType::Data,
            hop_limit: DEFAULT_HOP_LIMIT,
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Sets the hop limit.
    pub fn with_hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = hop_limit;
        self
    }

    pub fn is_interest(&self) -> bool {
        self.packet_type == PacketType::Interest
    }

    /// Number of bytes this packet occupies once encoded.
    pub fn wire_size(&self) -> usize {
        HEADER_LEN + self.name.len() + self.payload.len()
    }

    /// Encode the packet (header, name, payload) into `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        let name_length = u16::try_from(self.name.len()).map_err(|_| Error::InvalidName {
            name: self.name.clone(),
            reason: format!("{} bytes do not fit the length field", self.name.len()),
        })?;

        Header {
            version: PROTOCOL_VERSION,
            packet_type: self.packet_type,
            hop_limit: self.hop_limit,
            name_length,
        }
        .encode(buf);
        buf.extend_from_slice(self.name.as_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(())
    }

    /// Decode a packet from `buf`, consuming it.
    ///
    /// Bytes after the name of an Interest (Ethernet padding) are dropped.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        let header = Header::decode(buf)?;
        if header.version != PROTOCOL_VERSION {
            return Err(Error::Decode(format!(
                "unsupported TreeDN version {}",
                header.version
            )));
        }

        let name_length = header.name_length as usize;
        if buf.remaining() < name_length {
            return Err(Error::Decode(format!(
                "name requires {} bytes but only {} available",
                name_length,
                buf.remaining()
            )));
        }

        let name = ContentName(buf.copy_to_bytes(name_length));
        let rest = buf.remaining();
        let payload = match header.packet_type {
            PacketType::Interest => {
                buf.advance(rest);
                Bytes::new()
            }
            _ => buf.copy_to_bytes(rest),
        };

        Ok(Self {
            packet_type: header.packet_type,
            hop_limit: header.hop_limit,
            name,
            payload,
        })
    }
}

/* ---------------------------------------------------------------- *
 * Ethernet framing
 * ---------------------------------------------------------------- */

/// Ethernet II header preceding a TreeDN packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: [u8; 6],
    pub src: [u8; 6],
    pub ethertype: u16,
}

impl EthernetHeader {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.dst);
        buf.extend_from_slice(&self.src);
        buf.put_u16(self.ethertype);
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < ETHERNET_HEADER_LEN {
            return Err(Error::Decode(format!(
                "Ethernet header requires {} bytes but only {} available",
                ETHERNET_HEADER_LEN,
                buf.remaining()
            )));
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        buf.copy_to_slice(&mut dst);
        buf.copy_to_slice(&mut src);
        Ok(Self {
            dst,
            src,
            ethertype: buf.get_u16(),
        })
    }
}

/// Encode `packet` as a broadcast Ethernet frame sent from `src`.
pub fn encode_frame(src: [u8; 6], packet: &Packet) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(ETHERNET_HEADER_LEN + packet.wire_size());
    EthernetHeader {
        dst: BROADCAST_MAC,
        src,
        ethertype: ETHERTYPE_TREEDN,
    }
    .encode(&mut buf);
    packet.encode(&mut buf)?;
    Ok(buf.freeze())
}

/// Decode a raw Ethernet frame.
///
/// Returns `Ok(None)` for frames of another ethertype, which are not ours to
/// interpret.
pub fn decode_frame(frame: &[u8]) -> Result<Option<Packet>> {
    let mut buf = frame;
    let eth = EthernetHeader::decode(&mut buf)?;
    if eth.ethertype != ETHERTYPE_TREEDN {
        return Ok(None);
    }
    Packet::decode(&mut buf).map(Some)
}
