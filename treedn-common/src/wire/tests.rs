//! Unit tests for the TreeDN wire codec

use super::*;
use bytes::BytesMut;

const HOST_MAC: [u8; 6] = [0x08, 0x00, 0x00, 0x00, 0x01, 0x11];

#[test]
fn test_header_layout() {
    let mut buf = BytesMut::new();
    Packet::interest("A").encode(&mut buf).unwrap();

    // version 1 in the high nibble, Interest (1) in the low nibble
    assert_eq!(buf[0], 0x11);
    assert_eq!(buf[1], DEFAULT_HOP_LIMIT);
    assert_eq!(&buf[2..4], &[0x00, 0x01]);
    assert_eq!(&buf[4..], b"A");
}

#[test]
fn test_data_header_and_payload() {
    let mut buf = BytesMut::new();
    Packet::data("/live/stream1", &b"Streaming packet #1"[..])
        .with_hop_limit(3)
        .encode(&mut buf)
        .unwrap();

    assert_eq!(buf[0], 0x12);
    assert_eq!(buf[1], 3);
    assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), 13);

    let packet = Packet::decode(&mut buf.freeze()).unwrap();
    assert_eq!(packet.packet_type, PacketType::Data);
    assert_eq!(packet.name, ContentName::from("/live/stream1"));
    assert_eq!(&packet.payload[..], b"Streaming packet #1");
}

#[test]
fn test_frame_decoding() {
    let frame = encode_frame(HOST_MAC, &Packet::interest("/live/stream1")).unwrap();
    assert_eq!(&frame[0..6], &BROADCAST_MAC);
    assert_eq!(&frame[6..12], &HOST_MAC);
    assert_eq!(&frame[12..14], &[0x12, 0x34]);

    let packet = decode_frame(&frame).unwrap().expect("TreeDN frame");
    assert!(packet.is_interest());
    assert_eq!(packet.hop_limit, DEFAULT_HOP_LIMIT);
    assert_eq!(packet.name, ContentName::from("/live/stream1"));
    assert!(packet.payload.is_empty());
}

#[test]
fn test_interest_padding_is_ignored() {
    let mut frame = encode_frame(HOST_MAC, &Packet::interest("A")).unwrap().to_vec();
    // Ethernet minimum frame size
    frame.resize(60, 0);

    let packet = decode_frame(&frame).unwrap().unwrap();
    assert_eq!(packet.name, ContentName::from("A"));
    assert!(packet.payload.is_empty());
}

#[test]
fn test_foreign_ethertype_is_not_ours() {
    let mut frame = encode_frame(HOST_MAC, &Packet::interest("A")).unwrap().to_vec();
    frame[12] = 0x08;
    frame[13] = 0x00;
    assert!(decode_frame(&frame).unwrap().is_none());
}

#[test]
fn test_truncated_frames() {
    let frame = encode_frame(HOST_MAC, &Packet::interest("/abc")).unwrap();

    // short Ethernet header
    assert!(matches!(decode_frame(&frame[..10]), Err(Error::Decode(_))));
    // short TreeDN header
    assert!(matches!(decode_frame(&frame[..16]), Err(Error::Decode(_))));
    // name runs past the end of the frame
    assert!(matches!(decode_frame(&frame[..frame.len() - 1]), Err(Error::Decode(_))));
}

#[test]
fn test_unsupported_version() {
    let mut frame = encode_frame(HOST_MAC, &Packet::interest("A")).unwrap().to_vec();
    frame[ETHERNET_HEADER_LEN] = 0x21;
    assert!(matches!(decode_frame(&frame), Err(Error::Decode(_))));
}

#[test]
fn test_unknown_packet_type_is_carried() {
    let mut frame = encode_frame(HOST_MAC, &Packet::interest("A")).unwrap().to_vec();
    frame[ETHERNET_HEADER_LEN] = 0x17;

    let packet = decode_frame(&frame).unwrap().unwrap();
    assert_eq!(packet.packet_type, PacketType::Unknown(7));
    assert!(!packet.is_interest());
}

#[test]
fn test_name_is_opaque_bytes() {
    let name = ContentName::new(vec![0xde, 0xad, 0xbe, 0xef]);
    let frame = encode_frame(HOST_MAC, &Packet::interest(name.clone())).unwrap();
    assert_eq!(decode_frame(&frame).unwrap().unwrap().name, name);
}

#[test]
fn test_oversized_name_is_rejected() {
    let name = ContentName::new(vec![b'x'; u16::MAX as usize + 1]);
    let mut buf = BytesMut::new();
    assert!(matches!(
        Packet::interest(name).encode(&mut buf),
        Err(Error::InvalidName { .. })
    ));
}
