//! Minimal packet front-end
//!
//! Walks a captured frame just far enough to fill a [`PacketInfo`]: link layer
//! (Ethernet with stacked VLAN tags and MPLS label stacks, or raw IP), the IPv4
//! or IPv6 fixed header, and the TCP, UDP or ICMP ports. Every header is a
//! zero-copy overlay on the capture buffer.
//!
//! ```
//! use flow_strata::packet::{decode, LinkType};
//! use flow_strata::key::PktType;
//!
//! let frame = [
//!     0x45, 0x00, 0x00, 0x1c, 0x00, 0x01, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00,
//!     10, 0, 0, 1, 10, 0, 0, 2, // IPv4 src, dst
//!     0x13, 0x88, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00, // UDP 5000 -> 53
//! ];
//! let info = decode(&frame, LinkType::RawIp).unwrap();
//! assert_eq!(info.pkt_type, PktType::Udp);
//! assert_eq!((info.src_port, info.dst_port), (5000, 53));
//! ```

use std::mem;

use thiserror::Error;
use tracing::trace;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::addr::IpAddress;
use crate::key::{KeyInput, PktType};
use crate::packet::{
    ether::{EtherHeader, VlanTag},
    icmp::IcmpHeader,
    ipv4::Ipv4Header,
    ipv6::Ipv6Header,
    mpls::MplsLabel,
    protocol::{EtherProto, IpProto},
    tcp::TcpHeader,
    udp::UdpHeader,
};

pub mod ether;
pub mod icmp;
pub mod ipv4;
pub mod ipv6;
pub mod mpls;
pub mod protocol;
pub mod tcp;
pub mod udp;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer too short for {0}")]
    TooShort(&'static str),
    #[error("invalid {0}")]
    Invalid(&'static str),
    #[error("unsupported {0}")]
    Unsupported(&'static str),
}

pub trait PacketHeader: Sized {
    const FIXED_LEN: usize = mem::size_of::<Self>();
    const NAME: &'static str;

    /// Header length including options, in bytes
    #[inline]
    fn total_len(&self) -> usize {
        Self::FIXED_LEN
    }

    #[inline]
    fn is_valid(&self) -> bool {
        true
    }
}

pub trait HeaderParser: PacketHeader + FromBytes + KnownLayout + Immutable + Unaligned {
    /// Overlay the header on the front of `buf`, skip its options and return
    /// the remaining payload.
    #[inline]
    fn from_bytes(buf: &[u8]) -> Result<(&Self, &[u8]), DecodeError> {
        let (header, rest) =
            Self::ref_from_prefix(buf).map_err(|_| DecodeError::TooShort(Self::NAME))?;

        if !header.is_valid() {
            return Err(DecodeError::Invalid(Self::NAME));
        }

        let options_len = header.total_len().saturating_sub(Self::FIXED_LEN);
        if rest.len() < options_len {
            return Err(DecodeError::TooShort(Self::NAME));
        }

        Ok((header, &rest[options_len..]))
    }
}

impl<T> HeaderParser for T where T: PacketHeader + FromBytes + KnownLayout + Immutable + Unaligned {}

/// Link layer of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// Ethernet II
    Ethernet,
    /// No link header; the IP version nibble selects the family
    RawIp,
}

/// The fields of one packet that feed a flow key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketInfo {
    pub src: IpAddress,
    pub dst: IpAddress,
    /// Source port, or ICMP type
    pub src_port: u16,
    /// Destination port, or ICMP code
    pub dst_port: u16,
    pub ip_proto: IpProto,
    pub pkt_type: PktType,
    /// Outermost VLAN id, 0 if untagged
    pub vlan_id: u16,
    /// Bottom-of-stack MPLS label, 0 if none
    pub mpls_label: u32,
    /// TCP flags byte, 0 for other protocols
    pub tcp_flags: u8,
    /// Bytes after the transport header (after the IP header for other
    /// protocols and non-first fragments)
    pub payload_len: usize,
}

impl PacketInfo {
    pub fn key_input(&self, address_space_id: u16) -> KeyInput {
        KeyInput {
            pkt_type: self.pkt_type,
            ip_proto: self.ip_proto,
            src: self.src,
            src_port: self.src_port,
            dst: self.dst,
            dst_port: self.dst_port,
            vlan_id: self.vlan_id,
            mpls_label: self.mpls_label,
            address_space_id,
        }
    }
}

/// Decode one captured frame.
pub fn decode(frame: &[u8], link: LinkType) -> Result<PacketInfo, DecodeError> {
    let mut info = PacketInfo::default();

    let ip = match link {
        LinkType::Ethernet => {
            let (eth, mut rest) = EtherHeader::from_bytes(frame)?;
            let mut proto = eth.proto();
            let mut outer_vlan = None;

            while proto.is_vlan() {
                let (tag, inner) = VlanTag::from_bytes(rest)?;
                outer_vlan.get_or_insert(tag.vlan_id());
                proto = tag.proto();
                rest = inner;
            }
            info.vlan_id = outer_vlan.unwrap_or(0);

            if proto.is_mpls() {
                loop {
                    let (label, inner) = MplsLabel::from_bytes(rest)?;
                    rest = inner;
                    if label.is_bottom() {
                        info.mpls_label = label.label();
                        break;
                    }
                }
                proto = match rest.first().map(|b| b >> 4) {
                    Some(4) => EtherProto::IPV4,
                    Some(6) => EtherProto::IPV6,
                    _ => return Err(DecodeError::Unsupported("mpls payload")),
                };
            }

            if proto != EtherProto::IPV4 && proto != EtherProto::IPV6 {
                trace!("skipping non-ip frame, ethertype {proto}");
                return Err(DecodeError::Unsupported("ethertype"));
            }
            rest
        }
        LinkType::RawIp => frame,
    };

    match ip.first().map(|b| b >> 4) {
        Some(4) => decode_ipv4(ip, &mut info)?,
        Some(6) => decode_ipv6(ip, &mut info)?,
        Some(_) => return Err(DecodeError::Invalid("ip version")),
        None => return Err(DecodeError::TooShort("ip")),
    }

    Ok(info)
}

fn decode_ipv4(buf: &[u8], info: &mut PacketInfo) -> Result<(), DecodeError> {
    let (ip, rest) = Ipv4Header::from_bytes(buf)?;
    info.src = IpAddress::V4(ip.src_ip_raw());
    info.dst = IpAddress::V4(ip.dst_ip_raw());
    info.ip_proto = ip.protocol();

    // drop link-layer trailer padding
    let l4_len = ip.total_length().saturating_sub(ip.total_len());
    let l4 = &rest[..l4_len.min(rest.len())];

    if ip.fragment_offset() != 0 {
        trace!("non-first ipv4 fragment, id {}", ip.id());
        info.pkt_type = PktType::Ip;
        info.payload_len = l4.len();
        return Ok(());
    }

    decode_transport(l4, false, info)
}

fn decode_ipv6(buf: &[u8], info: &mut PacketInfo) -> Result<(), DecodeError> {
    let (ip, rest) = Ipv6Header::from_bytes(buf)?;
    info.src = IpAddress::V6(ip.src_ip_raw());
    info.dst = IpAddress::V6(ip.dst_ip_raw());
    info.ip_proto = ip.next_header();

    let l4 = &rest[..ip.payload_length().min(rest.len())];
    decode_transport(l4, true, info)
}

fn decode_transport(l4: &[u8], ipv6: bool, info: &mut PacketInfo) -> Result<(), DecodeError> {
    let proto = info.ip_proto;

    if proto == IpProto::TCP {
        let (tcp, payload) = TcpHeader::from_bytes(l4)?;
        info.pkt_type = PktType::Tcp;
        info.src_port = tcp.src_port();
        info.dst_port = tcp.dst_port();
        info.tcp_flags = tcp.flags();
        info.payload_len = payload.len();
    } else if proto == IpProto::UDP {
        let (udp, payload) = UdpHeader::from_bytes(l4)?;
        info.pkt_type = PktType::Udp;
        info.src_port = udp.src_port();
        info.dst_port = udp.dst_port();
        info.payload_len = payload.len();
    } else if proto == IpProto::ICMP || (ipv6 && proto == IpProto::IPV6_ICMP) {
        let (icmp, payload) = IcmpHeader::from_bytes(l4)?;
        info.pkt_type = PktType::Icmp;
        info.src_port = icmp.icmp_type() as u16;
        info.dst_port = icmp.code() as u16;
        info.payload_len = payload.len();
    } else {
        info.pkt_type = PktType::Ip;
        info.payload_len = l4.len();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(proto: u16) -> Vec<u8> {
        let mut f = vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];
        f.extend_from_slice(&proto.to_be_bytes());
        f
    }

    fn ipv4(proto: u8, src: [u8; 4], dst: [u8; 4], l4: &[u8]) -> Vec<u8> {
        let total = (20 + l4.len()) as u16;
        let mut p = vec![0x45, 0x00];
        p.extend_from_slice(&total.to_be_bytes());
        p.extend_from_slice(&[0x12, 0x34, 0x40, 0x00, 64, proto, 0, 0]);
        p.extend_from_slice(&src);
        p.extend_from_slice(&dst);
        p.extend_from_slice(l4);
        p
    }

    fn tcp(sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(&sport.to_be_bytes());
        t.extend_from_slice(&dport.to_be_bytes());
        t.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0, 0x50, 0x02, 0xff, 0xff, 0, 0, 0, 0]);
        t.extend_from_slice(payload);
        t
    }

    fn udp(sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
        let mut u = Vec::new();
        u.extend_from_slice(&sport.to_be_bytes());
        u.extend_from_slice(&dport.to_be_bytes());
        u.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
        u.extend_from_slice(&[0, 0]);
        u.extend_from_slice(payload);
        u
    }

    fn ipv6(next: u8, src: [u8; 16], dst: [u8; 16], l4: &[u8]) -> Vec<u8> {
        let mut p = vec![0x60, 0, 0, 0];
        p.extend_from_slice(&(l4.len() as u16).to_be_bytes());
        p.extend_from_slice(&[next, 64]);
        p.extend_from_slice(&src);
        p.extend_from_slice(&dst);
        p.extend_from_slice(l4);
        p
    }

    #[test]
    fn test_ethernet_tcp() {
        let mut frame = ether(0x0800);
        frame.extend(ipv4(6, [10, 0, 0, 5], [10, 0, 0, 9], &tcp(4444, 80, b"hello")));
        // ethernet padding
        frame.extend_from_slice(&[0; 6]);

        let info = decode(&frame, LinkType::Ethernet).unwrap();
        assert_eq!(info.src, IpAddress::V4([10, 0, 0, 5]));
        assert_eq!(info.dst, IpAddress::V4([10, 0, 0, 9]));
        assert_eq!((info.src_port, info.dst_port), (4444, 80));
        assert_eq!(info.ip_proto, IpProto::TCP);
        assert_eq!(info.pkt_type, PktType::Tcp);
        assert_eq!(info.payload_len, 5);
        assert_eq!(info.tcp_flags, TcpHeader::FLAG_SYN);
        assert_eq!(info.vlan_id, 0);
        assert_eq!(info.mpls_label, 0);
    }

    #[test]
    fn test_stacked_vlan_keeps_outer_tag() {
        let mut frame = ether(0x88a8);
        frame.extend_from_slice(&[0x00, 0x64, 0x81, 0x00]); // s-tag 100
        frame.extend_from_slice(&[0x20, 0xc8, 0x08, 0x00]); // c-tag 200, pcp 1
        frame.extend(ipv4(17, [10, 0, 0, 1], [10, 0, 0, 2], &udp(5000, 53, &[1, 2, 3])));

        let info = decode(&frame, LinkType::Ethernet).unwrap();
        assert_eq!(info.vlan_id, 100);
        assert_eq!(info.pkt_type, PktType::Udp);
        assert_eq!(info.payload_len, 3);
    }

    #[test]
    fn test_mpls_stack_keeps_bottom_label() {
        let mut frame = ether(0x8847);
        frame.extend_from_slice(&[0x00, 0x01, 0x00, 0x40]); // label 16
        frame.extend_from_slice(&[0x00, 0x3e, 0x81, 0x40]); // label 1000, bottom
        frame.extend(ipv4(6, [10, 0, 0, 1], [10, 0, 0, 2], &tcp(1, 2, &[])));

        let info = decode(&frame, LinkType::Ethernet).unwrap();
        assert_eq!(info.mpls_label, 1000);
        assert_eq!(info.pkt_type, PktType::Tcp);
    }

    #[test]
    fn test_ipv6_icmp() {
        let mut src = [0u8; 16];
        src[0] = 0xfe;
        src[1] = 0x80;
        src[15] = 1;
        let mut dst = src;
        dst[15] = 2;

        let mut frame = ether(0x86dd);
        frame.extend(ipv6(58, src, dst, &[129, 0, 0, 0, 0, 1, 0, 1]));

        let info = decode(&frame, LinkType::Ethernet).unwrap();
        assert_eq!(info.src, IpAddress::V6(src));
        assert_eq!(info.pkt_type, PktType::Icmp);
        assert_eq!(info.ip_proto, IpProto::IPV6_ICMP);
        assert_eq!((info.src_port, info.dst_port), (129, 0));
        assert_eq!(info.payload_len, 4);
    }

    #[test]
    fn test_icmp_type_and_code_in_ports() {
        let frame = ipv4(1, [8, 8, 8, 8], [10, 0, 0, 1], &[3, 1, 0, 0, 0, 0, 0, 0]);
        let info = decode(&frame, LinkType::RawIp).unwrap();
        assert_eq!(info.pkt_type, PktType::Icmp);
        assert_eq!((info.src_port, info.dst_port), (3, 1));
    }

    #[test]
    fn test_non_first_fragment_has_no_ports() {
        let mut frame = ipv4(6, [10, 0, 0, 1], [10, 0, 0, 2], &[0xaa; 16]);
        frame[6] = 0x00;
        frame[7] = 0xb9; // offset 185
        let info = decode(&frame, LinkType::RawIp).unwrap();
        assert_eq!(info.pkt_type, PktType::Ip);
        assert_eq!((info.src_port, info.dst_port), (0, 0));
        assert_eq!(info.payload_len, 16);
    }

    #[test]
    fn test_ipv4_options_skipped() {
        let mut frame = ipv4(17, [10, 0, 0, 1], [10, 0, 0, 2], &[]);
        frame[0] = 0x46;
        frame.extend_from_slice(&[0x01, 0x01, 0x01, 0x00]); // NOP NOP NOP EOL
        frame.extend(udp(7, 9, &[]));
        let total = frame.len() as u16;
        frame[2..4].copy_from_slice(&total.to_be_bytes());

        let info = decode(&frame, LinkType::RawIp).unwrap();
        assert_eq!((info.src_port, info.dst_port), (7, 9));
    }

    #[test]
    fn test_other_protocol_is_ip() {
        let frame = ipv4(47, [10, 0, 0, 1], [10, 0, 0, 2], &[0; 12]);
        let info = decode(&frame, LinkType::RawIp).unwrap();
        assert_eq!(info.pkt_type, PktType::Ip);
        assert_eq!(info.ip_proto, IpProto::GRE);
        assert_eq!(info.payload_len, 12);
    }

    #[test]
    fn test_errors() {
        let mut arp = ether(0x0806);
        arp.extend_from_slice(&[0; 28]);
        assert_eq!(
            decode(&arp, LinkType::Ethernet),
            Err(DecodeError::Unsupported("ethertype"))
        );

        assert!(matches!(
            decode(&[0x00, 0x11], LinkType::Ethernet),
            Err(DecodeError::TooShort(_))
        ));

        let truncated = ipv4(6, [10, 0, 0, 1], [10, 0, 0, 2], &[0; 4]);
        assert!(matches!(
            decode(&truncated, LinkType::RawIp),
            Err(DecodeError::TooShort(_))
        ));

        assert_eq!(
            decode(&[0x75, 0, 0, 0], LinkType::RawIp),
            Err(DecodeError::Invalid("ip version"))
        );
        assert_eq!(decode(&[], LinkType::RawIp), Err(DecodeError::TooShort("ip")));
    }

    #[test]
    fn test_key_input() {
        let frame = ipv4(6, [10, 0, 0, 5], [10, 0, 0, 9], &tcp(4444, 80, &[]));
        let info = decode(&frame, LinkType::RawIp).unwrap();
        let input = info.key_input(7);
        assert_eq!(input.address_space_id, 7);
        assert_eq!(input.src_port, 4444);
        assert_eq!(input.pkt_type, PktType::Tcp);
    }
}
