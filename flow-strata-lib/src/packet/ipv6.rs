//! IPv6 fixed header (RFC 8200)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |Version| Traffic Class |           Flow Label                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Payload Length        |  Next Header  |   Hop Limit   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                         Source Address                        +
//! |                          (128 bits)                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                      Destination Address                      +
//! |                          (128 bits)                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Extension headers are not walked: when present, `next_header` names the
//! first extension and the flow is keyed without ports.

use std::fmt;
use std::net::Ipv6Addr;

use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::packet::protocol::IpProto;
use crate::packet::PacketHeader;

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct Ipv6Header {
    ver_tc_flow: U32<BigEndian>,
    payload_length: U16<BigEndian>,
    next_header: IpProto,
    hop_limit: u8,
    src_ip: [u8; 16],
    dst_ip: [u8; 16],
}

impl Ipv6Header {
    #[inline]
    pub fn version(&self) -> u8 {
        (self.ver_tc_flow.get() >> 28) as u8
    }

    #[inline]
    pub fn traffic_class(&self) -> u8 {
        (self.ver_tc_flow.get() >> 20) as u8
    }

    #[inline]
    pub fn flow_label(&self) -> u32 {
        self.ver_tc_flow.get() & 0x000f_ffff
    }

    /// Bytes after the fixed header, extension headers included
    #[inline]
    pub fn payload_length(&self) -> usize {
        self.payload_length.get() as usize
    }

    #[inline]
    pub fn next_header(&self) -> IpProto {
        self.next_header
    }

    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.hop_limit
    }

    #[inline]
    pub fn src_ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.src_ip)
    }

    #[inline]
    pub fn dst_ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.dst_ip)
    }

    #[inline]
    pub fn src_ip_raw(&self) -> [u8; 16] {
        self.src_ip
    }

    #[inline]
    pub fn dst_ip_raw(&self) -> [u8; 16] {
        self.dst_ip
    }
}

impl PacketHeader for Ipv6Header {
    const NAME: &'static str = "ipv6";

    #[inline]
    fn is_valid(&self) -> bool {
        self.version() == 6
    }
}

impl fmt::Display for Ipv6Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IPv6 {} -> {} next={} hlim={} len={}",
            self.src_ip(),
            self.dst_ip(),
            self.next_header(),
            self.hop_limit(),
            self.payload_length()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{DecodeError, HeaderParser};

    fn header(first: [u8; 4]) -> Vec<u8> {
        let mut h = first.to_vec();
        h.extend_from_slice(&[0x00, 0x08, 17, 255]);
        h.extend_from_slice(&"2001:db8::1".parse::<Ipv6Addr>().unwrap().octets());
        h.extend_from_slice(&"2001:db8::2".parse::<Ipv6Addr>().unwrap().octets());
        h
    }

    #[test]
    fn test_fields() {
        let bytes = header([0x6b, 0x81, 0x23, 0x45]);
        let (ip, rest) = Ipv6Header::from_bytes(&bytes).unwrap();
        assert_eq!(Ipv6Header::FIXED_LEN, 40);
        assert_eq!(ip.version(), 6);
        assert_eq!(ip.traffic_class(), 0xb8);
        assert_eq!(ip.flow_label(), 0x12345);
        assert_eq!(ip.payload_length(), 8);
        assert_eq!(ip.next_header(), IpProto::UDP);
        assert_eq!(ip.hop_limit(), 255);
        assert_eq!(ip.src_ip(), "2001:db8::1".parse::<Ipv6Addr>().unwrap());
        assert!(rest.is_empty());
        assert_eq!(ip.to_string(), "IPv6 2001:db8::1 -> 2001:db8::2 next=udp hlim=255 len=8");
    }

    #[test]
    fn test_wrong_version() {
        let bytes = header([0x40, 0, 0, 0]);
        assert_eq!(
            Ipv6Header::from_bytes(&bytes).unwrap_err(),
            DecodeError::Invalid("ipv6")
        );
    }
}
