//! UDP header (RFC 768)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Source Port          |       Destination Port        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |            Length             |           Checksum            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::fmt;

use zerocopy::byteorder::{BigEndian, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::packet::PacketHeader;

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct UdpHeader {
    src_port: U16<BigEndian>,
    dst_port: U16<BigEndian>,
    length: U16<BigEndian>,
    checksum: U16<BigEndian>,
}

impl UdpHeader {
    #[inline]
    pub fn src_port(&self) -> u16 {
        self.src_port.get()
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        self.dst_port.get()
    }

    /// Header plus data
    #[inline]
    pub fn length(&self) -> u16 {
        self.length.get()
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        self.checksum.get()
    }
}

impl PacketHeader for UdpHeader {
    const NAME: &'static str = "udp";

    // A zero length is accepted: jumbograms and some offloaded captures carry it.
    #[inline]
    fn is_valid(&self) -> bool {
        self.length() == 0 || self.length() as usize >= Self::FIXED_LEN
    }
}

impl fmt::Display for UdpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UDP {} -> {} len={}", self.src_port(), self.dst_port(), self.length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{DecodeError, HeaderParser};

    #[test]
    fn test_udp_header_basic() {
        let bytes = [0x00, 0x35, 0x30, 0x39, 0x00, 0x0a, 0x12, 0x34, 0xde, 0xad];
        let (udp, payload) = UdpHeader::from_bytes(&bytes).unwrap();
        assert_eq!(udp.src_port(), 53);
        assert_eq!(udp.dst_port(), 12345);
        assert_eq!(udp.length(), 10);
        assert_eq!(udp.checksum(), 0x1234);
        assert_eq!(payload, &[0xde, 0xad]);
        assert_eq!(udp.to_string(), "UDP 53 -> 12345 len=10");
    }

    #[test]
    fn test_bad_length() {
        let bytes = [0x00, 0x35, 0x30, 0x39, 0x00, 0x04, 0x00, 0x00];
        assert_eq!(
            UdpHeader::from_bytes(&bytes).unwrap_err(),
            DecodeError::Invalid("udp")
        );
    }
}
