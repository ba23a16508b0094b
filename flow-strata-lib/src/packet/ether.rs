//! Ethernet II header and 802.1Q/802.1ad tags
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Destination MAC Address                    |
//! +                               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                               |                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
//! |                      Source MAC Address                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           EtherType           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! A VLAN tag follows when the EtherType is one of the VLAN TPIDs; tags may
//! stack (QinQ):
//!
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | PCP |D|        VLAN ID        |       Inner EtherType         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ```
//! use flow_strata::packet::ether::EtherHeader;
//! use flow_strata::packet::protocol::EtherProto;
//! use flow_strata::packet::HeaderParser;
//!
//! let packet = [
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // destination: broadcast
//!     0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // source
//!     0x08, 0x00,                         // IPv4
//! ];
//!
//! let (header, payload) = EtherHeader::from_bytes(&packet).unwrap();
//! assert_eq!(header.proto(), EtherProto::IPV4);
//! assert_eq!(header.source().to_string(), "00:11:22:33:44:55");
//! assert!(payload.is_empty());
//! ```

use std::fmt;

use zerocopy::{BigEndian, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, U16};

use crate::packet::protocol::EtherProto;
use crate::packet::PacketHeader;

const ETH_ALEN: usize = 6;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout,
)]
#[repr(transparent)]
pub struct EthAddr([u8; ETH_ALEN]);

impl EthAddr {
    #[inline]
    pub fn octets(&self) -> [u8; ETH_ALEN] {
        self.0
    }
}

impl fmt::Display for EthAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct EtherHeader {
    dest: EthAddr,
    source: EthAddr,
    proto: EtherProto,
}

impl EtherHeader {
    #[inline]
    pub fn dest(&self) -> EthAddr {
        self.dest
    }

    #[inline]
    pub fn source(&self) -> EthAddr {
        self.source
    }

    #[inline]
    pub fn proto(&self) -> EtherProto {
        self.proto
    }
}

impl PacketHeader for EtherHeader {
    const NAME: &'static str = "ethernet";
}

impl fmt::Display for EtherHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ethernet {} -> {} proto={}", self.source(), self.dest(), self.proto())
    }
}

/// 802.1Q / 802.1ad tag
#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct VlanTag {
    tci: U16<BigEndian>,
    proto: EtherProto,
}

impl VlanTag {
    #[inline]
    pub fn vlan_id(&self) -> u16 {
        self.tci.get() & 0x0fff
    }

    #[inline]
    pub fn pcp(&self) -> u8 {
        (self.tci.get() >> 13) as u8
    }

    #[inline]
    pub fn dei(&self) -> bool {
        self.tci.get() & 0x1000 != 0
    }

    /// EtherType of what follows the tag
    #[inline]
    pub fn proto(&self) -> EtherProto {
        self.proto
    }
}

impl PacketHeader for VlanTag {
    const NAME: &'static str = "vlan";
}
