//! ICMP and ICMPv6 message types and the fixed part of their header
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Type      |     Code      |          Checksum             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The flow front-end carries the type in the source port slot and the code
//! in the destination port slot, which is what the key builder's echo pairing
//! expects.

use std::fmt;

use zerocopy::byteorder::{BigEndian, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::packet::PacketHeader;

/// ICMP message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IcmpType(pub u8);

impl IcmpType {
    pub const ECHO_REPLY: IcmpType = IcmpType(0);
    pub const DEST_UNREACH: IcmpType = IcmpType(3);
    pub const REDIRECT: IcmpType = IcmpType(5);
    pub const ECHO: IcmpType = IcmpType(8);
    pub const TIME_EXCEEDED: IcmpType = IcmpType(11);
    pub const TIMESTAMP: IcmpType = IcmpType(13);
    pub const TIMESTAMP_REPLY: IcmpType = IcmpType(14);
}

impl fmt::Display for IcmpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            IcmpType::ECHO_REPLY => "echo-reply",
            IcmpType::DEST_UNREACH => "dest-unreachable",
            IcmpType::REDIRECT => "redirect",
            IcmpType::ECHO => "echo-request",
            IcmpType::TIME_EXCEEDED => "time-exceeded",
            IcmpType::TIMESTAMP => "timestamp",
            IcmpType::TIMESTAMP_REPLY => "timestamp-reply",
            _ => return write!(f, "icmp-{}", self.0),
        };
        f.write_str(s)
    }
}

/// ICMPv6 message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Icmp6Type(pub u8);

impl Icmp6Type {
    pub const DST_UNREACH: Icmp6Type = Icmp6Type(1);
    pub const PACKET_TOO_BIG: Icmp6Type = Icmp6Type(2);
    pub const TIME_EXCEEDED: Icmp6Type = Icmp6Type(3);
    pub const ECHO_REQUEST: Icmp6Type = Icmp6Type(128);
    pub const ECHO_REPLY: Icmp6Type = Icmp6Type(129);
    pub const NEIGHBOR_SOLICITATION: Icmp6Type = Icmp6Type(135);
    pub const NEIGHBOR_ADVERTISEMENT: Icmp6Type = Icmp6Type(136);
}

impl fmt::Display for Icmp6Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Icmp6Type::DST_UNREACH => "dest-unreachable",
            Icmp6Type::PACKET_TOO_BIG => "packet-too-big",
            Icmp6Type::TIME_EXCEEDED => "time-exceeded",
            Icmp6Type::ECHO_REQUEST => "echo-request",
            Icmp6Type::ECHO_REPLY => "echo-reply",
            Icmp6Type::NEIGHBOR_SOLICITATION => "neighbor-solicitation",
            Icmp6Type::NEIGHBOR_ADVERTISEMENT => "neighbor-advertisement",
            _ => return write!(f, "icmp6-{}", self.0),
        };
        f.write_str(s)
    }
}

/// Type, code and checksum shared by ICMP and ICMPv6
#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct IcmpHeader {
    icmp_type: u8,
    code: u8,
    checksum: U16<BigEndian>,
}

impl IcmpHeader {
    #[inline]
    pub fn icmp_type(&self) -> u8 {
        self.icmp_type
    }

    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        self.checksum.get()
    }
}

impl PacketHeader for IcmpHeader {
    const NAME: &'static str = "icmp";
}
