//! Address family tagging and normalization
//!
//! Flow keys store every address in a 16-byte slot. IPv4 addresses are stored
//! IPv4-mapped (`::ffff:a.b.c.d`) so that both families share one binary layout
//! and the key can be hashed and compared without knowing the family.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of a normalized address slot.
pub const ADDR_SLOT_LEN: usize = 16;

/// IP address tagged with its family
///
/// Uses byte arrays in network byte order for cheap copies and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpAddress {
    /// IPv4 address (4 bytes, network byte order)
    V4([u8; 4]),
    /// IPv6 address (16 bytes, network byte order)
    V6([u8; 16]),
}

impl IpAddress {
    #[inline]
    pub const fn is_ipv4(&self) -> bool {
        matches!(self, IpAddress::V4(_))
    }

    #[inline]
    pub const fn is_ipv6(&self) -> bool {
        matches!(self, IpAddress::V6(_))
    }

    /// Returns the 16-byte slot representation (IPv4-mapped for v4).
    #[inline]
    pub const fn to_mapped(&self) -> [u8; ADDR_SLOT_LEN] {
        match *self {
            IpAddress::V4([a, b, c, d]) => [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, a, b, c, d],
            IpAddress::V6(bytes) => bytes,
        }
    }

    /// Rebuilds an address from a slot. `ipv4` selects how the slot is read.
    #[inline]
    pub const fn from_mapped(slot: [u8; ADDR_SLOT_LEN], ipv4: bool) -> Self {
        if ipv4 {
            IpAddress::V4([slot[12], slot[13], slot[14], slot[15]])
        } else {
            IpAddress::V6(slot)
        }
    }

    /// Numeric (host order) value of an IPv4 address.
    #[inline]
    pub const fn ipv4_value(&self) -> Option<u32> {
        match *self {
            IpAddress::V4(octets) => Some(u32::from_be_bytes(octets)),
            IpAddress::V6(_) => None,
        }
    }

    /// RFC 1918 private ranges: 10/8, 172.16/12 and 192.168/16.
    ///
    /// IPv6 addresses are never private in this sense.
    #[inline]
    pub const fn is_private(&self) -> bool {
        match *self {
            IpAddress::V4([10, ..]) => true,
            IpAddress::V4([172, b, ..]) => b & 0xf0 == 16,
            IpAddress::V4([192, 168, ..]) => true,
            _ => false,
        }
    }
}

impl Default for IpAddress {
    fn default() -> Self {
        IpAddress::V4([0; 4])
    }
}

impl From<Ipv4Addr> for IpAddress {
    fn from(addr: Ipv4Addr) -> Self {
        IpAddress::V4(addr.octets())
    }
}

impl From<Ipv6Addr> for IpAddress {
    fn from(addr: Ipv6Addr) -> Self {
        IpAddress::V6(addr.octets())
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl From<IpAddress> for IpAddr {
    fn from(addr: IpAddress) -> Self {
        match addr {
            IpAddress::V4(octets) => IpAddr::V4(Ipv4Addr::from(octets)),
            IpAddress::V6(bytes) => IpAddr::V6(Ipv6Addr::from(bytes)),
        }
    }
}

impl FromStr for IpAddress {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpAddr>().map(Into::into)
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&IpAddr::from(*self), f)
    }
}

impl Serialize for IpAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IpAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
