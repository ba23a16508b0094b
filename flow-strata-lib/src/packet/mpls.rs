//! MPLS label stack entry (RFC 3032)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                Label                  | TC  |S|      TTL      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Entries repeat until one has the bottom-of-stack bit `S` set. MPLS carries
//! no payload type; the first nibble after the stack is the IP version.

use std::fmt;

use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::packet::PacketHeader;

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct MplsLabel {
    entry: U32<BigEndian>,
}

impl MplsLabel {
    const LABEL_SHIFT: u32 = 12;
    const TC_MASK: u32 = 0x0000_0e00;
    const BOS_MASK: u32 = 0x0000_0100;

    /// 20-bit label value
    #[inline]
    pub fn label(&self) -> u32 {
        self.entry.get() >> Self::LABEL_SHIFT
    }

    #[inline]
    pub fn traffic_class(&self) -> u8 {
        ((self.entry.get() & Self::TC_MASK) >> 9) as u8
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        self.entry.get() & Self::BOS_MASK != 0
    }

    #[inline]
    pub fn ttl(&self) -> u8 {
        self.entry.get() as u8
    }
}

impl PacketHeader for MplsLabel {
    const NAME: &'static str = "mpls";
}

impl fmt::Display for MplsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MPLS label={} tc={} s={} ttl={}",
            self.label(),
            self.traffic_class(),
            self.is_bottom() as u8,
            self.ttl()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::HeaderParser;

    #[test]
    fn test_label_fields() {
        // label 1000, tc 5, bottom, ttl 64
        let bytes = [0x00, 0x3e, 0x8b, 0x40];
        let (entry, rest) = MplsLabel::from_bytes(&bytes).unwrap();
        assert_eq!(entry.label(), 1000);
        assert_eq!(entry.traffic_class(), 5);
        assert!(entry.is_bottom());
        assert_eq!(entry.ttl(), 64);
        assert!(rest.is_empty());
        assert_eq!(entry.to_string(), "MPLS label=1000 tc=5 s=1 ttl=64");
    }

    #[test]
    fn test_max_label() {
        let bytes = [0xff, 0xff, 0xf0, 0xff];
        let (entry, _) = MplsLabel::from_bytes(&bytes).unwrap();
        assert_eq!(entry.label(), 0xfffff);
        assert!(!entry.is_bottom());
    }
}
