//! TCP header (RFC 793)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Source Port          |       Destination Port        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Acknowledgment Number                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Data |       |C|E|U|A|P|R|S|F|                               |
//! | Offset| Rsrvd |W|C|R|C|S|S|Y|I|            Window             |
//! |       |       |R|E|G|K|H|T|N|N|                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Checksum            |         Urgent Pointer        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ```
//! use flow_strata::packet::tcp::TcpHeader;
//! use flow_strata::packet::HeaderParser;
//!
//! let packet = [
//!     0x1f, 0x90,             // source port: 8080
//!     0x00, 0x50,             // destination port: 80
//!     0x00, 0x00, 0x00, 0x01, // sequence number
//!     0x00, 0x00, 0x00, 0x00, // acknowledgment number
//!     0x50, 0x02,             // data offset 5, SYN
//!     0xff, 0xff,             // window
//!     0x00, 0x00, 0x00, 0x00, // checksum, urgent pointer
//! ];
//!
//! let (header, payload) = TcpHeader::from_bytes(&packet).unwrap();
//! assert_eq!(header.src_port(), 8080);
//! assert!(header.is_syn());
//! assert!(!header.is_ack());
//! assert!(payload.is_empty());
//! ```

use std::fmt;

use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::packet::PacketHeader;

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct TcpHeader {
    src_port: U16<BigEndian>,
    dst_port: U16<BigEndian>,
    sequence_number: U32<BigEndian>,
    acknowledgment_number: U32<BigEndian>,
    data_offset_flags: U16<BigEndian>,
    window_size: U16<BigEndian>,
    checksum: U16<BigEndian>,
    urgent_pointer: U16<BigEndian>,
}

impl TcpHeader {
    pub const FLAG_FIN: u8 = 0x01;
    pub const FLAG_SYN: u8 = 0x02;
    pub const FLAG_RST: u8 = 0x04;
    pub const FLAG_PSH: u8 = 0x08;
    pub const FLAG_ACK: u8 = 0x10;
    pub const FLAG_URG: u8 = 0x20;
    pub const FLAG_ECE: u8 = 0x40;
    pub const FLAG_CWR: u8 = 0x80;

    /// Header length in 32-bit words
    #[inline]
    pub fn data_offset(&self) -> u8 {
        (self.data_offset_flags.get() >> 12) as u8
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.data_offset_flags.get() as u8
    }

    #[inline]
    pub fn is_fin(&self) -> bool {
        self.flags() & Self::FLAG_FIN != 0
    }

    #[inline]
    pub fn is_syn(&self) -> bool {
        self.flags() & Self::FLAG_SYN != 0
    }

    #[inline]
    pub fn is_rst(&self) -> bool {
        self.flags() & Self::FLAG_RST != 0
    }

    #[inline]
    pub fn is_ack(&self) -> bool {
        self.flags() & Self::FLAG_ACK != 0
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        self.src_port.get()
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        self.dst_port.get()
    }

    #[inline]
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number.get()
    }

    #[inline]
    pub fn acknowledgment_number(&self) -> u32 {
        self.acknowledgment_number.get()
    }

    #[inline]
    pub fn window_size(&self) -> u16 {
        self.window_size.get()
    }
}

/// `FSRPAUEC` letters of the flags in `flags`
pub fn flags_string(flags: u8) -> String {
    b"FSRPAUEC"
        .iter()
        .enumerate()
        .filter(|&(bit, _)| flags & (1 << bit) != 0)
        .map(|(_, &c)| c as char)
        .collect()
}

impl PacketHeader for TcpHeader {
    const NAME: &'static str = "tcp";

    #[inline]
    fn total_len(&self) -> usize {
        (self.data_offset() as usize) * 4
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.data_offset() >= 5
    }
}

impl fmt::Display for TcpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TCP {} -> {} [{}] seq={} ack={} win={}",
            self.src_port(),
            self.dst_port(),
            flags_string(self.flags()),
            self.sequence_number(),
            self.acknowledgment_number(),
            self.window_size()
        )
    }
}
