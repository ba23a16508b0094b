use std::cmp::min;

use flow_strata::Timestamp;
use pcap_parser::{EnhancedPacketBlock, LegacyPcapBlock, SimplePacketBlock};

/// Capture record fields needed to account one packet
pub trait PacketMetadata {
    fn caplen(&self) -> u32;
    fn origlen(&self) -> u32;
    fn data(&self) -> &[u8];
    fn timestamp(&self) -> Timestamp;

    /// Index of the capture interface, 0 for single-interface formats
    #[inline]
    fn interface(&self) -> usize {
        0
    }
}

impl PacketMetadata for LegacyPcapBlock<'_> {
    #[inline]
    fn timestamp(&self) -> Timestamp {
        Timestamp::from_micros_parts(self.ts_sec, self.ts_usec)
    }

    #[inline]
    fn caplen(&self) -> u32 {
        self.caplen
    }

    #[inline]
    fn origlen(&self) -> u32 {
        self.origlen
    }

    #[inline]
    fn data(&self) -> &[u8] {
        self.data
    }
}

impl PacketMetadata for EnhancedPacketBlock<'_> {
    #[inline]
    fn timestamp(&self) -> Timestamp {
        let raw_ts = ((self.ts_high as u64) << 32) | (self.ts_low as u64);
        ng_timestamp(raw_ts)
    }

    #[inline]
    fn caplen(&self) -> u32 {
        self.caplen
    }

    #[inline]
    fn origlen(&self) -> u32 {
        self.origlen
    }

    #[inline]
    fn data(&self) -> &[u8] {
        self.data
    }

    #[inline]
    fn interface(&self) -> usize {
        self.if_id as usize
    }
}

impl PacketMetadata for SimplePacketBlock<'_> {
    /// Simple packet blocks carry no timestamp; they never age a flow.
    #[inline]
    fn timestamp(&self) -> Timestamp {
        Timestamp::ZERO
    }

    #[inline]
    fn caplen(&self) -> u32 {
        min(self.origlen, self.data.len() as u32)
    }

    #[inline]
    fn origlen(&self) -> u32 {
        self.origlen
    }

    #[inline]
    fn data(&self) -> &[u8] {
        self.data
    }
}

/// Guess the resolution of a pcapng timestamp when the interface options are
/// not consulted.
///
/// Read as nanoseconds, a plausible capture lands between 1973
/// (100_000_000 s) and 2096 (4_000_000_000 s). Anything else is taken as the
/// default microsecond resolution.
fn ng_timestamp(raw_ts: u64) -> Timestamp {
    let maybe_secs = raw_ts / 1_000_000_000;
    if (100_000_000..=4_000_000_000).contains(&maybe_secs) {
        Timestamp::from_nanos(raw_ts)
    } else {
        Timestamp::from_nanos(raw_ts.saturating_mul(1_000))
    }
}
