use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

/// Thread-local packet and flow counters
///
/// Counting happens on plain integers and is flushed to the shared [`Stats`]
/// every [`FLUSH_INTERVAL`] packets and once at the end of the capture.
#[derive(Default, Debug, Clone)]
pub struct LocalStats {
    // General statistics
    pub total_packets: u64,
    pub total_bytes: u64,

    // Decode outcomes
    pub too_short: u64,
    pub invalid: u64,
    pub unsupported: u64,
    pub unknown_link: u64,

    // Encapsulation
    pub vlan: u64,
    pub mpls: u64,

    // Network layer
    pub ipv4: u64,
    pub ipv6: u64,

    // Transport layer
    pub tcp: u64,
    pub udp: u64,
    pub icmp: u64,
    pub other_ip: u64,

    // Flow table
    pub flows_created: u64,
    pub flows_timed_out: u64,
    pub flows_evicted: u64,
    pub flows_at_shutdown: u64,
}

impl LocalStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the non-zero counters to `stats` and reset them
    #[inline]
    pub fn flush(&mut self, stats: &Stats) {
        macro_rules! flush_counter {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field > 0 {
                        stats.$field.fetch_add(self.$field, Ordering::Relaxed);
                        self.$field = 0;
                    }
                )*
            };
        }

        flush_counter!(
            total_packets,
            total_bytes,
            too_short,
            invalid,
            unsupported,
            unknown_link,
            vlan,
            mpls,
            ipv4,
            ipv6,
            tcp,
            udp,
            icmp,
            other_ip,
            flows_created,
            flows_timed_out,
            flows_evicted,
            flows_at_shutdown,
        );
    }

    /// True every `interval` packets; `interval` must be a power of 2
    #[inline]
    pub fn should_flush(&self, interval: u64) -> bool {
        self.total_packets & (interval - 1) == 0
    }
}

/// Flush interval for local stats (must be power of 2)
pub const FLUSH_INTERVAL: u64 = 1024;

#[derive(Default, Debug)]
pub struct Stats {
    pub total_packets: AtomicU64,
    pub total_bytes: AtomicU64,

    pub too_short: AtomicU64,
    pub invalid: AtomicU64,
    pub unsupported: AtomicU64,
    pub unknown_link: AtomicU64,

    pub vlan: AtomicU64,
    pub mpls: AtomicU64,

    pub ipv4: AtomicU64,
    pub ipv6: AtomicU64,

    pub tcp: AtomicU64,
    pub udp: AtomicU64,
    pub icmp: AtomicU64,
    pub other_ip: AtomicU64,

    pub flows_created: AtomicU64,
    pub flows_timed_out: AtomicU64,
    pub flows_evicted: AtomicU64,
    pub flows_at_shutdown: AtomicU64,
}

impl Stats {
    #[inline]
    pub fn get(&self, counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.get(&self.too_short)
            + self.get(&self.invalid)
            + self.get(&self.unsupported)
            + self.get(&self.unknown_link)
    }

    /// Flows still open; zero once the table has been flushed at shutdown
    pub fn active_flows(&self) -> u64 {
        self.get(&self.flows_created).saturating_sub(
            self.get(&self.flows_timed_out)
                + self.get(&self.flows_evicted)
                + self.get(&self.flows_at_shutdown),
        )
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flow Statistics ===")?;
        writeln!(f)?;

        writeln!(f, "--- General ---")?;
        writeln!(f, "Total packets processed: {}", self.get(&self.total_packets))?;
        writeln!(f, "Total bytes processed: {}", self.get(&self.total_bytes))?;
        writeln!(f)?;

        writeln!(f, "--- Skipped ---")?;
        writeln!(f, "Total skipped: {}", self.total_errors())?;
        writeln!(f, "  Too short: {}", self.get(&self.too_short))?;
        writeln!(f, "  Invalid: {}", self.get(&self.invalid))?;
        writeln!(f, "  Unsupported: {}", self.get(&self.unsupported))?;
        writeln!(f, "  Unknown link type: {}", self.get(&self.unknown_link))?;
        writeln!(f)?;

        writeln!(f, "--- Encapsulation ---")?;
        writeln!(f, "VLAN tagged: {}", self.get(&self.vlan))?;
        writeln!(f, "MPLS labelled: {}", self.get(&self.mpls))?;
        writeln!(f)?;

        writeln!(f, "--- Network Layer ---")?;
        writeln!(f, "IPv4: {}", self.get(&self.ipv4))?;
        writeln!(f, "IPv6: {}", self.get(&self.ipv6))?;
        writeln!(f)?;

        writeln!(f, "--- Transport Layer ---")?;
        writeln!(f, "TCP: {}", self.get(&self.tcp))?;
        writeln!(f, "UDP: {}", self.get(&self.udp))?;
        writeln!(f, "ICMP/ICMPv6: {}", self.get(&self.icmp))?;
        writeln!(f, "Other IP: {}", self.get(&self.other_ip))?;
        writeln!(f)?;

        writeln!(f, "--- Flows ---")?;
        writeln!(f, "Created: {}", self.get(&self.flows_created))?;
        writeln!(f, "Timed out: {}", self.get(&self.flows_timed_out))?;
        writeln!(f, "Evicted (table full): {}", self.get(&self.flows_evicted))?;
        writeln!(f, "Closed at shutdown: {}", self.get(&self.flows_at_shutdown))?;
        if self.active_flows() > 0 {
            writeln!(f, "Still active: {}", self.active_flows())?;
        }

        Ok(())
    }
}
