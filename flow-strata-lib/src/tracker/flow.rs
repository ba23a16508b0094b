use std::fmt::{self, Display};

use serde::{Deserialize, Serialize, Serializer};

use crate::{
    addr::IpAddress,
    key::{FlowKey, PktType},
    packet::PacketInfo,
    timestamp::{Interval, Timestamp},
    tracker::{direction::PacketDirection, Trackable},
};

/// Why a flow left the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Idle for longer than the configured timeout.
    Timeout,

    /// Forced out of a full table to make room.
    Eviction,

    /// The monitor is shutting down and flushing state.
    MonitorShutdown,
}

impl Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Timeout => write!(f, "timeout"),
            Termination::Eviction => write!(f, "eviction"),
            Termination::MonitorShutdown => write!(f, "monitor-shutdown"),
        }
    }
}

/// One side of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    pub addr: IpAddress,
    pub port: u16,
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr {
            IpAddress::V4(_) => write!(f, "{}:{}", self.addr, self.port),
            IpAddress::V6(_) => write!(f, "[{}]:{}", self.addr, self.port),
        }
    }
}

/// Per-flow user state, updated after the flow counters.
pub trait Process {
    fn process(&mut self, ts: Timestamp, info: &PacketInfo, dir: PacketDirection);
}

impl Process for () {
    #[inline(always)]
    fn process(&mut self, _ts: Timestamp, _info: &PacketInfo, _dir: PacketDirection) {}
}

fn key_as_string<S: Serializer>(key: &FlowKey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

#[derive(Debug, Clone, Serialize)]
pub struct Flow<D> {
    /// Canonical key the flow is stored under.
    #[serde(serialize_with = "key_as_string")]
    pub key: FlowKey,

    /// Timestamp of the first packet in the flow.
    pub start_ts: Timestamp,

    /// Timestamp of the last packet in the flow.
    pub last_ts: Timestamp,

    /// Source of the first packet.
    pub client: Endpoint,

    /// Destination of the first packet.
    pub server: Endpoint,

    pub pkt_type: PktType,

    /// `reversed` flag of the first packet; later packets with the same flag
    /// travel upwards.
    #[serde(skip)]
    pub initiator_reversed: bool,

    /// Set once the flow leaves the table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,

    /// Union of the TCP flags seen upwards.
    pub u_tcp_flags: u8,

    /// Union of the TCP flags seen downwards.
    pub d_tcp_flags: u8,

    /// Total uplink bytes on the wire.
    pub u_bytes: usize,

    /// Total downlink bytes on the wire.
    pub d_bytes: usize,

    pub u_payload_bytes: usize,
    pub d_payload_bytes: usize,

    pub u_pkts: u64,
    pub d_pkts: u64,

    /// Custom data associated with the flow.
    pub data: D,
}

impl<D: Default> Flow<D> {
    /// Empty flow opened by `info`; counters start at zero and the opening
    /// packet is applied with [`Flow::update`].
    pub fn new(ts: Timestamp, key: FlowKey, reversed: bool, info: &PacketInfo) -> Self {
        Self {
            key,
            start_ts: ts,
            last_ts: ts,
            client: Endpoint {
                addr: info.src,
                port: info.src_port,
            },
            server: Endpoint {
                addr: info.dst,
                port: info.dst_port,
            },
            pkt_type: info.pkt_type,
            initiator_reversed: reversed,
            termination: None,
            u_tcp_flags: 0,
            d_tcp_flags: 0,
            u_bytes: 0,
            d_bytes: 0,
            u_payload_bytes: 0,
            d_payload_bytes: 0,
            u_pkts: 0,
            d_pkts: 0,
            data: D::default(),
        }
    }
}

impl<D> Flow<D> {
    #[inline]
    pub fn direction(&self, reversed: bool) -> PacketDirection {
        PacketDirection::from_reversed(reversed, self.initiator_reversed)
    }

    #[inline]
    pub fn packets(&self) -> u64 {
        self.u_pkts.saturating_add(self.d_pkts)
    }

    #[inline]
    pub fn bytes(&self) -> usize {
        self.u_bytes.saturating_add(self.d_bytes)
    }

    #[inline]
    pub fn duration(&self) -> Interval {
        self.last_ts - self.start_ts
    }

    /// True when nothing was seen for longer than `timeout` before `now`.
    #[inline]
    pub fn is_idle(&self, now: Timestamp, timeout: Interval) -> bool {
        now - self.last_ts > timeout
    }

    #[inline]
    pub fn terminate(&mut self, reason: Termination) {
        self.termination.get_or_insert(reason);
    }
}

impl<D: Process> Flow<D> {
    /// Account one packet of `wire_len` bytes and return its direction.
    pub fn update(
        &mut self,
        ts: Timestamp,
        wire_len: usize,
        info: &PacketInfo,
        reversed: bool,
    ) -> PacketDirection {
        let dir = self.direction(reversed);
        if ts > self.last_ts {
            self.last_ts = ts;
        }

        match dir {
            PacketDirection::Upwards => {
                self.u_pkts = self.u_pkts.saturating_add(1);
                self.u_bytes = self.u_bytes.saturating_add(wire_len);
                self.u_payload_bytes = self.u_payload_bytes.saturating_add(info.payload_len);
                self.u_tcp_flags |= info.tcp_flags;
            }
            PacketDirection::Downwards => {
                self.d_pkts = self.d_pkts.saturating_add(1);
                self.d_bytes = self.d_bytes.saturating_add(wire_len);
                self.d_payload_bytes = self.d_payload_bytes.saturating_add(info.payload_len);
                self.d_tcp_flags |= info.tcp_flags;
            }
        }

        self.data.process(ts, info, dir);
        dir
    }
}

impl<D> Trackable for Flow<D> {
    type Timestamp = Timestamp;

    fn timestamp(&self) -> Timestamp {
        self.last_ts
    }
}

impl<D> Display for Flow<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} up={}/{} down={}/{} dur={}",
            self.pkt_type,
            self.client,
            self.server,
            self.u_pkts,
            self.u_bytes,
            self.d_pkts,
            self.d_bytes,
            self.duration()
        )?;
        if let Some(reason) = self.termination {
            write!(f, " [{reason}]")?;
        }
        Ok(())
    }
}
