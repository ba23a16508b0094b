use std::io::Write;

use flow_strata::tracker::flow::{Flow, Termination};
use flow_strata::{
    decode, DecodeError, FlowKeyBuilder, FlowTable, Interval, KeyConfig, LinkType, PacketInfo,
    PktType, Timestamp,
};
use tracing::{debug, trace};

use crate::error::ReaderError;
use crate::packet_metadata::PacketMetadata;
use crate::stats::{LocalStats, Stats, FLUSH_INTERVAL};

/// Flow tracking knobs, resolved from the command line and config file
#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    pub config: KeyConfig,
    pub address_space_id: u16,
    /// `None` keeps idle flows until shutdown
    pub idle_timeout: Option<Interval>,
    /// `None` leaves the table unbounded
    pub max_flows: Option<usize>,
}

/// Aggregates decoded packets into bidirectional flows.
///
/// Closed flows are written as JSON lines to `sink` when one is set.
pub struct FlowProcessor<W> {
    settings: Settings,
    table: FlowTable<Flow<()>>,
    interfaces: Vec<Option<LinkType>>,
    sink: Option<W>,
    local_stats: LocalStats,
}

impl<W: Write> FlowProcessor<W> {
    pub fn new(settings: Settings, sink: Option<W>) -> Self {
        Self {
            settings,
            table: FlowTable::new(),
            interfaces: Vec::new(),
            sink,
            local_stats: LocalStats::new(),
        }
    }

    /// Forget the interfaces of the previous capture section
    pub fn clear_interfaces(&mut self) {
        self.interfaces.clear();
    }

    /// Register the next capture interface; `None` marks an undecodable link
    pub fn add_interface(&mut self, link: Option<LinkType>) {
        self.interfaces.push(link);
    }

    #[inline]
    pub fn active_flows(&self) -> usize {
        self.table.len()
    }

    pub fn process_packet<Pkt: PacketMetadata>(
        &mut self,
        pkt: &Pkt,
        stats: &Stats,
    ) -> Result<(), ReaderError> {
        self.local_stats.total_packets += 1;
        self.local_stats.total_bytes += pkt.caplen() as u64;

        let result = self.track(pkt);

        if self.local_stats.should_flush(FLUSH_INTERVAL) {
            self.local_stats.flush(stats);
        }
        result
    }

    fn track<Pkt: PacketMetadata>(&mut self, pkt: &Pkt) -> Result<(), ReaderError> {
        let Some(link) = self.interfaces.get(pkt.interface()).copied().flatten() else {
            self.local_stats.unknown_link += 1;
            return Ok(());
        };

        let ts = pkt.timestamp();
        self.expire_idle(ts)?;

        let info = match decode(pkt.data(), link) {
            Ok(info) => info,
            Err(err) => {
                trace!("packet {} skipped: {err}", self.local_stats.total_packets);
                match err {
                    DecodeError::TooShort(_) => self.local_stats.too_short += 1,
                    DecodeError::Invalid(_) => self.local_stats.invalid += 1,
                    DecodeError::Unsupported(_) => self.local_stats.unsupported += 1,
                }
                return Ok(());
            }
        };
        self.count(&info);

        let builder = FlowKeyBuilder::new(&self.settings.config);
        let (key, reversed) = builder.session(&info.key_input(self.settings.address_space_id));

        let mut created = false;
        let flow = self.table.get_or_insert_with(key, || {
            created = true;
            Flow::new(ts, key, reversed, &info)
        });
        flow.update(ts, pkt.origlen() as usize, &info, reversed);

        if created {
            debug!("new flow {key}");
            self.local_stats.flows_created += 1;
            self.enforce_capacity()?;
        }
        Ok(())
    }

    fn count(&mut self, info: &PacketInfo) {
        let local = &mut self.local_stats;
        if info.vlan_id != 0 {
            local.vlan += 1;
        }
        if info.mpls_label != 0 {
            local.mpls += 1;
        }

        if info.src.is_ipv4() {
            local.ipv4 += 1;
        } else {
            local.ipv6 += 1;
        }

        match info.pkt_type {
            PktType::Tcp => local.tcp += 1,
            PktType::Udp => local.udp += 1,
            PktType::Icmp => local.icmp += 1,
            _ => local.other_ip += 1,
        }
    }

    /// Close flows that have been silent for longer than the idle timeout
    fn expire_idle(&mut self, now: Timestamp) -> Result<(), ReaderError> {
        let Some(timeout) = self.settings.idle_timeout else {
            return Ok(());
        };

        let sink = &mut self.sink;
        let mut result = Ok(());
        let expired = self.table.process_and_evict(|_, flow| {
            if !flow.is_idle(now, timeout) {
                return false;
            }
            debug!("flow timed out: {flow}");
            if result.is_ok() {
                if let Some(out) = sink.as_mut() {
                    result = write_record(out, flow.clone(), Termination::Timeout);
                }
            }
            true
        });

        self.local_stats.flows_timed_out += expired as u64;
        result
    }

    /// Drop the least recently seen flows while the table is over capacity
    fn enforce_capacity(&mut self) -> Result<(), ReaderError> {
        let Some(max_flows) = self.settings.max_flows else {
            return Ok(());
        };

        while self.table.len() > max_flows {
            let Some((_, flow)) = self.table.pop_front() else {
                break;
            };
            debug!("flow evicted: {flow}");
            self.local_stats.flows_evicted += 1;
            if let Some(out) = self.sink.as_mut() {
                write_record(out, flow, Termination::Eviction)?;
            }
        }
        Ok(())
    }

    /// Close every remaining flow and publish the last counters
    pub fn finish(&mut self, stats: &Stats) -> Result<(), ReaderError> {
        while let Some((_, flow)) = self.table.pop_front() {
            self.local_stats.flows_at_shutdown += 1;
            if let Some(out) = self.sink.as_mut() {
                write_record(out, flow, Termination::MonitorShutdown)?;
            }
        }

        if let Some(out) = self.sink.as_mut() {
            out.flush()?;
        }
        self.local_stats.flush(stats);
        Ok(())
    }

    #[cfg(test)]
    fn sink(&self) -> Option<&W> {
        self.sink.as_ref()
    }
}

fn write_record<W: Write>(
    out: &mut W,
    mut flow: Flow<()>,
    reason: Termination,
) -> Result<(), ReaderError> {
    flow.terminate(reason);
    serde_json::to_writer(&mut *out, &flow)?;
    writeln!(out)?;
    Ok(())
}
