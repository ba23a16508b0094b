use clap::Parser;
use flow_strata::{Interval, KeyConfig, LinkType};
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::*;
use std::fs::File;
use std::io::{self, BufWriter, Stdout};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

mod error;
mod packet_metadata;
mod process;
mod stats;

use error::ReaderError;
use process::{FlowProcessor, Settings};

#[derive(Parser, Debug)]
#[command(name = "pcap-flows")]
#[command(about = "Aggregate the packets of a capture into bidirectional flows", long_about = None)]
struct Args {
    /// Path to the PCAP or PCAPNG file to read
    #[arg(short, long, value_name = "FILE")]
    pcap: PathBuf,

    /// JSON file with the flow key toggles
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ignore VLAN ids when building flow keys
    #[arg(long)]
    vlan_agnostic: bool,

    /// Ignore the address space id when building flow keys
    #[arg(long)]
    address_space_agnostic: bool,

    /// Keep MPLS labels in flow keys to separate overlapping private ranges
    #[arg(long)]
    mpls_overlapping_ip: bool,

    /// Address space id stamped on every packet of this capture
    #[arg(long, default_value_t = 0)]
    address_space: u16,

    /// Close flows idle for longer than this many seconds of capture time (0: never)
    #[arg(short, long, default_value_t = 60)]
    idle_timeout: u64,

    /// Evict the least recently seen flow beyond this many flows (0: unbounded)
    #[arg(short, long, default_value_t = 1_000_000)]
    max_flows: usize,

    /// Print every closed flow as a JSON line
    #[arg(short, long)]
    dump_flows: bool,

    /// print statistics at the end
    #[arg(short, long)]
    stats: bool,
}

impl Args {
    /// Config file first, then the command line flags on top
    fn settings(&self) -> Result<Settings, ReaderError> {
        let mut config = match &self.config {
            Some(path) => KeyConfig::from_path(path)?,
            None => KeyConfig::default(),
        };
        config.vlan_agnostic |= self.vlan_agnostic;
        config.address_space_agnostic |= self.address_space_agnostic;
        config.mpls_overlapping_ip |= self.mpls_overlapping_ip;

        Ok(Settings {
            config,
            address_space_id: self.address_space,
            idle_timeout: (self.idle_timeout > 0).then(|| Interval::from_secs(self.idle_timeout)),
            max_flows: (self.max_flows > 0).then_some(self.max_flows),
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let stats = stats::Stats::default();

    info!("Reading PCAP file: {:?}", args.pcap);
    if let Err(e) = run(&args, &stats) {
        error!("Failed to process PCAP file: {}", e);
        std::process::exit(1);
    }
    if args.stats {
        println!("{stats}");
    }
    info!("PCAP processing completed!");
}

fn run(args: &Args, stats: &stats::Stats) -> Result<(), ReaderError> {
    let settings = args.settings()?;
    debug!("flow settings: {settings:?}");

    let sink = args.dump_flows.then(|| BufWriter::new(io::stdout()));
    let mut processor = FlowProcessor::new(settings, sink);

    let start = std::time::Instant::now();
    process_pcap(&args.pcap, &mut processor, stats)?;
    processor.finish(stats)?;

    let elapsed = start.elapsed().as_secs_f64();
    let packets = stats.get(&stats.total_packets);
    info!(
        "Total packets processed: {}, {} flows, {:.3}M pkt/sec",
        packets,
        stats.get(&stats.flows_created),
        (packets as f64 / elapsed) / 1_000_000.0,
    );
    Ok(())
}

/// Map a capture link type onto what the decoder understands
fn link_type(linktype: Linktype) -> Option<LinkType> {
    match linktype.0 {
        1 => Some(LinkType::Ethernet),
        // LINKTYPE_RAW, LINKTYPE_IPV4, LINKTYPE_IPV6
        101 | 228 | 229 => Some(LinkType::RawIp),
        other => {
            warn!("unsupported link type {other}, its packets are skipped");
            None
        }
    }
}

fn open(path: &Path) -> Result<File, ReaderError> {
    File::open(path).map_err(|source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Feed every packet of the capture to `processor`
fn process_pcap(
    pcap_path: &Path,
    processor: &mut FlowProcessor<BufWriter<Stdout>>,
    stats: &stats::Stats,
) -> Result<(), ReaderError> {
    let file = open(pcap_path)?;

    // Try to create a PCAPNG reader first
    match PcapNGReader::new(65536, file) {
        Ok(mut reader) => {
            info!("Detected PCAPNG format");
            loop {
                match reader.next() {
                    Ok((offset, block)) => {
                        match block {
                            PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                                processor.process_packet(&epb, stats)?;
                            }
                            PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                                processor.process_packet(&spb, stats)?;
                            }
                            PcapBlockOwned::NG(Block::SectionHeader(_shb)) => {
                                debug!("PCAPNG Section Header found");
                                processor.clear_interfaces();
                            }
                            PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                                debug!("PCAPNG Interface Description, link type {}", idb.linktype.0);
                                processor.add_interface(link_type(idb.linktype));
                            }
                            _ => {}
                        }
                        reader.consume(offset);
                    }
                    Err(PcapError::Eof) => break,
                    Err(PcapError::Incomplete(_)) => {
                        reader
                            .refill()
                            .map_err(|e| ReaderError::pcap("Error reading PCAPNG", e))?;
                    }
                    Err(e) => return Err(ReaderError::pcap("Error reading PCAPNG", e)),
                }
            }
        }
        Err(_) => {
            let file = open(pcap_path)?;

            // Try legacy PCAP format
            let mut reader = LegacyPcapReader::new(65536, file)
                .map_err(|e| ReaderError::pcap("Failed to create PCAP reader", e))?;

            loop {
                match reader.next() {
                    Ok((offset, block)) => {
                        match block {
                            PcapBlockOwned::Legacy(packet) => {
                                processor.process_packet(&packet, stats)?;
                            }
                            PcapBlockOwned::LegacyHeader(header) => {
                                debug!("Legacy PCAP header, link type {}", header.network.0);
                                processor.clear_interfaces();
                                processor.add_interface(link_type(header.network));
                            }
                            _ => {}
                        }
                        reader.consume(offset);
                    }
                    Err(PcapError::Eof) => break,
                    Err(PcapError::Incomplete(_)) => {
                        reader
                            .refill()
                            .map_err(|e| ReaderError::pcap("Error reading PCAP", e))?;
                    }
                    Err(e) => return Err(ReaderError::pcap("Error reading PCAP", e)),
                }
            }
        }
    }

    Ok(())
}
