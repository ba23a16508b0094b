//! Canonical bidirectional flow keys
//!
//! Both directions of a conversation map to one fixed-layout [`FlowKey`], which
//! hashes with a fast unseeded digest and compares field by field. Around the
//! key sit a minimal zero-copy packet front-end and an LRU flow table.

#[macro_use]
mod macros;

pub mod addr;
pub mod compare;
pub mod config;
pub mod hash;
pub mod key;
pub mod packet;
pub mod timestamp;
pub mod tracker;

pub use addr::IpAddress;
pub use compare::equal;
pub use config::{ConfigError, KeyConfig};
pub use hash::{hash, KeyHashBuilder};
pub use key::{DatagramInput, FlowKey, FlowKeyBuilder, KeyInput, PktType};
pub use packet::{decode, DecodeError, LinkType, PacketInfo};
pub use timestamp::{Interval, Timestamp};
pub use tracker::FlowTable;
