//! Canonical flow keys
//!
//! A [`FlowKey`] identifies one conversation regardless of which direction a
//! packet travels. The builder normalizes the endpoint pair so that the lower
//! address (or, for equal addresses, the lower port) always lands in the
//! `low` slot, and reports through the returned `reversed` flag whether the
//! caller's source ended up in the `high` slot.
//!
//! # Layout
//!
//! The key is a 48-byte `#[repr(C)]` value without padding. The hasher reads it
//! as twelve 32-bit words and the comparator checks every field, so every byte
//! of the layout takes part in flow identity.
//!
//! ```text
//!  0        16        32   34   36   38  39  40      44   46   48
//!  +--------+---------+----+----+----+---+---+-------+----+----+
//!  | ip_low | ip_high | pl | ph |vlan|typ|ver| mpls  | as |pad |
//!  +--------+---------+----+----+----+---+---+-------+----+----+
//! ```
//!
//! # Example
//!
//! ```
//! use flow_strata::addr::IpAddress;
//! use flow_strata::config::KeyConfig;
//! use flow_strata::key::{FlowKeyBuilder, KeyInput, PktType};
//! use flow_strata::packet::protocol::IpProto;
//!
//! let config = KeyConfig::default();
//! let builder = FlowKeyBuilder::new(&config);
//!
//! let request = KeyInput::new(
//!     PktType::Tcp,
//!     IpProto::TCP,
//!     "10.0.0.5".parse().unwrap(),
//!     4444,
//!     "10.0.0.9".parse().unwrap(),
//!     80,
//! );
//! let (key, reversed) = builder.session(&request);
//! let (reply_key, reply_reversed) = builder.session(&request.flip());
//!
//! assert_eq!(key, reply_key);
//! assert!(!reversed);
//! assert!(reply_reversed);
//! assert_eq!(key.port_low(), 4444);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::addr::{IpAddress, ADDR_SLOT_LEN};
use crate::config::KeyConfig;
use crate::packet::icmp::{Icmp6Type, IcmpType};
use crate::packet::protocol::IpProto;

/// Size of the binary key layout in bytes.
pub const FLOW_KEY_LEN: usize = 48;

/// Size of the binary key layout in 32-bit words.
pub const FLOW_KEY_WORDS: usize = FLOW_KEY_LEN / 4;

/// Kind of session a key belongs to
///
/// Part of the key, so that different session kinds sharing an address and
/// port pattern never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PktType {
    #[default]
    None = 0,
    Ip = 1,
    Tcp = 2,
    Udp = 3,
    Icmp = 4,
    User = 5,
    File = 6,
    Pdu = 7,
}

impl PktType {
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => PktType::None,
            1 => PktType::Ip,
            2 => PktType::Tcp,
            3 => PktType::Udp,
            4 => PktType::Icmp,
            5 => PktType::User,
            6 => PktType::File,
            7 => PktType::Pdu,
            _ => return None,
        })
    }
}

impl fmt::Display for PktType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PktType::None => "none",
            PktType::Ip => "ip",
            PktType::Tcp => "tcp",
            PktType::Udp => "udp",
            PktType::Icmp => "icmp",
            PktType::User => "user",
            PktType::File => "file",
            PktType::Pdu => "pdu",
        };
        f.write_str(s)
    }
}

/// Canonical flow identifier
///
/// Built by [`FlowKeyBuilder`]; immutable afterwards. Equality is field-wise
/// (see [`crate::compare::equal`]) and hashing feeds the 32-bit digest of
/// [`crate::hash::hash`] to the hasher.
#[repr(C)]
#[derive(Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Serialize, Deserialize)]
pub struct FlowKey {
    pub(crate) ip_low: [u8; ADDR_SLOT_LEN],
    pub(crate) ip_high: [u8; ADDR_SLOT_LEN],
    pub(crate) port_low: u16,
    pub(crate) port_high: u16,
    pub(crate) vlan_tag: u16,
    pub(crate) packet_type: u8,
    pub(crate) protocol_version: u8,
    pub(crate) mpls_label: u32,
    pub(crate) address_space_id: u16,
    pub(crate) address_space_pad: u16,
}

const _: () = {
    assert!(std::mem::size_of::<FlowKey>() == FLOW_KEY_LEN);
};

impl FlowKey {
    #[inline]
    pub fn ip_low(&self) -> [u8; ADDR_SLOT_LEN] {
        self.ip_low
    }

    #[inline]
    pub fn ip_high(&self) -> [u8; ADDR_SLOT_LEN] {
        self.ip_high
    }

    /// The low endpoint address, un-mapped for IPv4 keys.
    #[inline]
    pub fn addr_low(&self) -> IpAddress {
        IpAddress::from_mapped(self.ip_low, self.is_ipv4())
    }

    #[inline]
    pub fn addr_high(&self) -> IpAddress {
        IpAddress::from_mapped(self.ip_high, self.is_ipv4())
    }

    #[inline]
    pub fn port_low(&self) -> u16 {
        self.port_low
    }

    #[inline]
    pub fn port_high(&self) -> u16 {
        self.port_high
    }

    #[inline]
    pub fn vlan_tag(&self) -> u16 {
        self.vlan_tag
    }

    /// Session kind; `None` if the raw byte is not a known kind.
    #[inline]
    pub fn packet_type(&self) -> Option<PktType> {
        PktType::from_u8(self.packet_type)
    }

    /// 4 or 6
    #[inline]
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    #[inline]
    pub fn is_ipv4(&self) -> bool {
        self.protocol_version == 4
    }

    #[inline]
    pub fn mpls_label(&self) -> u32 {
        self.mpls_label
    }

    #[inline]
    pub fn address_space_id(&self) -> u16 {
        self.address_space_id
    }

    /// The key as twelve native-endian words, as consumed by the hasher.
    #[inline]
    pub fn words(&self) -> [u32; FLOW_KEY_WORDS] {
        zerocopy::transmute!(*self)
    }
}

impl PartialEq for FlowKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        crate::compare::equal(self, other)
    }
}

impl Eq for FlowKey {}

impl std::hash::Hash for FlowKey {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(crate::hash::hash(self));
    }
}

impl fmt::Debug for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowKey")
            .field("low", &format_args!("{}:{}", self.addr_low(), self.port_low))
            .field("high", &format_args!("{}:{}", self.addr_high(), self.port_high))
            .field("vlan_tag", &self.vlan_tag)
            .field("packet_type", &self.packet_type)
            .field("protocol_version", &self.protocol_version)
            .field("mpls_label", &self.mpls_label)
            .field("address_space_id", &self.address_space_id)
            .finish()
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.packet_type() {
            Some(t) => write!(f, "{t} ")?,
            None => write!(f, "type-{} ", self.packet_type)?,
        }
        if self.is_ipv4() {
            write!(f, "{}:{}", self.addr_low(), self.port_low)?;
            write!(f, " <-> {}:{}", self.addr_high(), self.port_high)?;
        } else {
            write!(f, "[{}]:{}", self.addr_low(), self.port_low)?;
            write!(f, " <-> [{}]:{}", self.addr_high(), self.port_high)?;
        }
        if self.vlan_tag != 0 {
            write!(f, " vlan {}", self.vlan_tag)?;
        }
        if self.mpls_label != 0 {
            write!(f, " mpls {}", self.mpls_label)?;
        }
        if self.address_space_id != 0 {
            write!(f, " as {}", self.address_space_id)?;
        }
        Ok(())
    }
}

/// Per-packet input of a session key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyInput {
    pub pkt_type: PktType,
    pub ip_proto: IpProto,
    pub src: IpAddress,
    pub src_port: u16,
    pub dst: IpAddress,
    pub dst_port: u16,
    pub vlan_id: u16,
    pub mpls_label: u32,
    pub address_space_id: u16,
}

impl KeyInput {
    /// Input with no VLAN, MPLS or address space context.
    pub fn new(
        pkt_type: PktType,
        ip_proto: IpProto,
        src: IpAddress,
        src_port: u16,
        dst: IpAddress,
        dst_port: u16,
    ) -> Self {
        Self {
            pkt_type,
            ip_proto,
            src,
            src_port,
            dst,
            dst_port,
            ..Default::default()
        }
    }

    pub fn with_vlan(self, vlan_id: u16) -> Self {
        Self { vlan_id, ..self }
    }

    pub fn with_mpls(self, mpls_label: u32) -> Self {
        Self { mpls_label, ..self }
    }

    pub fn with_address_space(self, address_space_id: u16) -> Self {
        Self {
            address_space_id,
            ..self
        }
    }

    /// The same packet seen in the opposite direction.
    pub fn flip(&self) -> Self {
        Self {
            src: self.dst,
            src_port: self.dst_port,
            dst: self.src,
            dst_port: self.src_port,
            ..*self
        }
    }
}

/// Per-packet input of a datagram (non-orderable) key
///
/// `id` is split across the two port slots: the low 16 bits become the source
/// port, the high 16 bits the destination port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatagramInput {
    pub pkt_type: PktType,
    pub ip_proto: IpProto,
    pub src: IpAddress,
    pub dst: IpAddress,
    pub id: u32,
    pub vlan_id: u16,
    pub mpls_label: u32,
    pub address_space_id: u16,
}

impl DatagramInput {
    fn key_input(&self) -> KeyInput {
        KeyInput {
            pkt_type: self.pkt_type,
            ip_proto: self.ip_proto,
            src: self.src,
            src_port: (self.id & 0xffff) as u16,
            dst: self.dst,
            dst_port: (self.id >> 16) as u16,
            vlan_id: self.vlan_id,
            mpls_label: self.mpls_label,
            address_space_id: self.address_space_id,
        }
    }
}

#[derive(Clone, Copy)]
struct Endpoint {
    addr: [u8; ADDR_SLOT_LEN],
    port: u16,
}

/// Builds [`FlowKey`]s against one configuration snapshot
#[derive(Debug, Clone, Copy)]
pub struct FlowKeyBuilder<'a> {
    config: &'a KeyConfig,
}

impl<'a> FlowKeyBuilder<'a> {
    pub fn new(config: &'a KeyConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &KeyConfig {
        self.config
    }

    /// Bidirectional session key; same as `build(input, true)`.
    #[inline]
    pub fn session(&self, input: &KeyInput) -> (FlowKey, bool) {
        self.build(input, true)
    }

    /// Datagram key. Endpoints are stored as given and never reordered, so two
    /// unrelated datagrams with mirrored endpoints do not merge.
    #[inline]
    pub fn datagram(&self, input: &DatagramInput) -> FlowKey {
        self.build(&input.key_input(), false).0
    }

    /// Builds a key and reports whether the caller's source ended up in the
    /// high slot. With `order == false` the flag is always `false`.
    pub fn build(&self, input: &KeyInput, order: bool) -> (FlowKey, bool) {
        let ipv4 = input.src.is_ipv4() && input.dst.is_ipv4();
        let (src_port, dst_port) = pair_icmp(input.ip_proto, ipv4, input.src_port, input.dst_port);

        let src = Endpoint {
            addr: input.src.to_mapped(),
            port: src_port,
        };
        let dst = Endpoint {
            addr: input.dst.to_mapped(),
            port: dst_port,
        };

        let (low, high, reversed) = if !order {
            (src, dst, false)
        } else {
            let cmp = match (input.src.ipv4_value(), input.dst.ipv4_value()) {
                (Some(s), Some(d)) => s.cmp(&d),
                _ => src.addr.cmp(&dst.addr),
            };
            canonical(src, dst, cmp)
        };

        let mpls_label = if !self.config.mpls_overlapping_ip {
            0
        } else if order && ipv4 && !(input.src.is_private() && input.dst.is_private()) {
            0
        } else {
            input.mpls_label
        };

        let key = FlowKey {
            ip_low: low.addr,
            ip_high: high.addr,
            port_low: low.port,
            port_high: high.port,
            vlan_tag: if self.config.vlan_agnostic { 0 } else { input.vlan_id },
            packet_type: input.pkt_type as u8,
            protocol_version: if ipv4 { 4 } else { 6 },
            mpls_label,
            address_space_id: if self.config.address_space_agnostic {
                0
            } else {
                input.address_space_id
            },
            address_space_pad: 0,
        };

        (key, reversed)
    }
}

/// ICMP carries the message type in the source port slot. An echo reply is
/// rewritten to the port pair of its request; any other type keeps its own
/// type and drops the code, so distinct types get distinct keys.
#[inline]
fn pair_icmp(proto: IpProto, ipv4: bool, src_port: u16, dst_port: u16) -> (u16, u16) {
    if proto == IpProto::ICMP {
        if src_port == IcmpType::ECHO_REPLY.0 as u16 {
            (0, IcmpType::ECHO.0 as u16)
        } else {
            (src_port, 0)
        }
    } else if proto == IpProto::IPV6_ICMP && !ipv4 {
        if src_port == Icmp6Type::ECHO_REPLY.0 as u16 {
            (0, Icmp6Type::ECHO_REQUEST.0 as u16)
        } else {
            (src_port, 0)
        }
    } else {
        (src_port, dst_port)
    }
}

#[inline]
fn canonical(src: Endpoint, dst: Endpoint, addr_cmp: Ordering) -> (Endpoint, Endpoint, bool) {
    match addr_cmp {
        Ordering::Less => (src, dst, false),
        Ordering::Greater => (dst, src, true),
        Ordering::Equal if src.port < dst.port => (src, dst, false),
        // identical endpoints land in the high slot and report reversed
        Ordering::Equal => (dst, src, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v4(s: &str) -> IpAddress {
        s.parse().unwrap()
    }

    fn tcp(src: &str, sp: u16, dst: &str, dp: u16) -> KeyInput {
        KeyInput::new(PktType::Tcp, IpProto::TCP, v4(src), sp, v4(dst), dp)
    }

    fn icmp(src: &str, dst: &str, icmp_type: u8, code: u8) -> KeyInput {
        KeyInput::new(PktType::Icmp, IpProto::ICMP, v4(src), icmp_type as u16, v4(dst), code as u16)
    }

    #[test]
    fn test_tcp_v4_session() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let (key, reversed) = builder.session(&tcp("10.0.0.5", 4444, "10.0.0.9", 80));
        assert!(!reversed);
        assert_eq!(key.addr_low(), v4("10.0.0.5"));
        assert_eq!(key.ip_low(), v4("10.0.0.5").to_mapped());
        assert_eq!(key.port_low(), 4444);
        assert_eq!(key.addr_high(), v4("10.0.0.9"));
        assert_eq!(key.port_high(), 80);
        assert_eq!(key.mpls_label(), 0);
        assert_eq!(key.protocol_version(), 4);
        assert_eq!(key.packet_type(), Some(PktType::Tcp));

        let (back, back_reversed) = builder.session(&tcp("10.0.0.9", 80, "10.0.0.5", 4444));
        assert!(back_reversed);
        assert_eq!(back, key);
    }

    #[test]
    fn test_ipv4_orders_numerically() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        // 9.255.255.255 < 10.0.0.1 numerically
        let (key, reversed) = builder.session(&tcp("10.0.0.1", 1, "9.255.255.255", 2));
        assert!(reversed);
        assert_eq!(key.addr_low(), v4("9.255.255.255"));
        assert_eq!(key.port_low(), 2);
    }

    #[test]
    fn test_equal_addresses_order_by_port() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let (key, reversed) = builder.session(&tcp("127.0.0.1", 9000, "127.0.0.1", 22));
        assert!(reversed);
        assert_eq!(key.port_low(), 22);
        assert_eq!(key.port_high(), 9000);

        let (key2, reversed2) = builder.session(&tcp("127.0.0.1", 22, "127.0.0.1", 9000));
        assert!(!reversed2);
        assert_eq!(key, key2);
    }

    #[test]
    fn test_identical_endpoints_are_reversed() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let input = KeyInput::new(PktType::Udp, IpProto::UDP, v4("10.0.0.1"), 5000, v4("10.0.0.1"), 5000);
        let (key, reversed) = builder.session(&input);
        assert!(reversed);
        assert_eq!((key.port_low(), key.port_high()), (5000, 5000));

        // both directions of such a flow agree on the flag
        let (flipped, flipped_reversed) = builder.session(&input.flip());
        assert_eq!(flipped, key);
        assert!(flipped_reversed);
    }

    #[test]
    fn test_ipv6_session() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let a: IpAddress = "2001:db8::10".parse().unwrap();
        let b: IpAddress = "2001:db8::2".parse().unwrap();
        let input = KeyInput::new(PktType::Udp, IpProto::UDP, a, 53, b, 33000);

        let (key, reversed) = builder.session(&input);
        assert!(reversed);
        assert_eq!(key.protocol_version(), 6);
        assert_eq!(key.addr_low(), b);
        assert_eq!(key.port_low(), 33000);
        assert_eq!(key.addr_high(), a);

        let (back, back_reversed) = builder.session(&input.flip());
        assert!(!back_reversed);
        assert_eq!(back, key);
    }

    #[test]
    fn test_mixed_family_uses_ipv6_rule() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let v6: IpAddress = "::1".parse().unwrap();
        let input = KeyInput::new(PktType::Udp, IpProto::UDP, v4("10.0.0.1"), 1, v6, 2);
        let (key, reversed) = builder.session(&input);

        assert_eq!(key.protocol_version(), 6);
        // ::1 sorts before ::ffff:10.0.0.1
        assert!(reversed);
        assert_eq!(key.ip_low(), v6.to_mapped());
    }

    #[test]
    fn test_icmp_echo_pairing() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let request = icmp("192.168.1.20", "192.168.1.10", IcmpType::ECHO.0, 0);
        let reply = icmp("192.168.1.10", "192.168.1.20", IcmpType::ECHO_REPLY.0, 0);

        let (req_key, req_rev) = builder.session(&request);
        let (rep_key, rep_rev) = builder.session(&reply);

        assert_eq!(req_key, rep_key);
        // A = .20 > B = .10, so the request's source sits high
        assert!(req_rev);
        assert!(!rep_rev);
        assert_eq!(req_key.port_low(), 0);
        assert_eq!(req_key.port_high(), IcmpType::ECHO.0 as u16);
    }

    #[test]
    fn test_icmp_other_types_drop_code() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let unreach_a = icmp("10.0.0.1", "10.0.0.2", IcmpType::DEST_UNREACH.0, 1);
        let unreach_b = icmp("10.0.0.1", "10.0.0.2", IcmpType::DEST_UNREACH.0, 3);
        let exceeded = icmp("10.0.0.1", "10.0.0.2", IcmpType::TIME_EXCEEDED.0, 1);

        let (ka, _) = builder.session(&unreach_a);
        let (kb, _) = builder.session(&unreach_b);
        let (kc, _) = builder.session(&exceeded);

        assert_eq!(ka, kb);
        assert_ne!(ka, kc);
        assert_eq!(ka.port_low(), IcmpType::DEST_UNREACH.0 as u16);
        assert_eq!(ka.port_high(), 0);
    }

    #[test]
    fn test_icmp6_echo_pairing() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let a: IpAddress = "fe80::1".parse().unwrap();
        let b: IpAddress = "fe80::2".parse().unwrap();
        let request = KeyInput::new(
            PktType::Icmp,
            IpProto::IPV6_ICMP,
            a,
            Icmp6Type::ECHO_REQUEST.0 as u16,
            b,
            0,
        );
        let reply = KeyInput::new(
            PktType::Icmp,
            IpProto::IPV6_ICMP,
            b,
            Icmp6Type::ECHO_REPLY.0 as u16,
            a,
            0,
        );

        let (req_key, req_rev) = builder.session(&request);
        let (rep_key, rep_rev) = builder.session(&reply);
        assert_eq!(req_key, rep_key);
        assert!(!req_rev);
        assert!(rep_rev);
        assert_eq!(req_key.port_low(), Icmp6Type::ECHO_REQUEST.0 as u16);
    }

    #[test]
    fn test_icmp6_rule_not_applied_to_ipv4() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let input = KeyInput::new(PktType::Ip, IpProto::IPV6_ICMP, v4("10.0.0.1"), 129, v4("10.0.0.2"), 7);
        let (key, _) = builder.session(&input);
        assert_eq!((key.port_low(), key.port_high()), (129, 7));
    }

    #[test]
    fn test_datagram_never_swaps() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let fwd = DatagramInput {
            pkt_type: PktType::Ip,
            ip_proto: IpProto::UDP,
            src: v4("10.0.0.9"),
            dst: v4("10.0.0.5"),
            id: 0x0050_115c,
            ..Default::default()
        };
        let rev = DatagramInput {
            src: fwd.dst,
            dst: fwd.src,
            ..fwd
        };

        let key = builder.datagram(&fwd);
        assert_eq!(key.addr_low(), v4("10.0.0.9"));
        assert_eq!(key.port_low(), 0x115c);
        assert_eq!(key.port_high(), 0x0050);
        assert_ne!(key, builder.datagram(&rev));

        let (_, reversed) = builder.build(&fwd.key_input(), false);
        assert!(!reversed);
    }

    #[test]
    fn test_datagram_differs_from_session() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let input = tcp("10.0.0.9", 80, "10.0.0.5", 4444);
        let (session, _) = builder.build(&input, true);
        let (datagram, reversed) = builder.build(&input, false);
        assert!(!reversed);
        assert_ne!(session, datagram);
    }

    #[test]
    fn test_vlan_agnostic() {
        let a = tcp("10.0.0.5", 4444, "10.0.0.9", 80).with_vlan(100);
        let b = a.with_vlan(200);

        let strict = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&strict);
        assert_ne!(builder.session(&a).0, builder.session(&b).0);
        assert_eq!(builder.session(&a).0.vlan_tag(), 100);

        let agnostic = KeyConfig {
            vlan_agnostic: true,
            ..Default::default()
        };
        let builder = FlowKeyBuilder::new(&agnostic);
        assert_eq!(builder.session(&a).0, builder.session(&b).0);
        assert_eq!(builder.session(&a).0.vlan_tag(), 0);
    }

    #[test]
    fn test_address_space_agnostic() {
        let a = tcp("10.0.0.5", 4444, "10.0.0.9", 80).with_address_space(1);
        let b = a.with_address_space(2);

        let strict = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&strict);
        assert_ne!(builder.session(&a).0, builder.session(&b).0);

        let agnostic = KeyConfig {
            address_space_agnostic: true,
            ..Default::default()
        };
        let builder = FlowKeyBuilder::new(&agnostic);
        let key = builder.session(&a).0;
        assert_eq!(key, builder.session(&b).0);
        assert_eq!(key.address_space_id(), 0);
        assert_eq!(key.address_space_pad, 0);
    }

    #[test]
    fn test_mpls_gating() {
        let private = tcp("10.0.0.5", 4444, "192.168.0.9", 80).with_mpls(1000);
        let public = tcp("10.0.0.5", 4444, "8.8.8.8", 53).with_mpls(1000);

        let off = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&off);
        assert_eq!(builder.session(&private).0.mpls_label(), 0);
        assert_eq!(builder.session(&public).0.mpls_label(), 0);

        let on = KeyConfig {
            mpls_overlapping_ip: true,
            ..Default::default()
        };
        let builder = FlowKeyBuilder::new(&on);
        assert_eq!(builder.session(&private).0.mpls_label(), 1000);
        assert_eq!(builder.session(&public).0.mpls_label(), 0);
        assert_ne!(
            builder.session(&private).0,
            builder.session(&private.with_mpls(2000)).0
        );
    }

    #[test]
    fn test_mpls_datagram_and_ipv6_skip_private_check() {
        let on = KeyConfig {
            mpls_overlapping_ip: true,
            ..Default::default()
        };
        let builder = FlowKeyBuilder::new(&on);

        let dgram = DatagramInput {
            pkt_type: PktType::Ip,
            ip_proto: IpProto::UDP,
            src: v4("8.8.8.8"),
            dst: v4("1.1.1.1"),
            id: 7,
            mpls_label: 42,
            ..Default::default()
        };
        assert_eq!(builder.datagram(&dgram).mpls_label(), 42);

        let v6 = KeyInput::new(
            PktType::Tcp,
            IpProto::TCP,
            "2001:db8::1".parse().unwrap(),
            1,
            "2001:db8::2".parse().unwrap(),
            2,
        )
        .with_mpls(42);
        assert_eq!(builder.session(&v6).0.mpls_label(), 42);

        let off = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&off);
        assert_eq!(builder.datagram(&dgram).mpls_label(), 0);
    }

    #[test]
    fn test_packet_type_separates_flows() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);

        let a = tcp("10.0.0.5", 4444, "10.0.0.9", 80);
        let b = KeyInput {
            pkt_type: PktType::Udp,
            ip_proto: IpProto::UDP,
            ..a
        };
        assert_ne!(builder.session(&a).0, builder.session(&b).0);
    }

    #[test]
    fn test_display() {
        let config = KeyConfig::default();
        let builder = FlowKeyBuilder::new(&config);
        let (key, _) = builder.session(&tcp("10.0.0.9", 80, "10.0.0.5", 4444).with_vlan(7));
        assert_eq!(key.to_string(), "tcp 10.0.0.5:4444 <-> 10.0.0.9:80 vlan 7");
    }

    fn any_addr() -> impl Strategy<Value = IpAddress> {
        prop_oneof![
            any::<[u8; 4]>().prop_map(IpAddress::V4),
            any::<[u8; 16]>().prop_map(IpAddress::V6),
        ]
    }

    fn any_config() -> impl Strategy<Value = KeyConfig> {
        (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(v, a, m)| KeyConfig {
            vlan_agnostic: v,
            address_space_agnostic: a,
            mpls_overlapping_ip: m,
        })
    }

    proptest! {
        #[test]
        fn prop_session_is_symmetric(
            config in any_config(),
            src in any_addr(),
            dst in any_addr(),
            sp in any::<u16>(),
            dp in any::<u16>(),
            vlan in any::<u16>(),
            mpls in any::<u32>(),
            space in any::<u16>(),
        ) {
            prop_assume!(!(src.to_mapped() == dst.to_mapped() && sp == dp));
            let builder = FlowKeyBuilder::new(&config);
            let input = KeyInput::new(PktType::Tcp, IpProto::TCP, src, sp, dst, dp)
                .with_vlan(vlan)
                .with_mpls(mpls)
                .with_address_space(space);

            let (fwd, fwd_rev) = builder.session(&input);
            let (rev, rev_rev) = builder.session(&input.flip());
            prop_assert_eq!(fwd, rev);
            prop_assert_eq!(fwd_rev, !rev_rev);
        }

        #[test]
        fn prop_datagram_never_reversed(
            src in any_addr(),
            dst in any_addr(),
            id in any::<u32>(),
        ) {
            let config = KeyConfig::default();
            let builder = FlowKeyBuilder::new(&config);
            let fwd = DatagramInput { pkt_type: PktType::Ip, ip_proto: IpProto::UDP, src, dst, id, ..Default::default() };
            let rev = DatagramInput { src: dst, dst: src, ..fwd };

            let (_, reversed) = builder.build(&fwd.key_input(), false);
            prop_assert!(!reversed);
            prop_assert_eq!(builder.datagram(&fwd) == builder.datagram(&rev), src.to_mapped() == dst.to_mapped());
        }
    }
}
