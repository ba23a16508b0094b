//! EtherType and IP protocol numbers
//!
//! Only the values the flow front-end needs to recognize are named; every
//! other number is still representable and displays as hex.
//!
//! ```
//! use flow_strata::packet::protocol::{EtherProto, IpProto};
//!
//! assert_eq!(IpProto::TCP.to_string(), "tcp");
//! assert_eq!(IpProto::IPV6_ICMP.to_string(), "ipv6-icmp");
//! assert_eq!("udp".parse::<IpProto>().unwrap(), IpProto::UDP);
//! assert_eq!(IpProto::from(200).to_string(), "0xc8");
//! assert_eq!(u16::from(EtherProto::VLAN_8021Q), 0x8100);
//! ```

use zerocopy::{BigEndian, U16};

crate::protocol_constants! {
    EtherProto, U16<BigEndian>, u16:
        IPV4 = 0x0800;
        ARP = 0x0806;
        VLAN_8021Q = 0x8100;
        IPV6 = 0x86DD;
        MPLS_UC = 0x8847;
        MPLS_MC = 0x8848;
        VLAN_8021AD = 0x88A8;
        QINQ1 = 0x9100;
        QINQ2 = 0x9200;
        QINQ3 = 0x9300;
}

impl EtherProto {
    /// 802.1Q, 802.1ad and the legacy QinQ TPIDs
    #[inline]
    pub fn is_vlan(&self) -> bool {
        matches!(
            self.value(),
            0x8100 | 0x88A8 | 0x9100 | 0x9200 | 0x9300
        )
    }

    #[inline]
    pub fn is_mpls(&self) -> bool {
        matches!(self.value(), 0x8847 | 0x8848)
    }
}

crate::protocol_constants! {
    IpProto, u8, u8:
        IPV6_HOPOPT = 0;
        ICMP = 1;
        IGMP = 2;
        IP_ENCAP = 4;
        TCP = 6;
        UDP = 17;
        IPV6 = 41;
        IPV6_ROUTE = 43;
        IPV6_FRAG = 44;
        GRE = 47;
        ESP = 50;
        AH = 51;
        IPV6_ICMP = 58;
        IPV6_NONXT = 59;
        IPV6_OPTS = 60;
        SCTP = 132;
        UDPLITE = 136;
}
