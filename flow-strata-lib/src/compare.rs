//! Flow key equality

use crate::key::FlowKey;

/// Field-wise equality of two keys, padding included.
#[inline]
pub fn equal(a: &FlowKey, b: &FlowKey) -> bool {
    a.ip_low == b.ip_low
        && a.ip_high == b.ip_high
        && a.port_low == b.port_low
        && a.port_high == b.port_high
        && a.vlan_tag == b.vlan_tag
        && a.packet_type == b.packet_type
        && a.protocol_version == b.protocol_version
        && a.mpls_label == b.mpls_label
        && a.address_space_id == b.address_space_id
        && a.address_space_pad == b.address_space_pad
}
