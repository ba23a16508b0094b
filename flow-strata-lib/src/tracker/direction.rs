use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a packet within its flow.
///
/// The first packet of a flow defines the client side:
/// - `Upwards`: from the client (initiator) to the server
/// - `Downwards`: from the server back to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PacketDirection {
    #[default]
    Upwards,
    Downwards,
}

impl fmt::Display for PacketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketDirection::Upwards => write!(f, "Upwards"),
            PacketDirection::Downwards => write!(f, "Downwards"),
        }
    }
}

impl PacketDirection {
    /// Direction from the key builder's `reversed` flag.
    ///
    /// A packet travels upwards iff it was reversed the same way as the flow's
    /// first packet, i.e. its source sits in the same key slot as the
    /// initiator's.
    #[inline]
    pub fn from_reversed(reversed: bool, initiator_reversed: bool) -> Self {
        if reversed == initiator_reversed {
            PacketDirection::Upwards
        } else {
            PacketDirection::Downwards
        }
    }

    #[inline]
    pub fn is_upwards(&self) -> bool {
        matches!(self, PacketDirection::Upwards)
    }

    #[inline]
    pub fn flip(self) -> Self {
        match self {
            PacketDirection::Upwards => PacketDirection::Downwards,
            PacketDirection::Downwards => PacketDirection::Upwards,
        }
    }
}
