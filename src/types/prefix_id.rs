use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr};

use crate::types::af::{
    nibble_at, nibble_into_net, truncate_to_len, IPv4, MAX_LEN, STRIDE_SIZE,
};
use crate::types::errors::RibError;
use crate::types::BitSpan;

//------------ Cidr ----------------------------------------------------------

/// The length of an IPv4 prefix. A `Cidr` is always in the range `0..=32`,
/// so a table never has to check the length it is handed.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cidr(u8);

impl Cidr {
    pub const MIN: Cidr = Cidr(0);
    pub const MAX: Cidr = Cidr(MAX_LEN);

    pub fn new(len: u8) -> Result<Self, RibError> {
        if len > MAX_LEN {
            return Err(RibError::PrefixLengthInvalid);
        }
        Ok(Cidr(len))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    // The depth of the node that hosts prefixes of this length: the node
    // whose stride contains the last bit of the prefix. The default route
    // lives in the root.
    pub(crate) fn node_depth(self) -> u8 {
        self.0.saturating_sub(1) / STRIDE_SIZE
    }

    // The number of bits of the prefix that fall inside the stride of the
    // hosting node, 1 to 3 (0 for the default route).
    pub(crate) fn span_len(self) -> u8 {
        self.0 - STRIDE_SIZE * self.node_depth()
    }
}

impl TryFrom<u8> for Cidr {
    type Error = RibError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Cidr::new(value)
    }
}

impl From<Cidr> for u8 {
    fn from(value: Cidr) -> Self {
        value.0
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//------------ PrefixId ------------------------------------------------------

/// An IPv4 prefix as stored in a table: the network address with all bits
/// after the length set to zero, and the length.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrefixId {
    net: IPv4,
    len: Cidr,
}

impl PrefixId {
    /// Create a prefix, host bits in `net` are cleared.
    pub fn new(net: IPv4, len: Cidr) -> Self {
        PrefixId {
            net: truncate_to_len(net, len.get()),
            len,
        }
    }

    pub fn get_net(&self) -> IPv4 {
        self.net
    }

    pub fn get_len(&self) -> Cidr {
        self.len
    }

    pub fn addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.net)
    }

    /// Whether `addr` falls inside this prefix.
    pub fn contains(&self, addr: IPv4) -> bool {
        truncate_to_len(addr, self.len.get()) == self.net
    }

    pub(crate) fn node_depth(&self) -> u8 {
        self.len.node_depth()
    }

    pub(crate) fn bit_span(&self) -> BitSpan {
        let depth = self.node_depth();
        BitSpan::from_nibble(nibble_at(self.net, depth), self.len.span_len())
    }

    // Reassemble a prefix from the net of the node it was found in (`base`,
    // all the bits above `depth`) and the bitspan of its slot.
    pub(crate) fn from_bit_span(base: IPv4, depth: u8, bs: BitSpan) -> Self {
        debug_assert!(bs.check());
        PrefixId {
            net: base | nibble_into_net(bs.into_nibble(), depth),
            len: Cidr(STRIDE_SIZE * depth + bs.len),
        }
    }
}

impl std::fmt::Display for PrefixId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr(), self.len)
    }
}

impl TryFrom<inetnum::addr::Prefix> for PrefixId {
    type Error = RibError;

    fn try_from(value: inetnum::addr::Prefix) -> Result<Self, Self::Error> {
        match value.addr() {
            IpAddr::V4(addr) => {
                Ok(PrefixId::new(u32::from(addr), Cidr::new(value.len())?))
            }
            IpAddr::V6(_) => Err(RibError::UnsupportedAddressFamily),
        }
    }
}

// There is no reasonable way for this to panic, PrefixId and inetnum's Prefix
// represent the same data, and the host bits of a PrefixId are always zero.
#[allow(clippy::unwrap_used)]
impl From<PrefixId> for inetnum::addr::Prefix {
    fn from(value: PrefixId) -> Self {
        Self::new(IpAddr::V4(value.addr()), value.len.get()).unwrap()
    }
}
