use log::trace;

//------------ IPv4 ---------------------------------------------------------
//
// The tree only knows about IPv4. An address is carried around as its u32
// value in host order, so it is impossible to hand the tree something that
// is not 32 bits wide.

/// The value of an IPv4 address, as a host-order u32.
pub type IPv4 = u32;

/// The number of address bits consumed by one level of the tree.
pub const STRIDE_SIZE: u8 = 3;

/// The number of levels in the tree. Ten full strides of three bits, plus
/// one last stride that only has two bits left to cover.
pub const DEPTH_LEVELS: u8 = 11;

/// The maximum length of an IPv4 prefix.
pub const MAX_LEN: u8 = 32;

// Returns the 3-bit group of `net` that selects the child at `depth` (root
// is depth 0), shifted all the way to the right.
//
// The address is widened to 33 bits, with a zero bit appended at the end,
// so that the last stride, which only covers bits 30 and 31, reads as a
// regular 3-bit group with its lowest bit always zero.
//
// depth  0: bits  0- 2    0b[xxx]0_0000_...
// depth  9: bits 27-29
// depth 10: bits 30-31    ..._00[xx] + a zero bit
pub(crate) fn nibble_at(net: IPv4, depth: u8) -> u8 {
    debug_assert!(depth < DEPTH_LEVELS);
    let wide = (net as u64) << 1;
    ((wide >> (30 - STRIDE_SIZE as u32 * depth as u32)) & 0b111) as u8
}

// The inverse of `nibble_at`: put the 3-bit group `nibble` back at the place
// in an address where `depth` reads it from. For the last level the lowest
// bit of the nibble falls off.
pub(crate) fn nibble_into_net(nibble: u8, depth: u8) -> IPv4 {
    debug_assert!(depth < DEPTH_LEVELS);
    let wide = ((nibble & 0b111) as u64)
        << (30 - STRIDE_SIZE as u32 * depth as u32);
    (wide >> 1) as u32
}

/// Fill the bits after the specified len with zeros. Interpreted as an IP
/// Prefix, this means that `net` will be truncated to the specified len.
pub fn truncate_to_len(net: IPv4, len: u8) -> IPv4 {
    let mask = u32::MAX
        .checked_shl(MAX_LEN.saturating_sub(len) as u32)
        .unwrap_or(0);
    trace!("truncate {:032b} to /{} mask {:032b}", net, len, mask);
    net & mask
}

/// Trait that describes the conversion of a u32 into an IPv4 address.
pub trait IntoIpAddr {
    fn into_ipaddr(self) -> std::net::IpAddr;
}

impl IntoIpAddr for u32 {
    fn into_ipaddr(self) -> std::net::IpAddr {
        std::net::IpAddr::V4(std::net::Ipv4Addr::from(self))
    }
}
