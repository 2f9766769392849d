use crate::types::af::STRIDE_SIZE;

/// The number of prefix slots in a node: 1 + 2 + 4 + 8.
pub(crate) const SLOTS: usize = 15;

// The width of the prefix bitmap. The last bit is never used.
const PFX_BITARR_SIZE: u8 = 16;

//------------ BitSpan -------------------------------------------------------

// A bitspan is the part of a prefix that falls inside the stride of the node
// that hosts it: the `len` leading bits of the 3-bit group of that node,
// with `bits` holding their value shifted all the way to the right. A
// bitspan has a length of 0, 1, 2 or 3 bits. A length of zero only ever
// occurs for the default route, in the root node.
//
// Every bitspan maps to exactly one slot in the prefix array of a node:
//
// slot                0   1   2   3   4   5   6    7    8  ...   14
// bits (len)          *   0   1  00  01  10  11  000  001  ...  111
// len offset          0   1       2               3
//
// i.e. slot = (1 << len) - 1 + bits, so there are 15 slots in total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BitSpan {
    pub bits: u32,
    pub len: u8,
}

impl BitSpan {
    pub(crate) fn new(bits: u32, len: u8) -> Self {
        Self { bits, len }
    }

    // Take the `len` most significant bits of a 3-bit nibble.
    pub(crate) fn from_nibble(nibble: u8, len: u8) -> Self {
        debug_assert!(len <= STRIDE_SIZE);
        Self::new(((nibble & 0b111) >> (STRIDE_SIZE - len)) as u32, len)
    }

    // Calculate the bit span from the index of a slot. The index plus one
    // has its highest bit at position `len`, so smearing all the lower bits
    // and counting them gives back the length. Used by the iterator, so it
    // can have one sequential loop over all slots.
    pub(crate) fn from_slot(slot: u8) -> Self {
        debug_assert!((slot as usize) < SLOTS);
        let bits = slot as u32;
        let mut i = slot + 1;
        i |= i >> 1;
        i |= i >> 2;
        let len = (i >> 1).count_ones() as u8;
        Self::new(bits - ((1 << len) - 1), len)
    }

    pub(crate) fn check(&self) -> bool {
        self.len <= STRIDE_SIZE && self.bits < (1 << self.len)
    }

    pub(crate) fn slot(self) -> usize {
        ((1_usize << self.len) - 1) + self.bits as usize
    }

    // The position of this bitspan in a prefix bitmap, most significant bit
    // first.
    pub(crate) fn into_bit_pos(self) -> u16 {
        1 << (PFX_BITARR_SIZE as usize - self.slot() - 1)
    }

    // Turn the bitspan back into a full nibble, padded with zeros.
    pub(crate) fn into_nibble(self) -> u8 {
        (self.bits << (STRIDE_SIZE - self.len)) as u8
    }
}

impl std::fmt::Binary for BitSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03b} (len {})", self.bits, self.len)
    }
}
