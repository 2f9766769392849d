#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

//! A library that provides the IPv4 routing tables for a BGP speaker, with
//! longest-prefix-match lookups.
//!
//! The main data structure that this crate implements is a tree bitmap,
//! largely as described in this paper[^1], with a fixed stride of three
//! bits. Each node of the tree covers three bits of an address, and holds
//! a bitmap of the children it has, and a bitmap of the prefixes that end
//! inside its stride. A lookup visits at most eleven nodes, regardless of
//! the number of prefixes in the table.
//!
//! On top of the tree this crate offers a table that can be shared between
//! threads ([Rib]), and the set of all tables of a router, the master table
//! and the VRF tables ([rib::RoutingTables]). Deleting a prefix only clears
//! a bit, the memory is released by a reclamation pass, which can run in
//! the background ([rib::Reclaimer]).
//!
//! ```
//! use std::net::Ipv4Addr;
//! use dnrd_rib::{Cidr, Ipv4Route, TreeBitMap};
//!
//! let mut table = TreeBitMap::new();
//! let hop = |last| Ipv4Route::new(Ipv4Addr::new(10, 0, 0, last), 100);
//!
//! table.insert(0xffff_fffc, Cidr::new(30)?, hop(1))?;
//! table.insert(0x1000_0000, Cidr::new(15)?, hop(2))?;
//! table.insert(0xffff_fff0, Cidr::new(28)?, hop(3))?;
//!
//! assert_eq!(table.lookup(0xffff_ffff), Some(&hop(1)));
//! assert_eq!(table.lookup(0x0a00_0000), None);
//! # Ok::<(), dnrd_rib::errors::RibError>(())
//! ```
//!
//! [^1]: <https://www.cs.cornell.edu/courses/cs419/2005sp/tree-bitmap.pdf>
mod tree_bitmap;
mod types;

// re-exports
pub use inetnum::addr;
pub use inetnum::asn;

// Public Interfaces on the root of the crate

/// Shared routing tables, the registry of tables, and route updates
pub mod rib;

/// The prefix tree
pub use tree_bitmap::{Iter, Reclaimed, TreeBitMap};

pub use rib::Rib;

/// Error types returned by a table
pub use types::errors;

/// Prefixes and prefix lengths
pub use types::{Cidr, PrefixId};

/// Route payloads
pub use types::{BgpRoute, Ipv4Route, Origin, RouteEntry};

/// The underlying value (u32) of an IPv4 address.
pub use types::af::IPv4;

/// Trait that describes the conversion of a u32 in to an IPv4 address.
pub use types::af::IntoIpAddr;

pub use types::af::truncate_to_len;

/// Statistics types returned by methods on a table
pub use types::stats;
