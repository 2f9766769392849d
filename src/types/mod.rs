pub(crate) mod af;
pub(crate) mod bit_span;
pub(crate) mod prefix_id;
pub(crate) mod route;

pub(crate) use bit_span::BitSpan;
pub use prefix_id::{Cidr, PrefixId};
pub use route::{BgpRoute, Ipv4Route, Origin, RouteEntry};

pub mod errors;
pub mod stats;
