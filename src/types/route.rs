use std::fmt;
use std::net::Ipv4Addr;

use inetnum::asn::Asn;
use serde_derive::{Deserialize, Serialize};

use crate::types::PrefixId;

//------------ Ipv4Route -----------------------------------------------------

/// The plain route payload: where to send packets and at what cost.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Route {
    pub next_hop: Ipv4Addr,
    pub metric: u16,
}

impl Ipv4Route {
    pub fn new(next_hop: Ipv4Addr, metric: u16) -> Self {
        Self { next_hop, metric }
    }
}

impl Default for Ipv4Route {
    fn default() -> Self {
        Self {
            next_hop: Ipv4Addr::UNSPECIFIED,
            metric: 0,
        }
    }
}

impl fmt::Display for Ipv4Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "via {} metric {}", self.next_hop, self.metric)
    }
}

//------------ Origin --------------------------------------------------------

/// The ORIGIN path attribute of a BGP route.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Origin {
    #[default]
    Igp,
    Egp,
    Incomplete,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Igp => write!(f, "i"),
            Origin::Egp => write!(f, "e"),
            Origin::Incomplete => write!(f, "?"),
        }
    }
}

//------------ BgpRoute ------------------------------------------------------

/// A route as learned from a BGP neighbour, carrying the path attributes
/// that a speaker needs to pick and re-announce it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BgpRoute {
    pub next_hop: Ipv4Addr,
    pub metric: u16,
    pub local_pref: u32,
    pub origin: Origin,
    pub as_path: Vec<Asn>,
    pub communities: Vec<u32>,
}

impl BgpRoute {
    pub fn new(next_hop: Ipv4Addr, local_pref: u32) -> Self {
        Self {
            next_hop,
            local_pref,
            ..Default::default()
        }
    }

    pub fn with_as_path(mut self, as_path: Vec<Asn>) -> Self {
        self.as_path = as_path;
        self
    }

    pub fn with_communities(mut self, communities: Vec<u32>) -> Self {
        self.communities = communities;
        self
    }

    /// The AS the route originated in, the last AS on the path.
    pub fn origin_as(&self) -> Option<Asn> {
        self.as_path.last().copied()
    }
}

impl Default for BgpRoute {
    fn default() -> Self {
        Self {
            next_hop: Ipv4Addr::UNSPECIFIED,
            metric: 0,
            local_pref: 0,
            origin: Origin::default(),
            as_path: vec![],
            communities: vec![],
        }
    }
}

impl fmt::Display for BgpRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "via {} metric {} local-pref {} path [",
            self.next_hop, self.metric, self.local_pref
        )?;
        for (i, asn) in self.as_path.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", asn.into_u32())?;
        }
        write!(f, "] {}", self.origin)
    }
}

//------------ RouteEntry ----------------------------------------------------

/// A route found in a table, together with the prefix it is stored under.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteEntry<'a, P> {
    pub prefix: PrefixId,
    pub route: &'a P,
}

impl<P> Clone for RouteEntry<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for RouteEntry<'_, P> {}

impl<P: Clone> RouteEntry<'_, P> {
    pub fn to_pair(&self) -> (PrefixId, P) {
        (self.prefix, self.route.clone())
    }
}

impl<P> From<RouteEntry<'_, P>> for inetnum::addr::Prefix {
    fn from(value: RouteEntry<'_, P>) -> Self {
        value.prefix.into()
    }
}

impl<P: fmt::Display> fmt::Display for RouteEntry<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.route)
    }
}
