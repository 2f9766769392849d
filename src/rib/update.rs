use std::fmt;

use crate::types::PrefixId;

//------------ RouteUpdate ---------------------------------------------------

/// A decoded change to a routing table, as handed over by the component
/// that speaks to the neighbours. A table applies these one by one, or as a
/// batch, without knowing anything about where they came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteUpdate<P> {
    /// Install `route` for `prefix`, replacing whatever was there.
    Announce { prefix: PrefixId, route: P },
    /// Remove the route for `prefix`.
    Withdraw { prefix: PrefixId },
}

impl<P> RouteUpdate<P> {
    pub fn announce(prefix: PrefixId, route: P) -> Self {
        RouteUpdate::Announce { prefix, route }
    }

    pub fn withdraw(prefix: PrefixId) -> Self {
        RouteUpdate::Withdraw { prefix }
    }

    pub fn prefix(&self) -> PrefixId {
        match self {
            RouteUpdate::Announce { prefix, .. } => *prefix,
            RouteUpdate::Withdraw { prefix } => *prefix,
        }
    }
}

//------------ UpdateOutcome -------------------------------------------------

/// What applying a [RouteUpdate] did to the table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpdateOutcome {
    /// The prefix was not in the table, and now is.
    Added,
    /// The prefix was in the table, its route was overwritten.
    Replaced,
    /// The prefix was removed from the table.
    Withdrawn,
    /// A withdraw for a prefix that was not in the table.
    NotFound,
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Added => write!(f, "added"),
            UpdateOutcome::Replaced => write!(f, "replaced"),
            UpdateOutcome::Withdrawn => write!(f, "withdrawn"),
            UpdateOutcome::NotFound => write!(f, "not found"),
        }
    }
}
