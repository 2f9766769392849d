use std::fmt;

/// Possible errors returned by methods on a routing table, or on the
/// registry of routing tables. Most of these errors are recoverable,
/// [RibError::FatalError] is not: the table it came from should be
/// considered corrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RibError {
    /// The requested prefix was not found in the table.
    PrefixNotFound,
    /// The specified prefix length cannot exist for IPv4.
    PrefixLengthInvalid,
    /// The prefix is not an IPv4 prefix. Only IPv4 tables exist.
    UnsupportedAddressFamily,
    /// Memory for a children array or a prefix array could not be
    /// allocated. The operation was not applied, the table is unchanged.
    OutOfMemory,
    /// There is no VRF with this name.
    VrfNotFound(String),
    /// A VRF with this name already exists.
    VrfExists(String),
    /// The table identifier does not (or no longer) refer(s) to a table.
    TableNotFound,
    /// The configuration is not valid. The string describes what is wrong
    /// with it.
    Config(String),
    /// The table could not be serialized.
    Export(String),
    /// A background thread could not be started.
    ThreadSpawn(String),
    /// A node was found in a state that the tree never puts it in. The
    /// table should be considered corrupt and be dropped.
    FatalError,
}

impl std::error::Error for RibError {}

impl fmt::Display for RibError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RibError::PrefixNotFound => {
                write!(f, "Error: The Prefix cannot be found.")
            }
            RibError::PrefixLengthInvalid => {
                write!(f, "Error: The specified Prefix length is invalid.")
            }
            RibError::UnsupportedAddressFamily => {
                write!(
                    f,
                    "Error: Only IPv4 prefixes can be stored in this table."
                )
            }
            RibError::OutOfMemory => {
                write!(
                    f,
                    "Error: Cannot allocate memory for a node. The table \
                    was not modified."
                )
            }
            RibError::VrfNotFound(name) => {
                write!(f, "Error: VRF '{}' does not exist.", name)
            }
            RibError::VrfExists(name) => {
                write!(f, "Error: VRF '{}' already exists.", name)
            }
            RibError::TableNotFound => {
                write!(f, "Error: The routing table does not exist.")
            }
            RibError::Config(reason) => {
                write!(f, "Error: Invalid configuration: {}", reason)
            }
            RibError::Export(reason) => {
                write!(f, "Error: Cannot export table: {}", reason)
            }
            RibError::ThreadSpawn(reason) => {
                write!(f, "Error: Cannot start thread: {}", reason)
            }
            RibError::FatalError => {
                write!(
                    f,
                    "FATAL: A tree node is in an impossible state. All data \
                    in the table should be considered corrupt."
                )
            }
        }
    }
}
