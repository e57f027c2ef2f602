//! Error types for the translation engine.

use thiserror::Error;

use crate::{SpaceId, VirtualAddress};

/// Errors returned by page table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MappingError {
    /// An address space with this id already exists.
    #[error("address space {0} already exists")]
    DuplicateSpace(SpaceId),
    /// No address space with this id has been created.
    #[error("address space {0} does not exist")]
    UnknownSpace(SpaceId),
    /// An address that must sit on a page boundary does not.
    #[error("address {0:#x} is not 4KiB aligned")]
    MisalignedAddress(u64),
    /// The virtual page is already mapped; mappings are never silently replaced.
    #[error("space {space} already maps a page at VA={virt}")]
    DuplicateMapping { space: SpaceId, virt: VirtualAddress },
    /// Unmap of a virtual page that is not mapped.
    #[error("space {space} has no mapping at VA={virt}")]
    NoSuchMapping { space: SpaceId, virt: VirtualAddress },
}

impl MappingError {
    /// Returns true for errors that mean the engine was set up wrong, as opposed to a bad
    /// individual request.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::DuplicateSpace(_) | Self::UnknownSpace(_))
    }
}

/// Errors raised while wiring the engine together. These are always fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The number of address-space ids differs from the number of access channels.
    #[error("{channels} access channels but {ids} address-space ids")]
    RouteCountMismatch { channels: usize, ids: usize },
    /// The number of downstream ports differs from the number of access channels.
    #[error("{channels} access channels but {downstream} downstream channels")]
    DownstreamCountMismatch { channels: usize, downstream: usize },
    /// A route table needs at least one channel.
    #[error("no access channels configured")]
    NoRoutes,
    /// An access arrived on a channel index the table does not have.
    #[error("access channel {0} does not exist")]
    UnknownChannel(usize),
}

/// Fatal outcomes of processing a mapping request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The request referred to a space that was never created, or created one twice.
    #[error("configuration error: {0}")]
    Configuration(MappingError),
    /// The request conflicted with the page table and the router is set to treat that as fatal.
    #[error("mapping error: {0}")]
    Mapping(MappingError),
}

impl From<MappingError> for RouterError {
    fn from(error: MappingError) -> Self {
        if error.is_configuration() {
            Self::Configuration(error)
        } else {
            Self::Mapping(error)
        }
    }
}

/// Failures while routing an access through a route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The channel is bound to an address space that was never created.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}
