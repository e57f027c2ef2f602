//! Mapping requests and their responses.

use core::fmt;

use crate::{MappingError, PageFlags, PhysicalAddress, SpaceId, VirtualAddress};

/// The kind of a [`MappingRequest`], as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    CreateSpace,
    MapPage,
    UnmapPage,
}

impl RequestKind {
    /// Returns the wire name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateSpace => "CREATE_MAPPING",
            Self::MapPage => "MAP_PAGE",
            Self::UnmapPage => "UNMAP_PAGE",
        }
    }
}

/// A request to change the page tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRequest {
    /// Create an empty address space.
    CreateSpace(SpaceId),
    /// Map one page.
    MapPage {
        space: SpaceId,
        virt: VirtualAddress,
        phys: PhysicalAddress,
        flags: PageFlags,
    },
    /// Remove one page mapping.
    UnmapPage {
        space: SpaceId,
        virt: VirtualAddress,
        flags: PageFlags,
    },
}

impl MappingRequest {
    /// Shorthand for a [`MappingRequest::MapPage`] built from raw values.
    pub fn map(space: u64, virt: u64, phys: u64, flags: u64) -> Self {
        Self::MapPage {
            space: SpaceId::new(space),
            virt: VirtualAddress::new(virt),
            phys: PhysicalAddress::new(phys),
            flags: PageFlags::from_raw(flags),
        }
    }

    /// Shorthand for a [`MappingRequest::UnmapPage`] built from raw values.
    pub fn unmap(space: u64, virt: u64, flags: u64) -> Self {
        Self::UnmapPage {
            space: SpaceId::new(space),
            virt: VirtualAddress::new(virt),
            flags: PageFlags::from_raw(flags),
        }
    }

    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::CreateSpace(_) => RequestKind::CreateSpace,
            Self::MapPage { .. } => RequestKind::MapPage,
            Self::UnmapPage { .. } => RequestKind::UnmapPage,
        }
    }

    pub const fn space_id(&self) -> SpaceId {
        match *self {
            Self::CreateSpace(space)
            | Self::MapPage { space, .. }
            | Self::UnmapPage { space, .. } => space,
        }
    }

    /// Returns the virtual address, or zero for requests that carry none.
    pub const fn v_addr(&self) -> VirtualAddress {
        match *self {
            Self::CreateSpace(_) => VirtualAddress::new(0),
            Self::MapPage { virt, .. } | Self::UnmapPage { virt, .. } => virt,
        }
    }

    /// Returns the physical address, or [`PhysicalAddress::INVALID`] when not applicable.
    pub const fn p_addr(&self) -> PhysicalAddress {
        match *self {
            Self::MapPage { phys, .. } => phys,
            Self::CreateSpace(_) | Self::UnmapPage { .. } => PhysicalAddress::INVALID,
        }
    }

    pub const fn flags(&self) -> PageFlags {
        match *self {
            Self::CreateSpace(_) => PageFlags::empty(),
            Self::MapPage { flags, .. } | Self::UnmapPage { flags, .. } => flags,
        }
    }
}

impl fmt::Display for MappingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<MappingRequest: {}, id {}, VA {}, PA {}, flags {:#x}>",
            self.kind().name(),
            self.space_id().as_u64(),
            self.v_addr(),
            self.p_addr(),
            self.flags().to_raw()
        )
    }
}

/// The answer to a [`MappingRequest`]: the request itself, echoed back, and its outcome.
///
/// The outcome is only ever an error when the router rejects bad requests instead of
/// treating them as fatal (see [`ErrorPolicy`](crate::ErrorPolicy)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingResponse {
    pub request: MappingRequest,
    pub outcome: Result<(), MappingError>,
}

impl MappingResponse {
    pub const fn completed(request: MappingRequest) -> Self {
        Self {
            request,
            outcome: Ok(()),
        }
    }

    pub const fn rejected(request: MappingRequest, error: MappingError) -> Self {
        Self {
            request,
            outcome: Err(error),
        }
    }

    /// Returns true if the request was applied.
    pub const fn is_completed(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for MappingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(()) => write!(f, "{} ok", self.request),
            Err(error) => write!(f, "{} rejected: {}", self.request, error),
        }
    }
}
