//! The set of address spaces known to the engine.
//!
//! This module provides the `TranslationDirectory` type, which owns every [`AddressSpace`]
//! and provides high-level operations for mapping, unmapping and looking up pages by
//! address-space id.

use alloc::collections::BTreeMap;

use crate::{
    AddressSpace, MappingError, PageFlags, PageTableEntry, PhysicalAddress, SpaceId,
    VirtualAddress,
};

/// Owns all address spaces, keyed by id.
///
/// Spaces are created explicitly exactly once. Every other operation on an id that was never
/// created fails with [`MappingError::UnknownSpace`].
#[derive(Debug, Clone, Default)]
pub struct TranslationDirectory {
    spaces: BTreeMap<SpaceId, AddressSpace>,
}

impl TranslationDirectory {
    /// Creates a directory with no address spaces.
    pub fn new() -> Self {
        Self {
            spaces: BTreeMap::new(),
        }
    }

    /// Creates an empty address space.
    ///
    /// # Errors
    /// [`MappingError::DuplicateSpace`] if the id is already in use.
    pub fn create_space(&mut self, id: SpaceId) -> Result<&mut AddressSpace, MappingError> {
        if self.spaces.contains_key(&id) {
            return Err(MappingError::DuplicateSpace(id));
        }

        log::info!("Created address space {}", id);
        Ok(self.spaces.entry(id).or_insert_with(|| AddressSpace::new(id)))
    }

    /// Returns the address space with the given id.
    pub fn space(&self, id: SpaceId) -> Result<&AddressSpace, MappingError> {
        self.spaces.get(&id).ok_or(MappingError::UnknownSpace(id))
    }

    /// Returns the address space with the given id, mutably.
    pub fn space_mut(&mut self, id: SpaceId) -> Result<&mut AddressSpace, MappingError> {
        self.spaces.get_mut(&id).ok_or(MappingError::UnknownSpace(id))
    }

    /// Maps a page in the given space. See [`AddressSpace::map`].
    pub fn map_page(
        &mut self,
        id: SpaceId,
        virt: VirtualAddress,
        phys: PhysicalAddress,
        flags: PageFlags,
    ) -> Result<(), MappingError> {
        self.space_mut(id)?.map(virt, phys, flags)?;
        log::trace!("Space {}: mapped VA={} -> PA={}", id, virt, phys);
        Ok(())
    }

    /// Unmaps a page in the given space. See [`AddressSpace::unmap`].
    pub fn unmap_page(
        &mut self,
        id: SpaceId,
        virt: VirtualAddress,
        flags: PageFlags,
    ) -> Result<PageTableEntry, MappingError> {
        let entry = self.space_mut(id)?.unmap(virt, flags)?;
        log::trace!("Space {}: unmapped VA={} (was PA={})", id, virt, entry.phys());
        Ok(entry)
    }

    /// Looks up a page in the given space. See [`AddressSpace::lookup`].
    pub fn lookup(&self, id: SpaceId, virt: VirtualAddress) -> Result<PageTableEntry, MappingError> {
        self.space(id)?.lookup(virt)
    }

    /// Iterates over the ids of all address spaces in ascending order.
    pub fn space_ids(&self) -> impl Iterator<Item = SpaceId> + '_ {
        self.spaces.keys().copied()
    }

    /// Returns the number of address spaces.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Returns true if no address space has been created.
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}
