//! Address space management.
//!
//! This module provides the page table of a single virtual address space. Address spaces
//! are owned by a [`TranslationDirectory`](crate::TranslationDirectory) and only handed out
//! as borrows, so there is never more than one copy of a mapping.

use alloc::collections::BTreeMap;

use crate::{
    MappingError, PageFlags, PageNumber, PageTableEntry, PhysicalAddress, SpaceId, VirtualAddress,
};

/// Checks that an address is page-aligned.
fn check_aligned(addr: u64) -> Result<(), MappingError> {
    if VirtualAddress::new(addr).is_page_aligned() {
        Ok(())
    } else {
        Err(MappingError::MisalignedAddress(addr))
    }
}

/// A single page table, mapping virtual pages to physical pages.
///
/// A page has a key in the table only while it is mapped: unmapping removes the entry
/// rather than keeping it around as invalid.
#[derive(Debug, Clone, Default)]
pub struct AddressSpace {
    id: SpaceId,
    /// Live mappings, keyed by virtual page number.
    entries: BTreeMap<PageNumber, PageTableEntry>,
}

impl AddressSpace {
    /// Creates a new, empty address space.
    pub fn new(id: SpaceId) -> Self {
        Self {
            id,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the id of this address space.
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// Maps a virtual page to a physical page with the given flags.
    ///
    /// The stored entry always has [`PageFlags::VALID`] set in addition to `flags`.
    ///
    /// # Errors
    /// - [`MappingError::MisalignedAddress`] if either address is not page-aligned.
    /// - [`MappingError::DuplicateMapping`] if the virtual page is already mapped. The
    ///   existing mapping is left untouched.
    pub fn map(
        &mut self,
        virt: VirtualAddress,
        phys: PhysicalAddress,
        flags: PageFlags,
    ) -> Result<(), MappingError> {
        check_aligned(virt.as_u64())?;
        check_aligned(phys.as_u64())?;

        let page = virt.page_number();
        if self.entries.contains_key(&page) {
            return Err(MappingError::DuplicateMapping {
                space: self.id,
                virt,
            });
        }

        self.entries
            .insert(page, PageTableEntry::new(virt, phys, flags | PageFlags::VALID));
        Ok(())
    }

    /// Unmaps a virtual page, returning the entry that was removed.
    ///
    /// `flags` are accepted for symmetry with [`map`](Self::map) and currently ignored.
    ///
    /// # Errors
    /// - [`MappingError::MisalignedAddress`] if the address is not page-aligned.
    /// - [`MappingError::NoSuchMapping`] if nothing is mapped there.
    pub fn unmap(
        &mut self,
        virt: VirtualAddress,
        _flags: PageFlags,
    ) -> Result<PageTableEntry, MappingError> {
        check_aligned(virt.as_u64())?;

        self.entries
            .remove(&virt.page_number())
            .ok_or(MappingError::NoSuchMapping {
                space: self.id,
                virt,
            })
    }

    /// Looks up the entry for a virtual page.
    ///
    /// A miss is not an error: it returns [`PageTableEntry::invalid`], and what to do about it
    /// is up to the caller.
    ///
    /// # Errors
    /// [`MappingError::MisalignedAddress`] if the address is not page-aligned.
    pub fn lookup(&self, virt: VirtualAddress) -> Result<PageTableEntry, MappingError> {
        check_aligned(virt.as_u64())?;

        Ok(self
            .entries
            .get(&virt.page_number())
            .copied()
            .unwrap_or(PageTableEntry::invalid(virt)))
    }

    /// Returns the number of live mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the live mappings in virtual address order.
    pub fn iter(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn va(addr: u64) -> VirtualAddress {
        VirtualAddress::new(addr)
    }

    fn pa(addr: u64) -> PhysicalAddress {
        PhysicalAddress::new(addr)
    }

    #[test]
    fn map_then_lookup() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        space.map(va(0x4000), pa(0xF4000), PageFlags::empty()).unwrap();

        let entry = space.lookup(va(0x4000)).unwrap();
        assert!(entry.is_valid());
        assert_eq!(entry.phys(), pa(0xF4000));
        assert_eq!(space.len(), 1);
    }

    #[test]
    fn lookup_unmapped_returns_sentinel() {
        let space = AddressSpace::new(SpaceId::new(0));
        let entry = space.lookup(va(0x4000)).unwrap();
        assert!(!entry.is_valid());
        assert_eq!(entry.phys().as_u64() as i64, -1);
    }

    #[test]
    fn unmap_removes_key() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        space.map(va(0x4000), pa(0xF4000), PageFlags::empty()).unwrap();

        let removed = space.unmap(va(0x4000), PageFlags::empty()).unwrap();
        assert_eq!(removed.phys(), pa(0xF4000));
        assert!(space.is_empty());
        assert!(!space.lookup(va(0x4000)).unwrap().is_valid());
    }

    #[test]
    fn unmap_twice_fails() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        space.map(va(0x4000), pa(0xF4000), PageFlags::empty()).unwrap();
        space.unmap(va(0x4000), PageFlags::empty()).unwrap();

        assert_eq!(
            space.unmap(va(0x4000), PageFlags::empty()),
            Err(MappingError::NoSuchMapping {
                space: SpaceId::new(0),
                virt: va(0x4000)
            })
        );
    }

    #[test]
    fn duplicate_map_keeps_original() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        space.map(va(0x4000), pa(0xF4000), PageFlags::empty()).unwrap();

        assert_eq!(
            space.map(va(0x4000), pa(0xF8000), PageFlags::empty()),
            Err(MappingError::DuplicateMapping {
                space: SpaceId::new(0),
                virt: va(0x4000)
            })
        );
        assert_eq!(space.lookup(va(0x4000)).unwrap().phys(), pa(0xF4000));
    }

    #[test]
    fn stores_caller_flags_with_valid() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        space
            .map(va(0x4000), pa(0xF4000), PageFlags::from_raw(0b100))
            .unwrap();
        assert_eq!(space.lookup(va(0x4000)).unwrap().flags().to_raw(), 0b101);
    }

    #[test]
    fn misaligned_addresses_are_rejected() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        assert_eq!(
            space.map(va(0x4008), pa(0xF4000), PageFlags::empty()),
            Err(MappingError::MisalignedAddress(0x4008))
        );
        assert_eq!(
            space.map(va(0x4000), pa(0xF4010), PageFlags::empty()),
            Err(MappingError::MisalignedAddress(0xF4010))
        );
        assert_eq!(
            space.unmap(va(0x4001), PageFlags::empty()),
            Err(MappingError::MisalignedAddress(0x4001))
        );
        assert_eq!(
            space.lookup(va(0x4800)),
            Err(MappingError::MisalignedAddress(0x4800))
        );
        assert!(space.is_empty());
    }

    #[test]
    fn iterates_in_address_order() {
        let mut space = AddressSpace::new(SpaceId::new(0));
        space.map(va(0x7000), pa(0x1000), PageFlags::empty()).unwrap();
        space.map(va(0x5000), pa(0x2000), PageFlags::empty()).unwrap();
        let virts: alloc::vec::Vec<_> = space.iter().map(|e| e.virt().as_u64()).collect();
        assert_eq!(virts, [0x5000, 0x7000]);
    }

    fn aligned() -> impl Strategy<Value = u64> {
        (0u64..(1 << 40)).prop_map(|page| page << 12)
    }

    proptest! {
        #[test]
        fn mapped_page_resolves(v in aligned(), p in aligned()) {
            let mut space = AddressSpace::new(SpaceId::new(0));
            space.map(va(v), pa(p), PageFlags::empty()).unwrap();
            let entry = space.lookup(va(v)).unwrap();
            prop_assert!(entry.is_valid());
            prop_assert_eq!(entry.phys(), pa(p));
        }

        #[test]
        fn unmapped_page_is_invalid(v in aligned()) {
            let space = AddressSpace::new(SpaceId::new(0));
            let entry = space.lookup(va(v)).unwrap();
            prop_assert!(!entry.is_valid());
            prop_assert_eq!(entry.phys(), PhysicalAddress::INVALID);
        }

        #[test]
        fn unaligned_addresses_always_fail(v in aligned(), offset in 1u64..4096) {
            let mut space = AddressSpace::new(SpaceId::new(0));
            let addr = v + offset;
            prop_assert_eq!(
                space.map(va(addr), pa(0), PageFlags::empty()),
                Err(MappingError::MisalignedAddress(addr))
            );
            prop_assert_eq!(
                space.unmap(va(addr), PageFlags::empty()),
                Err(MappingError::MisalignedAddress(addr))
            );
            prop_assert_eq!(space.lookup(va(addr)), Err(MappingError::MisalignedAddress(addr)));
        }
    }
}
