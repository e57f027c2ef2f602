//! Page table entries.

use core::fmt;

use crate::{PageFlags, PhysicalAddress, VirtualAddress};

/// A single virtual-to-physical page mapping.
///
/// Both addresses are page-aligned. An entry whose flags lack [`PageFlags::VALID`] does not
/// map anything; [`PageTableEntry::invalid`] builds the sentinel returned by lookups that miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    virt: VirtualAddress,
    phys: PhysicalAddress,
    flags: PageFlags,
}

impl PageTableEntry {
    /// Creates a new page table entry.
    ///
    /// The flags are stored as given; callers that want a live mapping set `VALID` themselves.
    pub const fn new(virt: VirtualAddress, phys: PhysicalAddress, flags: PageFlags) -> Self {
        Self { virt, phys, flags }
    }

    /// Returns the sentinel entry for an unmapped page: physical address `-1`, no flags.
    pub const fn invalid(virt: VirtualAddress) -> Self {
        Self {
            virt,
            phys: PhysicalAddress::INVALID,
            flags: PageFlags::empty(),
        }
    }

    /// Returns the virtual page address of this entry.
    pub const fn virt(&self) -> VirtualAddress {
        self.virt
    }

    /// Returns the physical page address of this entry.
    ///
    /// For an invalid entry this is [`PhysicalAddress::INVALID`].
    pub const fn phys(&self) -> PhysicalAddress {
        self.phys
    }

    /// Returns the physical page address, or None if the entry is not valid.
    pub fn address(&self) -> Option<PhysicalAddress> {
        self.is_valid().then_some(self.phys)
    }

    pub const fn flags(&self) -> PageFlags {
        self.flags
    }

    /// Returns whether this entry maps a page.
    pub const fn is_valid(&self) -> bool {
        self.flags.is_valid()
    }
}

impl fmt::Display for PageTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{} -> {} [{:#x}]", self.virt, self.phys, self.flags.to_raw())
        } else {
            write!(f, "{} -> <unmapped>", self.virt)
        }
    }
}
