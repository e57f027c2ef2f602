//! Address types for virtual and physical memory.
//!
//! This module provides wrappers around raw 64-bit addresses, with the page arithmetic the
//! translation engine needs: splitting an address into its page base and page offset, and
//! checking page alignment.

use core::fmt;
use core::ops::BitOr;

use crate::{HumanAddress, PageNumber};

/// Number of bits in the page offset.
pub const PAGE_SHIFT: u32 = 12;

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;

/// Mask selecting the page offset bits of an address.
const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Macro to define common address type functionality.
///
/// This macro generates the basic structure and methods common to both physical
/// and virtual address types, reducing code duplication.
macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new address.
            #[inline]
            pub const fn new(addr: u64) -> Self {
                Self(addr)
            }

            /// Returns the raw address value.
            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0
            }

            /// Returns true if the address sits on a page boundary.
            #[inline]
            pub const fn is_page_aligned(self) -> bool {
                self.0 & PAGE_OFFSET_MASK == 0
            }

            /// Returns the address of the page containing this address.
            #[inline]
            pub const fn page_base(self) -> Self {
                Self(self.0 & !PAGE_OFFSET_MASK)
            }

            /// Returns the offset of this address within its page.
            #[inline]
            pub const fn page_offset(self) -> u64 {
                self.0 & PAGE_OFFSET_MASK
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", HumanAddress(self.0))
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(addr: u64) -> Self {
                Self::new(addr)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(addr: $name) -> Self {
                addr.0
            }
        }

        impl BitOr<u64> for $name {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: u64) -> Self::Output {
                Self(self.0 | rhs)
            }
        }
    };
}

impl_address_common!(
    PhysicalAddress,
    "A physical memory address.\n\n\
     This is a newtype wrapper around a raw 64-bit physical address. It provides methods\n\
     for page arithmetic."
);

impl PhysicalAddress {
    /// Sentinel stored in entries that do not map anything (all ones, i.e. `-1`).
    pub const INVALID: Self = Self(u64::MAX);
}

impl_address_common!(
    VirtualAddress,
    "A virtual memory address.\n\n\
     This is a newtype wrapper around a raw 64-bit virtual address. It provides methods\n\
     for page arithmetic and page number extraction."
);

impl VirtualAddress {
    /// Returns the corresponding page number for this virtual address.
    #[inline]
    pub fn page_number(self) -> PageNumber {
        PageNumber::from(self)
    }

    /// Reinterprets this address as a physical address with the same value.
    ///
    /// Used by the identity fallback, where an unmapped page translates to itself.
    #[inline]
    pub const fn identity(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0)
    }
}
