//! Page number and address-space id types.
//!
//! Newtypes for virtual page numbers and address-space ids, so the two kinds of integer
//! cannot be mixed up at call sites.

use crate::address::{PAGE_SHIFT, VirtualAddress};
use core::fmt;

/// A virtual memory page number.
///
/// Page numbers are zero-indexed and correspond to PAGE_SIZE-aligned virtual addresses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PageNumber(u64);

impl PageNumber {
    #[inline]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }
}

impl fmt::Debug for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageNumber({:#x})", self.0)
    }
}

impl From<VirtualAddress> for PageNumber {
    #[inline]
    fn from(addr: VirtualAddress) -> Self {
        Self::new(addr.as_u64() >> PAGE_SHIFT)
    }
}

/// Identifies one address space in a [`TranslationDirectory`](crate::TranslationDirectory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct SpaceId(pub u64);

impl SpaceId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for SpaceId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod page_number {
        use super::*;

        #[test]
        fn from_unaligned_address() {
            let addr = VirtualAddress::new(0x4008);
            assert_eq!(PageNumber::from(addr), PageNumber::new(4));
        }

        #[test]
        fn ordering() {
            assert!(PageNumber::new(5) < PageNumber::new(10));
        }
    }

    #[test]
    fn space_id_display() {
        assert_eq!(format!("{}", SpaceId::new(3)), "#3");
    }
}
