//! Page table entry flags.

bitflags::bitflags! {
    /// Flags carried by a page table entry and by map/unmap requests.
    ///
    /// Only [`VALID`](Self::VALID) has a meaning to the engine. Any other bits a client sends
    /// are stored verbatim and echoed back, so callers can tag mappings with their own bits.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PageFlags: u64 {
        /// The entry maps a page. Entries without it are logically absent.
        const VALID = 1 << 0;

        const _ = !0;
    }
}

impl PageFlags {
    /// Creates page flags from a raw value, keeping unknown bits.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Returns the raw value of these flags.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.bits()
    }

    /// Returns whether the valid bit is set.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.contains(Self::VALID)
    }
}
