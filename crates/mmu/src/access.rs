//! Memory access events.

use core::fmt;

/// A memory access travelling from a producer (core, cache) toward backing storage.
///
/// `main_addr` is the address being accessed and `base_addr` the start of its cacheline.
/// `v_addr` records the virtual address the access was issued at; producers that do not
/// track it leave it at zero. The payload is opaque to the engine and moved through
/// translation untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryAccessEvent<P = ()> {
    pub v_addr: u64,
    pub main_addr: u64,
    pub base_addr: u64,
    pub size: i64,
    pub payload: P,
}

impl<P> MemoryAccessEvent<P> {
    /// Creates an access at `main_addr` within the cacheline starting at `base_addr`.
    ///
    /// The virtual address is left unset (zero).
    pub fn new(main_addr: u64, base_addr: u64, size: i64, payload: P) -> Self {
        Self {
            v_addr: 0,
            main_addr,
            base_addr,
            size,
            payload,
        }
    }
}

impl<P> fmt::Display for MemoryAccessEvent<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<MemoryAccess: VA {:#x}, addr {:#x}, base {:#x}, size {}>",
            self.v_addr, self.main_addr, self.base_addr, self.size
        )
    }
}
