//! Virtual-to-physical translation of memory accesses.

use crate::{
    MappingError, MemoryAccessEvent, PhysicalAddress, SpaceId, TranslationDirectory,
    VirtualAddress,
};

/// Translates memory accesses against a read-only view of a [`TranslationDirectory`].
///
/// The translator holds no state of its own. It borrows the directory immutably, so it
/// can never observe a page table while the router is changing it.
///
/// A virtual page with no valid mapping translates to itself (identity fallback). This
/// stands in for page-fault handling, which the engine does not model.
#[derive(Debug, Clone, Copy)]
pub struct MemoryAccessTranslator<'a> {
    directory: &'a TranslationDirectory,
}

impl<'a> MemoryAccessTranslator<'a> {
    pub fn new(directory: &'a TranslationDirectory) -> Self {
        Self { directory }
    }

    /// Translates the address fields of an access made in address space `id`.
    ///
    /// The main and base addresses are both rebuilt on the physical page of the main
    /// address. Each keeps its own offset within the page. The base offset is taken from
    /// the base address's low bits, not derived from the main address. Size, payload and
    /// the recorded virtual address carry over unchanged. A zero virtual address is first
    /// filled in from the main address.
    ///
    /// # Errors
    /// [`MappingError::UnknownSpace`] if `id` was never created.
    pub fn translate<P>(
        &self,
        id: SpaceId,
        mut access: MemoryAccessEvent<P>,
    ) -> Result<MemoryAccessEvent<P>, MappingError> {
        if access.v_addr == 0 {
            access.v_addr = access.main_addr;
        } else if access.v_addr != access.main_addr {
            log::warn!(
                "Unexpected: access virtual address and main address differ: {}",
                access
            );
        }

        let main = VirtualAddress::new(access.main_addr);
        let base = VirtualAddress::new(access.base_addr);

        let phys_page = self.translate_page(id, main.page_base())?;

        let translated = MemoryAccessEvent {
            main_addr: (phys_page | main.page_offset()).as_u64(),
            base_addr: (phys_page | base.page_offset()).as_u64(),
            ..access
        };
        log::trace!("Space {}: translated access {}", id, translated);
        Ok(translated)
    }

    /// Translates a page-aligned virtual address to its physical page.
    ///
    /// # Errors
    /// - [`MappingError::UnknownSpace`] if `id` was never created.
    /// - [`MappingError::MisalignedAddress`] if `page` is not page-aligned.
    pub fn translate_page(
        &self,
        id: SpaceId,
        page: VirtualAddress,
    ) -> Result<PhysicalAddress, MappingError> {
        let entry = self.directory.lookup(id, page)?;
        match entry.address() {
            Some(phys) => Ok(phys),
            None => {
                log::trace!("Space {}: no mapping at VA={}, using identity", id, page);
                Ok(page.identity())
            }
        }
    }
}
