//! Applies mapping requests to the page tables.

use crate::{
    MappingError, MappingRequest, MappingResponse, Port, RouterError, TranslationDirectory,
};

/// What the router does with a request that conflicts with the page tables
/// (misaligned address, mapping over a live page, unmapping a missing page).
///
/// Configuration errors (duplicate or unknown address space) are fatal under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort: the error is returned to the caller and no response is sent.
    #[default]
    Fatal,
    /// Answer with a rejected response and carry on. The page tables are left unchanged.
    Reject,
}

/// The single writer of a [`TranslationDirectory`].
///
/// Every request for every address space goes through one router, one at a time, so
/// changes to the same space are always serialized.
#[derive(Debug, Default)]
pub struct MappingRequestRouter {
    directory: TranslationDirectory,
    policy: ErrorPolicy,
}

impl MappingRequestRouter {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            directory: TranslationDirectory::new(),
            policy,
        }
    }

    /// Returns a read-only view of the page tables, for translation.
    pub fn directory(&self) -> &TranslationDirectory {
        &self.directory
    }

    /// Applies one request and produces its response.
    ///
    /// # Errors
    /// - [`RouterError::Configuration`] for a duplicate or unknown address space.
    /// - [`RouterError::Mapping`] for a conflicting request under [`ErrorPolicy::Fatal`].
    pub fn handle(&mut self, request: MappingRequest) -> Result<MappingResponse, RouterError> {
        log::debug!("Got mapping request: {}", request);

        match self.apply(request) {
            Ok(()) => Ok(MappingResponse::completed(request)),
            Err(error) if error.is_configuration() => Err(RouterError::Configuration(error)),
            Err(error) => match self.policy {
                ErrorPolicy::Fatal => Err(RouterError::Mapping(error)),
                ErrorPolicy::Reject => {
                    log::warn!("Rejected {}: {}", request, error);
                    Ok(MappingResponse::rejected(request, error))
                }
            },
        }
    }

    fn apply(&mut self, request: MappingRequest) -> Result<(), MappingError> {
        match request {
            MappingRequest::CreateSpace(space) => self.directory.create_space(space).map(|_| ()),
            MappingRequest::MapPage {
                space,
                virt,
                phys,
                flags,
            } => self.directory.map_page(space, virt, phys, flags),
            MappingRequest::UnmapPage { space, virt, flags } => {
                self.directory.unmap_page(space, virt, flags).map(|_| ())
            }
        }
    }

    /// Handles every request waiting on `port`, answering each one on the same port.
    ///
    /// Returns the number of requests handled. Stops at the first fatal error; requests
    /// after it stay queued.
    pub fn serve(
        &mut self,
        port: &Port<MappingResponse, MappingRequest>,
    ) -> Result<usize, RouterError> {
        let mut handled = 0;
        while let Some(request) = port.recv() {
            let response = self.handle(request)?;
            log::trace!("Sending back response on {}", port.name());
            port.send(response);
            handled += 1;
        }
        Ok(handled)
    }
}
