//! Static routing of access channels to address spaces.

use alloc::vec::Vec;

use crate::{
    ConfigError, MemoryAccessEvent, MemoryAccessTranslator, Port, RouteError, SpaceId,
    TranslationDirectory,
};

/// Where a route table sends a translated access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    /// Back on the channel it arrived on.
    #[default]
    Respond,
    /// On the channel's own downstream port.
    Forward,
}

#[derive(Debug)]
struct Route<P> {
    port: Port<MemoryAccessEvent<P>>,
    space: SpaceId,
    downstream: Option<Port<MemoryAccessEvent<P>>>,
}

/// Binds each inbound access channel to the one address space its accesses are
/// translated in.
///
/// Channel `i` always uses space `ids[i]`. The binding is fixed when the table is built.
#[derive(Debug)]
pub struct TranslationRouteTable<P = ()> {
    routes: Vec<Route<P>>,
    mode: RouteMode,
}

impl<P> TranslationRouteTable<P> {
    /// Builds a table that answers each access on the port it came in on.
    ///
    /// # Errors
    /// - [`ConfigError::NoRoutes`] if `ports` is empty.
    /// - [`ConfigError::RouteCountMismatch`] if `ports` and `ids` differ in length.
    pub fn new(ports: Vec<Port<MemoryAccessEvent<P>>>, ids: Vec<SpaceId>) -> Result<Self, ConfigError> {
        Self::validate(&ports, &ids)?;
        let routes = ports
            .into_iter()
            .zip(ids)
            .map(|(port, space)| Route {
                port,
                space,
                downstream: None,
            })
            .collect();
        Ok(Self {
            routes,
            mode: RouteMode::Respond,
        })
    }

    /// Builds a table that passes each access on to the downstream port of the channel
    /// it came in on.
    ///
    /// # Errors
    /// As [`TranslationRouteTable::new`], plus [`ConfigError::DownstreamCountMismatch`]
    /// if `downstream` and `ports` differ in length.
    pub fn forwarding(
        ports: Vec<Port<MemoryAccessEvent<P>>>,
        ids: Vec<SpaceId>,
        downstream: Vec<Port<MemoryAccessEvent<P>>>,
    ) -> Result<Self, ConfigError> {
        Self::validate(&ports, &ids)?;
        if downstream.len() != ports.len() {
            return Err(ConfigError::DownstreamCountMismatch {
                channels: ports.len(),
                downstream: downstream.len(),
            });
        }
        let routes = ports
            .into_iter()
            .zip(ids)
            .zip(downstream)
            .map(|((port, space), downstream)| Route {
                port,
                space,
                downstream: Some(downstream),
            })
            .collect();
        Ok(Self {
            routes,
            mode: RouteMode::Forward,
        })
    }

    fn validate(ports: &[Port<MemoryAccessEvent<P>>], ids: &[SpaceId]) -> Result<(), ConfigError> {
        if ports.is_empty() {
            return Err(ConfigError::NoRoutes);
        }
        if ports.len() != ids.len() {
            return Err(ConfigError::RouteCountMismatch {
                channels: ports.len(),
                ids: ids.len(),
            });
        }
        Ok(())
    }

    pub fn mode(&self) -> RouteMode {
        self.mode
    }

    /// Returns the number of channels.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Translates an access that arrived on channel `index` and sends it on.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownChannel`] if the table has no channel `index`.
    /// - [`MappingError::UnknownSpace`](crate::MappingError::UnknownSpace) if the
    ///   channel's space was never created.
    pub fn handle_incoming(
        &self,
        index: usize,
        access: MemoryAccessEvent<P>,
        directory: &TranslationDirectory,
    ) -> Result<(), RouteError> {
        let route = self
            .routes
            .get(index)
            .ok_or(ConfigError::UnknownChannel(index))?;

        let translated = MemoryAccessTranslator::new(directory).translate(route.space, access)?;
        match &route.downstream {
            Some(downstream) => downstream.send(translated),
            None => route.port.send(translated),
        }
        Ok(())
    }

    /// Handles every access waiting on every channel, lowest index first, and returns
    /// how many there were.
    ///
    /// # Errors
    /// Stops at the first access that cannot be routed. See
    /// [`TranslationRouteTable::handle_incoming`].
    pub fn pump(&self, directory: &TranslationDirectory) -> Result<usize, RouteError> {
        let mut handled = 0;
        for (index, route) in self.routes.iter().enumerate() {
            while let Some(access) = route.port.recv() {
                self.handle_incoming(index, access, directory)?;
                handled += 1;
            }
        }
        Ok(handled)
    }
}
